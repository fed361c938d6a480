use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use pixgen_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{CardPaymentProvider, GeneratorClient},
    handlers,
    middlewares::create_cors,
    services::{AccountService, GenerationService, LedgerService, PricingResolver},
    swagger::swagger_config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let generator_client = GeneratorClient::new(config.generator.clone());
    let payment_provider = CardPaymentProvider::new(config.payments.clone());

    let account_service = AccountService::new(pool.clone());
    let ledger_service = LedgerService::new(pool.clone(), config.referral.clone());
    let generation_service = GenerationService::new(pool.clone());
    let pricing_resolver = PricingResolver::new(config.pricing.clone());

    if config.admin.token.is_empty() {
        log::warn!("ADMIN_TOKEN is empty; the admin API is disabled");
    }

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let admin_token = config.admin.token.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .app_data(web::Data::new(account_service.clone()))
            .app_data(web::Data::new(ledger_service.clone()))
            .app_data(web::Data::new(generation_service.clone()))
            .app_data(web::Data::new(pricing_resolver.clone()))
            .app_data(web::Data::new(generator_client.clone()))
            .app_data(web::Data::new(payment_provider.clone()))
            .configure(swagger_config)
            .configure(handlers::health_config)
            .configure(handlers::webhook_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::account_config)
                    .configure(handlers::payment_config)
                    .configure(handlers::generation_config)
                    .service(handlers::admin_scope(&admin_token)),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
