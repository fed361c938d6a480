use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{GenerationKind, GenerationStatus, Tier, TransactionKind, TransactionStatus};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "admin_token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Admin-Token"))),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::account::sync_account,
        handlers::account::get_profile,
        handlers::account::set_tier,
        handlers::account::set_preset,
        handlers::payment::get_packages,
        handlers::payment::create_card_topup,
        handlers::payment::create_wallet_topup,
        handlers::generation::get_presets,
        handlers::generation::generate_text,
        handlers::generation::generate_preset,
        handlers::generation::generate_animate,
        handlers::webhook::card_payment_webhook,
        handlers::webhook::wallet_payment_webhook,
        handlers::admin::find_account,
        handlers::admin::adjust_balances,
        handlers::admin::get_transactions,
        handlers::health::health,
    ),
    components(
        schemas(
            SyncAccountRequest,
            AccountResponse,
            AccountProfileResponse,
            UpdateTierRequest,
            UpdatePresetRequest,
            Tier,
            TransactionKind,
            TransactionStatus,
            TransactionResponse,
            AdminAdjustRequest,
            AdminAdjustResponse,
            GenerationKind,
            GenerationStatus,
            GenerationResponse,
            GenerationResult,
            TextGenerationRequest,
            PresetGenerationRequest,
            AnimateRequest,
            PackageListResponse,
            CardPackageInfo,
            WalletPackageInfo,
            CreateCardTopupRequest,
            CreateCardTopupResponse,
            CreateWalletTopupRequest,
            CreateWalletTopupResponse,
            PaymentWebhookRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "accounts", description = "Account lookup, creation and preferences"),
        (name = "payments", description = "Top-up packages and pending orders"),
        (name = "generations", description = "Paid generation requests"),
        (name = "webhooks", description = "Payment provider callbacks"),
        (name = "admin", description = "Balance corrections and account search"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
