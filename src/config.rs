use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub admin: AdminConfig,
    pub generator: GeneratorConfig,
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub referral: ReferralConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_generator_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    pub card_base_url: String,
}

/// Unit prices per tier plus the fixed animate cost, all in tokens.
/// Injected into the pricing resolver so tests can vary them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_standard_price")]
    pub standard_price: i64,
    #[serde(default = "default_pro_price")]
    pub pro_price: i64,
    #[serde(default = "default_animate_cost")]
    pub animate_cost: i64,
}

/// Referral percentage in basis points (1000 = 10%), so bonus cents are
/// exact integer arithmetic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralConfig {
    #[serde(default = "default_referral_percent_bp")]
    pub percent_bp: i64,
}

fn default_generator_timeout() -> u64 {
    120
}

fn default_standard_price() -> i64 {
    1
}

fn default_pro_price() -> i64 {
    2
}

fn default_animate_cost() -> i64 {
    5
}

fn default_referral_percent_bp() -> i64 {
    1000
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            standard_price: default_standard_price(),
            pro_price: default_pro_price(),
            animate_cost: default_animate_cost(),
        }
    }
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            percent_bp: default_referral_percent_bp(),
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // Read the config file if present; otherwise build entirely from
        // environment variables.
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("Failed to parse {config_path}: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // The database URL has no sensible default
                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    admin: AdminConfig {
                        token: get_env("ADMIN_TOKEN").unwrap_or_default(),
                    },
                    generator: GeneratorConfig {
                        base_url: get_env("GENERATOR_BASE_URL")
                            .unwrap_or_else(|| "https://generator.invalid".to_string()),
                        api_key: get_env("GENERATOR_API_KEY").unwrap_or_default(),
                        timeout_secs: get_env_parse(
                            "GENERATOR_TIMEOUT_SECS",
                            default_generator_timeout(),
                        ),
                    },
                    payments: PaymentsConfig {
                        card_base_url: get_env("CARD_PAYMENT_BASE_URL")
                            .unwrap_or_else(|| "https://pay.pixgen.invalid".to_string()),
                    },
                    pricing: PricingConfig {
                        standard_price: get_env_parse(
                            "PRICING_STANDARD_PRICE",
                            default_standard_price(),
                        ),
                        pro_price: get_env_parse("PRICING_PRO_PRICE", default_pro_price()),
                        animate_cost: get_env_parse(
                            "PRICING_ANIMATE_COST",
                            default_animate_cost(),
                        ),
                    },
                    referral: ReferralConfig {
                        percent_bp: get_env_parse(
                            "REFERRAL_PERCENT_BP",
                            default_referral_percent_bp(),
                        ),
                    },
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // Environment variables override the file when both are present
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("ADMIN_TOKEN") {
            config.admin.token = v;
        }
        if let Ok(v) = env::var("GENERATOR_BASE_URL") {
            config.generator.base_url = v;
        }
        if let Ok(v) = env::var("GENERATOR_API_KEY") {
            config.generator.api_key = v;
        }
        if let Ok(v) = env::var("GENERATOR_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            config.generator.timeout_secs = n;
        }
        if let Ok(v) = env::var("CARD_PAYMENT_BASE_URL") {
            config.payments.card_base_url = v;
        }
        if let Ok(v) = env::var("PRICING_STANDARD_PRICE")
            && let Ok(n) = v.parse()
        {
            config.pricing.standard_price = n;
        }
        if let Ok(v) = env::var("PRICING_PRO_PRICE")
            && let Ok(n) = v.parse()
        {
            config.pricing.pro_price = n;
        }
        if let Ok(v) = env::var("PRICING_ANIMATE_COST")
            && let Ok(n) = v.parse()
        {
            config.pricing.animate_cost = n;
        }
        if let Ok(v) = env::var("REFERRAL_PERCENT_BP")
            && let Ok(n) = v.parse()
        {
            config.referral.percent_bp = n;
        }

        Ok(config)
    }
}
