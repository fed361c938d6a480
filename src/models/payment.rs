use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCardTopupRequest {
    pub external_id: i64,
    #[schema(example = "card_100")]
    pub package: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCardTopupResponse {
    pub order_id: String,
    pub payment_url: String,
    pub gems: i64,
    pub price_cents: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateWalletTopupRequest {
    pub external_id: i64,
    #[schema(example = "wallet_100")]
    pub package: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateWalletTopupResponse {
    /// Invoice payload the presentation layer attaches to the in-chat
    /// invoice; comes back verbatim in the confirmation webhook.
    pub order_id: String,
    pub gems: i64,
    pub wallet_units: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentWebhookRequest {
    #[schema(example = "ORD-1f3a9c2e44")]
    pub order_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PackageListResponse {
    pub card: Vec<CardPackageInfo>,
    pub wallet: Vec<WalletPackageInfo>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CardPackageInfo {
    pub code: String,
    pub gems: i64,
    pub price_cents: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WalletPackageInfo {
    pub code: String,
    pub gems: i64,
    pub wallet_units: i64,
}
