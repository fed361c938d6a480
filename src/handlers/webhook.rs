use actix_web::{HttpResponse, Result, web};
use log::{info, warn};
use serde_json::json;

use crate::models::{PaymentWebhookRequest, TransactionResponse};
use crate::services::LedgerService;

/// Card provider confirmation callback. Deliveries are retried by the
/// provider, so the same order id can arrive any number of times; only the
/// first one moves balances.
#[utoipa::path(
    post,
    path = "/webhook/payments/card",
    tag = "webhooks",
    request_body = PaymentWebhookRequest,
    responses(
        (status = 200, description = "Top-up confirmed", body = TransactionResponse),
        (status = 404, description = "Order unknown or already processed")
    )
)]
pub async fn card_payment_webhook(
    ledger_service: web::Data<LedgerService>,
    request: web::Json<PaymentWebhookRequest>,
) -> Result<HttpResponse> {
    confirm(&ledger_service, &request.order_id, "card").await
}

/// Wallet invoice confirmation callback, same contract as the card hook.
#[utoipa::path(
    post,
    path = "/webhook/payments/wallet",
    tag = "webhooks",
    request_body = PaymentWebhookRequest,
    responses(
        (status = 200, description = "Top-up confirmed", body = TransactionResponse),
        (status = 404, description = "Order unknown or already processed")
    )
)]
pub async fn wallet_payment_webhook(
    ledger_service: web::Data<LedgerService>,
    request: web::Json<PaymentWebhookRequest>,
) -> Result<HttpResponse> {
    confirm(&ledger_service, &request.order_id, "wallet").await
}

async fn confirm(
    ledger_service: &LedgerService,
    order_id: &str,
    source: &str,
) -> Result<HttpResponse> {
    info!("Received {source} payment webhook for order {order_id}");

    match ledger_service.confirm_topup(order_id).await {
        Ok(Some(tx)) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": TransactionResponse::from(tx)
        }))),
        Ok(None) => {
            // Unknown id and replayed delivery look the same on purpose
            info!("Order {order_id} not pending; treating webhook as a no-op");
            Ok(HttpResponse::NotFound().json(json!({
                "success": false,
                "error": {
                    "code": "ORDER_NOT_FOUND",
                    "message": "Order unknown or already processed"
                }
            })))
        }
        Err(e) => {
            warn!("Failed to process {source} webhook for order {order_id}: {e}");
            Err(e.into())
        }
    }
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhook/payments")
            .route("/card", web::post().to(card_payment_webhook))
            .route("/wallet", web::post().to(wallet_payment_webhook)),
    );
}
