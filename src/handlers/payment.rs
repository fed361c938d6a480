use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::external::CardPaymentProvider;
use crate::models::*;
use crate::services::{AccountService, LedgerService};
use crate::utils::packages::{
    get_card_package, get_wallet_package, list_card_packages, list_wallet_packages,
};

#[utoipa::path(
    get,
    path = "/payments/packages",
    tag = "payments",
    responses(
        (status = 200, description = "Available top-up packages", body = PackageListResponse)
    )
)]
pub async fn get_packages() -> Result<HttpResponse> {
    let response = PackageListResponse {
        card: list_card_packages()
            .iter()
            .map(|pkg| CardPackageInfo {
                code: pkg.code.to_string(),
                gems: pkg.gems,
                price_cents: pkg.price_cents,
            })
            .collect(),
        wallet: list_wallet_packages()
            .iter()
            .map(|pkg| WalletPackageInfo {
                code: pkg.code.to_string(),
                gems: pkg.gems,
                wallet_units: pkg.wallet_units,
            })
            .collect(),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

#[utoipa::path(
    post,
    path = "/payments/card",
    tag = "payments",
    request_body = CreateCardTopupRequest,
    responses(
        (status = 200, description = "Pending top-up created, pay via the returned link", body = CreateCardTopupResponse),
        (status = 400, description = "Unknown package"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn create_card_topup(
    account_service: web::Data<AccountService>,
    ledger_service: web::Data<LedgerService>,
    provider: web::Data<CardPaymentProvider>,
    request: web::Json<CreateCardTopupRequest>,
) -> Result<HttpResponse> {
    match create_card_order(&account_service, &ledger_service, &provider, request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

async fn create_card_order(
    account_service: &AccountService,
    ledger_service: &LedgerService,
    provider: &CardPaymentProvider,
    request: CreateCardTopupRequest,
) -> AppResult<CreateCardTopupResponse> {
    let account = account_service
        .get_by_external_id(request.external_id)
        .await?;
    let package = get_card_package(&request.package)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown package: {}", request.package)))?;

    let link = provider.create_payment_link(package);
    ledger_service
        .create_pending_topup(
            account.id,
            package.gems,
            "card",
            &link.order_id,
            Some(json!({
                "package": package.code,
                "price_cents": package.price_cents
            })),
        )
        .await?;

    Ok(CreateCardTopupResponse {
        order_id: link.order_id,
        payment_url: link.payment_url,
        gems: package.gems,
        price_cents: package.price_cents,
    })
}

#[utoipa::path(
    post,
    path = "/payments/wallet",
    tag = "payments",
    request_body = CreateWalletTopupRequest,
    responses(
        (status = 200, description = "Pending top-up created, attach the order id to the invoice", body = CreateWalletTopupResponse),
        (status = 400, description = "Unknown package"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn create_wallet_topup(
    account_service: web::Data<AccountService>,
    ledger_service: web::Data<LedgerService>,
    provider: web::Data<CardPaymentProvider>,
    request: web::Json<CreateWalletTopupRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let result = async {
        let account = account_service
            .get_by_external_id(request.external_id)
            .await?;
        let package = get_wallet_package(&request.package).ok_or_else(|| {
            AppError::ValidationError(format!("Unknown package: {}", request.package))
        })?;

        let invoice = provider.create_wallet_invoice(package);
        ledger_service
            .create_pending_topup(
                account.id,
                package.gems,
                "wallet",
                &invoice.order_id,
                Some(json!({
                    "package": package.code,
                    "wallet_units": package.wallet_units
                })),
            )
            .await?;

        Ok::<_, AppError>(CreateWalletTopupResponse {
            order_id: invoice.order_id,
            gems: package.gems,
            wallet_units: invoice.wallet_units,
        })
    }
    .await;

    match result {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("/packages", web::get().to(get_packages))
            .route("/card", web::post().to(create_card_topup))
            .route("/wallet", web::post().to(create_wallet_topup)),
    );
}
