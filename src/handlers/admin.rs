use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::error::AppError;
use crate::middlewares::AdminAuth;
use crate::models::*;
use crate::services::{AccountService, LedgerService};

#[utoipa::path(
    get,
    path = "/admin/accounts/find",
    tag = "admin",
    params(FindAccountQuery),
    security(
        ("admin_token" = [])
    ),
    responses(
        (status = 200, description = "Matching account", body = AccountResponse),
        (status = 404, description = "No account matches the query")
    )
)]
pub async fn find_account(
    account_service: web::Data<AccountService>,
    query: web::Query<FindAccountQuery>,
) -> Result<HttpResponse> {
    match account_service.find_account(&query.q).await {
        Ok(Some(account)) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": AccountResponse::from(account)
        }))),
        Ok(None) => Ok(AppError::AccountNotFound.error_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/accounts/{id}/adjust",
    tag = "admin",
    request_body = AdminAdjustRequest,
    params(
        ("id" = i64, Path, description = "Internal account id")
    ),
    security(
        ("admin_token" = [])
    ),
    responses(
        (status = 200, description = "Adjustment applied", body = AdminAdjustResponse),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Adjustment would overdraw the account")
    )
)]
pub async fn adjust_balances(
    account_service: web::Data<AccountService>,
    ledger_service: web::Data<LedgerService>,
    path: web::Path<i64>,
    request: web::Json<AdminAdjustRequest>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let request = request.into_inner();

    let delta = BalanceDelta {
        gems: request.gems_delta,
        sparks: request.sparks_delta,
        cash_cents: request.cash_delta_cents,
    };
    if delta.is_zero() {
        return Ok(
            AppError::ValidationError("Adjustment must change at least one balance".to_string())
                .error_response(),
        );
    }

    let result = async {
        let transaction = ledger_service
            .admin_adjust(user_id, &delta, request.note.as_deref())
            .await?;
        let account = account_service.get_by_id(user_id).await?;
        Ok::<_, AppError>(AdminAdjustResponse {
            transaction: TransactionResponse::from(transaction),
            account: AccountResponse::from(account),
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

#[utoipa::path(
    get,
    path = "/admin/accounts/{id}/transactions",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Internal account id"),
        PaginationParams
    ),
    security(
        ("admin_token" = [])
    ),
    responses(
        (status = 200, description = "Transaction history, newest first")
    )
)]
pub async fn get_transactions(
    ledger_service: web::Data<LedgerService>,
    path: web::Path<i64>,
    params: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    match ledger_service
        .list_transactions(path.into_inner(), &params)
        .await
    {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_scope(token: &str) -> impl HttpServiceFactory + use<> {
    web::scope("/admin")
        .wrap(AdminAuth::new(token))
        .route("/accounts/find", web::get().to(find_account))
        .route("/accounts/{id}/adjust", web::post().to(adjust_balances))
        .route("/accounts/{id}/transactions", web::get().to(get_transactions))
}
