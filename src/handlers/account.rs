use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::models::*;
use crate::services::AccountService;
use crate::utils::presets::get_preset;

#[utoipa::path(
    post,
    path = "/accounts/sync",
    tag = "accounts",
    request_body = SyncAccountRequest,
    responses(
        (status = 200, description = "Existing or newly created account", body = AccountResponse),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn sync_account(
    account_service: web::Data<AccountService>,
    request: web::Json<SyncAccountRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    match account_service
        .get_or_create(
            request.external_id,
            request.username.as_deref(),
            request.referral_code.as_deref(),
        )
        .await
    {
        Ok(account) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": AccountResponse::from(account)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/accounts/{external_id}/profile",
    tag = "accounts",
    params(
        ("external_id" = i64, Path, description = "Platform identity of the account")
    ),
    responses(
        (status = 200, description = "Balances, referral code and referral count", body = AccountProfileResponse),
        (status = 404, description = "Account not found")
    )
)]
pub async fn get_profile(
    account_service: web::Data<AccountService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let external_id = path.into_inner();
    let result = async {
        let account = account_service.get_by_external_id(external_id).await?;
        let referral_count = account_service.referral_count(account.id).await?;
        Ok::<_, crate::AppError>(AccountProfileResponse {
            account: AccountResponse::from(account),
            referral_count,
        })
    }
    .await;

    match result {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/accounts/{external_id}/tier",
    tag = "accounts",
    request_body = UpdateTierRequest,
    params(
        ("external_id" = i64, Path, description = "Platform identity of the account")
    ),
    responses(
        (status = 200, description = "Tier updated", body = AccountResponse),
        (status = 404, description = "Account not found")
    )
)]
pub async fn set_tier(
    account_service: web::Data<AccountService>,
    path: web::Path<i64>,
    request: web::Json<UpdateTierRequest>,
) -> Result<HttpResponse> {
    match account_service
        .set_selected_tier(path.into_inner(), request.tier)
        .await
    {
        Ok(account) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": AccountResponse::from(account)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/accounts/{external_id}/preset",
    tag = "accounts",
    request_body = UpdatePresetRequest,
    params(
        ("external_id" = i64, Path, description = "Platform identity of the account")
    ),
    responses(
        (status = 200, description = "Preset updated", body = AccountResponse),
        (status = 400, description = "Unknown preset"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn set_preset(
    account_service: web::Data<AccountService>,
    path: web::Path<i64>,
    request: web::Json<UpdatePresetRequest>,
) -> Result<HttpResponse> {
    let preset = request.into_inner().preset;
    if let Some(key) = preset.as_deref()
        && get_preset(key).is_none()
    {
        return Ok(
            crate::AppError::ValidationError(format!("Unknown preset: {key}")).error_response(),
        );
    }

    match account_service
        .set_selected_preset(path.into_inner(), preset)
        .await
    {
        Ok(account) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": AccountResponse::from(account)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn account_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/accounts")
            .route("/sync", web::post().to(sync_account))
            .route("/{external_id}/profile", web::get().to(get_profile))
            .route("/{external_id}/tier", web::put().to(set_tier))
            .route("/{external_id}/preset", web::put().to(set_preset)),
    );
}
