use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::entities::GenerationKind;
use crate::error::{AppError, AppResult};
use crate::external::GeneratorClient;
use crate::models::*;
use crate::services::{AccountService, GenerationService, PricingResolver};
use crate::utils::presets::{get_preset, list_presets};

#[utoipa::path(
    get,
    path = "/generations/presets",
    tag = "generations",
    responses(
        (status = 200, description = "Available one-click presets")
    )
)]
pub async fn get_presets() -> Result<HttpResponse> {
    let presets: Vec<_> = list_presets()
        .iter()
        .map(|preset| {
            json!({
                "key": preset.key,
                "title": preset.title,
                "preview_url": preset.preview_url
            })
        })
        .collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(presets)))
}

#[utoipa::path(
    post,
    path = "/generations/text",
    tag = "generations",
    request_body = TextGenerationRequest,
    responses(
        (status = 200, description = "Generation finished; failed runs are refunded", body = GenerationResult),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Insufficient balance")
    )
)]
pub async fn generate_text(
    account_service: web::Data<AccountService>,
    generation_service: web::Data<GenerationService>,
    pricing: web::Data<PricingResolver>,
    generator: web::Data<GeneratorClient>,
    request: web::Json<TextGenerationRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    if request.prompt.trim().is_empty() {
        return Ok(
            AppError::ValidationError("Prompt must not be empty".to_string()).error_response(),
        );
    }

    match run_text_generation(
        &account_service,
        &generation_service,
        &pricing,
        &generator,
        request,
    )
    .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": result
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

async fn run_text_generation(
    account_service: &AccountService,
    generation_service: &GenerationService,
    pricing: &PricingResolver,
    generator: &GeneratorClient,
    request: TextGenerationRequest,
) -> AppResult<GenerationResult> {
    let account = account_service
        .get_by_external_id(request.external_id)
        .await?;
    let tier = account.selected_tier;
    let cost = pricing
        .resolve(account.gems, account.sparks, tier)
        .ok_or(AppError::InsufficientBalance)?;

    let (generation, spend) = generation_service
        .start(
            account.id,
            GenerationKind::TextToImage,
            Some(tier),
            Some(request.prompt.clone()),
            None,
            &cost,
            tier.as_str(),
            Some(json!({ "prompt": request.prompt.as_str() })),
        )
        .await?;

    // The debit is committed; from here on a failure must refund.
    match generator.text_to_image(&request.prompt, tier).await {
        Ok(result_url) => {
            generation_service.complete(generation.id, &result_url).await?;
            finish(generation_service, generation.id, false).await
        }
        Err(err) => {
            log::warn!("Text generation {} failed: {err}", generation.id);
            let refunded = generation_service
                .fail(
                    generation.id,
                    &err.to_string(),
                    Some(&Compensation::for_spend(&spend)),
                )
                .await?;
            finish(generation_service, generation.id, refunded).await
        }
    }
}

#[utoipa::path(
    post,
    path = "/generations/preset",
    tag = "generations",
    request_body = PresetGenerationRequest,
    responses(
        (status = 200, description = "Generation finished; failed runs are refunded", body = GenerationResult),
        (status = 400, description = "No preset selected"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Insufficient balance")
    )
)]
pub async fn generate_preset(
    account_service: web::Data<AccountService>,
    generation_service: web::Data<GenerationService>,
    pricing: web::Data<PricingResolver>,
    generator: web::Data<GeneratorClient>,
    request: web::Json<PresetGenerationRequest>,
) -> Result<HttpResponse> {
    match run_preset_generation(
        &account_service,
        &generation_service,
        &pricing,
        &generator,
        request.into_inner(),
    )
    .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": result
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

async fn run_preset_generation(
    account_service: &AccountService,
    generation_service: &GenerationService,
    pricing: &PricingResolver,
    generator: &GeneratorClient,
    request: PresetGenerationRequest,
) -> AppResult<GenerationResult> {
    let account = account_service
        .get_by_external_id(request.external_id)
        .await?;
    let preset_key = account
        .selected_preset
        .clone()
        .ok_or_else(|| AppError::ValidationError("No preset selected".to_string()))?;
    let preset = get_preset(&preset_key)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown preset: {preset_key}")))?;

    let tier = account.selected_tier;
    let cost = pricing
        .resolve(account.gems, account.sparks, tier)
        .ok_or(AppError::InsufficientBalance)?;

    let (generation, spend) = generation_service
        .start(
            account.id,
            GenerationKind::PresetImage,
            Some(tier),
            None,
            Some(preset_key.clone()),
            &cost,
            &format!("preset_{}", tier.as_str()),
            Some(json!({ "preset": preset_key.as_str(), "image_ref": request.image_ref.as_str() })),
        )
        .await?;

    match generator
        .image_to_image(&request.image_ref, preset.prompt, tier)
        .await
    {
        Ok(result_url) => {
            generation_service.complete(generation.id, &result_url).await?;
            finish(generation_service, generation.id, false).await
        }
        Err(err) => {
            log::warn!("Preset generation {} failed: {err}", generation.id);
            let refunded = generation_service
                .fail(
                    generation.id,
                    &err.to_string(),
                    Some(&Compensation::for_spend(&spend)),
                )
                .await?;
            finish(generation_service, generation.id, refunded).await
        }
    }
}

#[utoipa::path(
    post,
    path = "/generations/animate",
    tag = "generations",
    request_body = AnimateRequest,
    responses(
        (status = 200, description = "Animation finished; failed runs are refunded", body = GenerationResult),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Insufficient balance")
    )
)]
pub async fn generate_animate(
    account_service: web::Data<AccountService>,
    generation_service: web::Data<GenerationService>,
    pricing: web::Data<PricingResolver>,
    generator: web::Data<GeneratorClient>,
    request: web::Json<AnimateRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let result = async {
        let account = account_service
            .get_by_external_id(request.external_id)
            .await?;
        let cost = pricing.animate_cost();

        let (generation, spend) = generation_service
            .start(
                account.id,
                GenerationKind::Animate,
                None,
                None,
                None,
                &cost,
                "animate",
                Some(json!({ "image_ref": request.image_ref.as_str() })),
            )
            .await?;

        match generator.animate(&request.image_ref).await {
            Ok(result_url) => {
                generation_service.complete(generation.id, &result_url).await?;
                finish(&generation_service, generation.id, false).await
            }
            Err(err) => {
                log::warn!("Animation {} failed: {err}", generation.id);
                let refunded = generation_service
                    .fail(
                        generation.id,
                        &err.to_string(),
                        Some(&Compensation::for_spend(&spend)),
                    )
                    .await?;
                finish(&generation_service, generation.id, refunded).await
            }
        }
    }
    .await;

    match result {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": result
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

async fn finish(
    generation_service: &GenerationService,
    generation_id: i64,
    refunded: bool,
) -> AppResult<GenerationResult> {
    let generation = generation_service.get(generation_id).await?;
    Ok(GenerationResult {
        generation: GenerationResponse::from(generation),
        refunded,
    })
}

pub fn generation_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/generations")
            .route("/presets", web::get().to(get_presets))
            .route("/text", web::post().to(generate_text))
            .route("/preset", web::post().to(generate_preset))
            .route("/animate", web::post().to(generate_animate)),
    );
}
