use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GeneratorConfig;
use crate::entities::Tier;
use crate::error::{AppError, AppResult};

/// Client for the generation backend. The ledger treats every call as an
/// opaque asynchronous operation that either yields a result URL or fails;
/// the account is always debited before a call and refunded after a
/// failure, never while a call is in flight.
#[derive(Clone)]
pub struct GeneratorClient {
    client: Client,
    config: GeneratorConfig,
}

#[derive(Debug, Serialize)]
struct TextToImageRequest<'a> {
    prompt: &'a str,
    model: &'a str,
}

#[derive(Debug, Serialize)]
struct ImageToImageRequest<'a> {
    image_ref: &'a str,
    prompt: &'a str,
    model: &'a str,
}

#[derive(Debug, Serialize)]
struct AnimateRequest<'a> {
    image_ref: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationReply {
    result_url: String,
}

impl GeneratorClient {
    pub fn new(config: GeneratorConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    pub async fn text_to_image(&self, prompt: &str, tier: Tier) -> AppResult<String> {
        self.post(
            "v1/images/text",
            &TextToImageRequest {
                prompt,
                model: tier.as_str(),
            },
        )
        .await
    }

    pub async fn image_to_image(
        &self,
        image_ref: &str,
        prompt: &str,
        tier: Tier,
    ) -> AppResult<String> {
        self.post(
            "v1/images/transform",
            &ImageToImageRequest {
                image_ref,
                prompt,
                model: tier.as_str(),
            },
        )
        .await
    }

    pub async fn animate(&self, image_ref: &str) -> AppResult<String> {
        self.post("v1/videos/animate", &AnimateRequest { image_ref })
            .await
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> AppResult<String> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        if response.status().is_success() {
            let reply: GenerationReply = response.json().await?;
            Ok(reply.result_url)
        } else {
            let status = response.status();
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            Err(AppError::ExternalApiError(format!(
                "generation backend returned {status}: {detail}"
            )))
        }
    }
}
