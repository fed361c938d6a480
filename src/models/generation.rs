use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{
    GenerationKind, GenerationStatus, Tier, generation_entity as generations,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TextGenerationRequest {
    pub external_id: i64,
    #[schema(example = "a lighthouse at dawn, oil painting")]
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PresetGenerationRequest {
    pub external_id: i64,
    /// Opaque reference to the uploaded source image.
    pub image_ref: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnimateRequest {
    pub external_id: i64,
    pub image_ref: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerationResponse {
    pub id: i64,
    pub user_id: i64,
    pub kind: GenerationKind,
    pub tier: Option<Tier>,
    pub prompt: Option<String>,
    pub preset: Option<String>,
    pub status: GenerationStatus,
    pub cost_gems: i64,
    pub cost_sparks: i64,
    pub result_url: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<generations::Model> for GenerationResponse {
    fn from(g: generations::Model) -> Self {
        Self {
            id: g.id,
            user_id: g.user_id,
            kind: g.kind,
            tier: g.tier,
            prompt: g.prompt,
            preset: g.preset,
            status: g.status,
            cost_gems: g.cost_gems,
            cost_sparks: g.cost_sparks,
            result_url: g.result_url,
            error: g.error,
            created_at: g.created_at,
        }
    }
}

/// Outcome of a generation request: the audit record plus whether the
/// debited tokens were given back on failure.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerationResult {
    pub generation: GenerationResponse,
    pub refunded: bool,
}
