use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::infrastructure::repositories::AudioArtifactRepository;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Ready once the artifact directory can be listed
pub async fn health_ready(State(artifact_repo): State<Arc<AudioArtifactRepository>>) -> impl IntoResponse {
    match tokio::fs::read_dir(artifact_repo.root()).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "audio_store": "accessible"
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, path = %artifact_repo.root().display(), "Audio directory not accessible");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "audio_store": "inaccessible"
                })),
            )
        }
    }
}
