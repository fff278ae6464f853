use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::{
    domain::{
        audio::{
            Availability, ByteRange, GenerationReport, ItemId, NarrationItem, NarrationService,
            NarrationServiceApi, ProviderStatus,
        },
        tts::VoiceHint,
    },
    error::{AppError, AppResult},
    infrastructure::repositories::AudioArtifactRepository,
};

/// Artifacts never change once stored, so clients may cache them forever
const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Request for POST /api/audio/generate
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub voice: VoiceHint,
    pub items: Vec<GenerateItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateItem {
    #[serde(default)]
    pub id: Option<ItemId>,
    pub source_url: String,
    pub title: String,
    pub text: String,
}

/// Request for POST /api/audio/availability
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub items: Vec<Availability>,
}

pub struct AudioController {
    narration_service: Arc<NarrationService>,
    artifact_repo: Arc<AudioArtifactRepository>,
}

impl AudioController {
    pub fn new(narration_service: Arc<NarrationService>, artifact_repo: Arc<AudioArtifactRepository>) -> Self {
        Self {
            narration_service,
            artifact_repo,
        }
    }

    /// GET|HEAD /audio/:itemId - Stream a stored artifact, honoring `Range`
    pub async fn serve_audio(
        State(controller): State<Arc<AudioController>>,
        Path(raw_id): Path<String>,
        method: Method,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        // Validated before anything touches the filesystem
        let item_id = ItemId::parse(&raw_id)?;
        let artifact = controller.narration_service.artifact(&item_id).await?;
        let total = artifact.size_bytes;

        let range = match headers.get(header::RANGE) {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| AppError::RangeNotSatisfiable { total_size: total })?;
                Some(ByteRange::parse(value, total)?)
            }
            None => None,
        };

        let (status, length) = match range {
            Some(range) => (StatusCode::PARTIAL_CONTENT, range.length()),
            None => (StatusCode::OK, total),
        };

        tracing::debug!(
            item_id = %item_id,
            status = status.as_u16(),
            length,
            total,
            "Serving audio"
        );

        let body = if method == Method::HEAD {
            Body::empty()
        } else {
            let reader = controller.artifact_repo.open_range(&artifact, range).await?;
            Body::from_stream(ReaderStream::new(reader))
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;

        let response_headers = response.headers_mut();
        response_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(artifact.mime_type));
        response_headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(IMMUTABLE_CACHE_CONTROL));
        response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        response_headers.insert(header::ETAG, header_value(&format!("\"{}\"", item_id))?);
        if let Some(range) = range {
            response_headers.insert(header::CONTENT_RANGE, header_value(&range.content_range(total))?);
        }

        Ok(response)
    }

    /// POST /api/audio/generate - Narrate a batch of items, blocking until done
    pub async fn generate(
        State(controller): State<Arc<AudioController>>,
        Json(request): Json<GenerateRequest>,
    ) -> AppResult<Json<GenerationReport>> {
        if request.items.is_empty() {
            return Err(AppError::BadRequest("At least one item is required".to_string()));
        }

        let items = request
            .items
            .into_iter()
            .map(GenerateItem::into_narration_item)
            .collect::<AppResult<Vec<_>>>()?;

        tracing::info!(items = items.len(), voice = %request.voice, "Narration batch requested");

        let report = controller
            .narration_service
            .generate_batch(items, request.voice)
            .await;

        Ok(Json(report))
    }

    /// POST /api/audio/availability - "Has audio" flags for a page of items
    pub async fn availability(
        State(controller): State<Arc<AudioController>>,
        Json(request): Json<AvailabilityRequest>,
    ) -> AppResult<Json<AvailabilityResponse>> {
        let ids = request
            .ids
            .iter()
            .map(|raw| ItemId::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let items = controller.narration_service.availability(&ids).await?;

        Ok(Json(AvailabilityResponse { items }))
    }

    /// GET /api/audio/provider - Which TTS provider would be used right now
    pub async fn provider(State(controller): State<Arc<AudioController>>) -> Json<ProviderStatus> {
        Json(controller.narration_service.current_provider())
    }
}

impl GenerateItem {
    fn into_narration_item(self) -> AppResult<NarrationItem> {
        let derived = ItemId::for_content(&self.source_url, &self.title, &self.text);
        if let Some(id) = self.id {
            if id != derived {
                return Err(AppError::BadRequest(format!(
                    "Item id {} does not match its content",
                    id
                )));
            }
        }

        Ok(NarrationItem {
            id: derived,
            text: self.text,
        })
    }
}

fn header_value(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| AppError::Internal(format!("Invalid header value: {}", e)))
}
