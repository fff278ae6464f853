use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    controllers::{audio::AudioController, health},
    infrastructure::{
        auth::{auth_middleware, request_id_middleware, BearerAuth},
        config::Config,
        repositories::AudioArtifactRepository,
    },
};

/// Assemble every route. Audio routes sit behind bearer auth when `auth` is set.
pub fn build_router(
    artifact_repo: Arc<AudioArtifactRepository>,
    audio_controller: Arc<AudioController>,
    auth: Option<Arc<BearerAuth>>,
) -> Router {
    // Wildcard so multi-segment ids still reach item id validation
    let mut audio_routes = Router::new()
        .route("/audio/*item_id", get(AudioController::serve_audio))
        .route("/api/audio/generate", post(AudioController::generate))
        .route("/api/audio/availability", post(AudioController::availability))
        .route("/api/audio/provider", get(AudioController::provider))
        .with_state(audio_controller);

    if let Some(auth) = auth {
        audio_routes = audio_routes.layer(middleware::from_fn_with_state(auth, auth_middleware));
    }

    // The player reads Content-Range from cross-origin responses
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::POST])
        .allow_headers([header::RANGE, header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_RANGE, header::ACCEPT_RANGES, header::CONTENT_LENGTH]);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(artifact_repo)
        .merge(audio_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(config: Arc<Config>, app: Router) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
