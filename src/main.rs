use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use feedtape_narration::controllers::audio::AudioController;
use feedtape_narration::domain::audio::NarrationService;
use feedtape_narration::domain::tts::{LanguageGuesser, ProviderSelector};
use feedtape_narration::infrastructure::auth::BearerAuth;
use feedtape_narration::infrastructure::config::{Config, LogFormat};
use feedtape_narration::infrastructure::http::{build_router, start_http_server};
use feedtape_narration::infrastructure::repositories::{
    AudioArtifactRepository, LocalProviderBuilder, PollyProviderBuilder,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting FeedTape narration server on {}:{}",
        config.host,
        config.port
    );

    // Open the artifact store
    let artifact_repo = Arc::new(AudioArtifactRepository::open(&config.audio_dir)?);
    tracing::info!(path = %config.audio_dir.display(), "Audio artifact store opened");

    // Provider builders only check prerequisites; nothing is contacted until a synthesis runs
    let local_tts = &config.local_tts;
    tracing::info!(
        piper_bin = ?local_tts.piper_bin,
        piper_voice_a = ?local_tts.piper_voice_a,
        espeak_bin = ?local_tts.espeak_bin,
        timeout = ?Duration::from_secs(local_tts.timeout_secs),
        "Local TTS configuration"
    );
    let language_guesser = Arc::new(LanguageGuesser::new());
    let selector = Arc::new(ProviderSelector::new(
        Arc::new(LocalProviderBuilder::new(local_tts.clone())),
        Arc::new(PollyProviderBuilder::new(config.aws_region.clone(), language_guesser)),
    ));

    let narration_service = Arc::new(NarrationService::new(
        artifact_repo.clone(),
        selector,
        config.max_text_chars,
    ));

    let audio_controller = Arc::new(AudioController::new(narration_service, artifact_repo.clone()));

    let auth = match &config.auth_jwt_secret {
        Some(secret) => Some(Arc::new(BearerAuth::new(secret))),
        None => {
            if !config.is_development() {
                tracing::warn!("AUTH_JWT_SECRET not set, audio routes are unauthenticated");
            }
            None
        }
    };

    let app = build_router(artifact_repo, audio_controller, auth);

    start_http_server(Arc::new(config), app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "feedtape_narration=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "feedtape_narration=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
