use async_trait::async_trait;
use feedtape_narration::{
    controllers::audio::AudioController,
    domain::{
        audio::{ItemId, NarrationService},
        tts::{audio_format::encode_canonical, ProviderBuilder, ProviderSelector, VoiceHint},
    },
    infrastructure::{
        auth::BearerAuth,
        http::build_router,
        repositories::{AudioArtifactRepository, SynthesisError, TtsRepository},
    },
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;

pub mod api_client;

use api_client::TestClient;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-key-for-testing-only";

/// Token accepted by every test server
pub static TEST_TOKEN: Lazy<String> = Lazy::new(|| generate_test_jwt("listener-1", TEST_JWT_SECRET));

/// Text containing this marker makes the fake providers fail
pub const FAILING_TEXT_MARKER: &str = "EXPLODE";

pub struct TestContext {
    pub client: TestClient,
    pub token: String,
    pub artifact_repo: Arc<AudioArtifactRepository>,
    pub local: FakeProviderSwitch,
    pub remote: FakeProviderSwitch,
    _audio_dir: TempDir,
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let audio_dir = tempfile::tempdir().expect("Failed to create audio dir");
            let artifact_repo = Arc::new(
                AudioArtifactRepository::open(audio_dir.path().join("audio"))
                    .expect("Failed to open artifact store"),
            );

            let local = FakeProviderSwitch::new("local", true);
            let remote = FakeProviderSwitch::new("polly", true);
            let selector = Arc::new(ProviderSelector::new(
                Arc::new(local.builder()),
                Arc::new(remote.builder()),
            ));

            let narration_service = Arc::new(NarrationService::new(artifact_repo.clone(), selector, 10_000));
            let audio_controller = Arc::new(AudioController::new(narration_service, artifact_repo.clone()));
            let auth = Arc::new(BearerAuth::new(TEST_JWT_SECRET));

            let app = build_router(artifact_repo.clone(), audio_controller, Some(auth));

            // Start server
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind listener");
            let addr = listener.local_addr().expect("Failed to get local addr");
            let base_url = format!("http://{}", addr);

            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            Self {
                client: TestClient::new(&base_url),
                token: TEST_TOKEN.clone(),
                artifact_repo,
                local,
                remote,
                _audio_dir: audio_dir,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // The temp directory is removed on drop
        }
    }
}

impl TestContext {
    /// Put an artifact straight into the store, bypassing synthesis
    pub async fn seed_artifact(&self, seed: &str, bytes: Vec<u8>) -> ItemId {
        let id = ItemId::for_content("https://example.com/feed", seed, "body");
        self.artifact_repo.put(&id, bytes).await.unwrap();
        id
    }
}

/// Shared on/off switch and call counter for one fake provider
#[derive(Clone)]
pub struct FakeProviderSwitch {
    name: &'static str,
    available: Arc<Mutex<bool>>,
    calls: Arc<Mutex<usize>>,
}

impl FakeProviderSwitch {
    fn new(name: &'static str, available: bool) -> Self {
        Self {
            name,
            available: Arc::new(Mutex::new(available)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn set_available(&self, available: bool) {
        *self.available.lock() = available;
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }

    fn builder(&self) -> FakeProviderBuilder {
        FakeProviderBuilder { switch: self.clone() }
    }
}

struct FakeProviderBuilder {
    switch: FakeProviderSwitch,
}

impl ProviderBuilder for FakeProviderBuilder {
    fn name(&self) -> &'static str {
        self.switch.name
    }

    fn build(&self) -> Result<Arc<dyn TtsRepository>, String> {
        if !*self.switch.available.lock() {
            return Err(format!("{} switched off", self.switch.name));
        }
        Ok(Arc::new(FakeProvider {
            switch: self.switch.clone(),
        }))
    }
}

struct FakeProvider {
    switch: FakeProviderSwitch,
}

#[async_trait]
impl TtsRepository for FakeProvider {
    fn name(&self) -> &'static str {
        self.switch.name
    }

    async fn synthesize(&self, text: &str, voice: VoiceHint) -> Result<Vec<u8>, SynthesisError> {
        *self.switch.calls.lock() += 1;
        if text.contains(FAILING_TEXT_MARKER) {
            return Err(SynthesisError::new("engine crashed"));
        }
        Ok(fake_wav(&format!("{}:{}", voice, text)))
    }
}

/// Deterministic canonical WAV derived from `seed`
pub fn fake_wav(seed: &str) -> Vec<u8> {
    let samples: Vec<i16> = seed.bytes().cycle().take(1600).map(|b| (b as i16) * 64).collect();
    encode_canonical(&samples).unwrap()
}

// Helper to generate valid JWT tokens for testing
pub fn generate_test_jwt(subject: &str, secret: &str) -> String {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
    }

    let claims = Claims {
        sub: subject.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
