use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Artifact store
    pub audio_dir: PathBuf,
    // Bearer auth in front of the audio routes (disabled when unset)
    pub auth_jwt_secret: Option<String>,
    // Remote fallback provider
    pub aws_region: String,
    // Local engine
    pub local_tts: LocalTtsConfig,
    pub max_text_chars: usize,
}

/// Paths for the local synthesis engines.
///
/// Only the locations are resolved here; whether the binaries and models
/// actually exist is checked every time a provider is constructed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalTtsConfig {
    pub piper_bin: Option<PathBuf>,
    pub piper_voice_a: Option<PathBuf>,
    pub piper_voice_b: Option<PathBuf>,
    pub espeak_bin: Option<PathBuf>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            environment: match env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .as_str()
            {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            audio_dir: env::var("AUDIO_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data/audio")),
            auth_jwt_secret: env::var("AUTH_JWT_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "eu-west-1".to_string()),
            local_tts: LocalTtsConfig::from_env()?,
            max_text_chars: env::var("MAX_TEXT_CHARS")
                .unwrap_or_else(|_| "100000".to_string())
                .parse()?,
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

impl LocalTtsConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            piper_bin: env_path("PIPER_BIN").or_else(|| find_in_path("piper")),
            piper_voice_a: env_path("PIPER_VOICE_A"),
            piper_voice_b: env_path("PIPER_VOICE_B"),
            espeak_bin: env_path("ESPEAK_BIN")
                .or_else(|| find_in_path("espeak-ng"))
                .or_else(|| find_in_path("espeak")),
            timeout_secs: env::var("TTS_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()?,
        })
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}

/// Resolve a bare binary name against `PATH`.
fn find_in_path(bin: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(bin))
        .find(|candidate| candidate.is_file())
}
