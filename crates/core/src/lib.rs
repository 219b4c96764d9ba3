pub mod analysis;
pub mod classify;
pub mod domain;
pub mod error;
pub mod model;
pub mod normalize;

pub use error::RiskError;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;

    pub const DEFAULT_MODEL_ARTIFACT_PATH: &str = "model/coffee_disease_model_v1.json";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub model_artifact_path: PathBuf,
        pub model_service_url: Option<String>,
        pub model_service_api_key: Option<String>,
        pub model_service_timeout_secs: Option<u64>,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                model_artifact_path: PathBuf::from(DEFAULT_MODEL_ARTIFACT_PATH),
                model_service_url: None,
                model_service_api_key: None,
                model_service_timeout_secs: None,
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let model_artifact_path = std::env::var("MODEL_ARTIFACT_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_ARTIFACT_PATH));

            let model_service_timeout_secs = match std::env::var("MODEL_SERVICE_TIMEOUT_SECS") {
                Ok(s) => Some(
                    s.trim()
                        .parse::<u64>()
                        .context("MODEL_SERVICE_TIMEOUT_SECS must be a whole number of seconds")?,
                ),
                Err(_) => None,
            };

            Ok(Self {
                model_artifact_path,
                model_service_url: non_empty_var("MODEL_SERVICE_URL"),
                model_service_api_key: non_empty_var("MODEL_SERVICE_API_KEY"),
                model_service_timeout_secs,
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }
}
