use crate::classify::RiskClassifier;
use crate::config::Settings;
use crate::error::RiskError;
use crate::model::{HttpModelService, ModelArtifact};
use std::sync::{Arc, OnceLock};

type Loader = Box<dyn Fn() -> Result<RiskClassifier, RiskError> + Send + Sync>;

/// Process-wide, load-once holder for the classifier.
///
/// The first caller runs the loader; concurrent callers block until it finishes. The outcome,
/// success or failure, is kept for the life of the process, so a broken artifact is reported once
/// and never reloaded per request.
pub struct ModelRegistry {
    cell: OnceLock<Result<Arc<RiskClassifier>, RiskError>>,
    loader: Loader,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("loaded", &self.cell.get().map(Result::is_ok))
            .finish_non_exhaustive()
    }
}

impl ModelRegistry {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<RiskClassifier, RiskError> + Send + Sync + 'static,
    {
        Self {
            cell: OnceLock::new(),
            loader: Box::new(loader),
        }
    }

    /// Reads the artifact manifest at `settings.model_artifact_path` and binds it to the
    /// inference endpoint over HTTP.
    pub fn from_settings(settings: Settings) -> Self {
        Self::new(move || {
            let artifact = ModelArtifact::load(&settings.model_artifact_path)?;
            let service = HttpModelService::from_settings(&settings, &artifact)?;
            tracing::info!(
                artifact = %artifact.name,
                version = %artifact.version,
                endpoint = %service.base_url(),
                "model artifact loaded"
            );
            Ok(RiskClassifier::new(Arc::new(service), Arc::new(artifact)))
        })
    }

    /// Wraps an already-built classifier.
    pub fn preloaded(classifier: RiskClassifier) -> Self {
        let registry = Self::new(|| {
            Err(RiskError::model_service(
                "preloaded registry has no loader",
            ))
        });
        let _ = registry.cell.set(Ok(Arc::new(classifier)));
        registry
    }

    pub fn get(&self) -> Result<Arc<RiskClassifier>, RiskError> {
        self.cell
            .get_or_init(|| {
                let res = (self.loader)().map(Arc::new);
                if let Err(err) = &res {
                    tracing::error!(error = %err, "model artifact failed to load");
                }
                res
            })
            .clone()
    }
}
