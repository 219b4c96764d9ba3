pub mod artifact;
pub mod http;
pub mod registry;

pub use artifact::ModelArtifact;
pub use http::HttpModelService;
pub use registry::ModelRegistry;

use crate::domain::FeatureRecord;
use crate::error::RiskError;

/// The pre-fitted classification pipeline, treated as an opaque collaborator.
///
/// Both calls return one entry per input row. Probability rows are ordered like the artifact's
/// `classes`. Preprocessing (scaling, categorical encoding) happens behind this boundary.
#[async_trait::async_trait]
pub trait ModelService: Send + Sync {
    fn name(&self) -> &'static str;

    async fn predict(&self, records: &[FeatureRecord]) -> Result<Vec<i64>, RiskError>;

    async fn predict_proba(&self, records: &[FeatureRecord]) -> Result<Vec<Vec<f64>>, RiskError>;
}
