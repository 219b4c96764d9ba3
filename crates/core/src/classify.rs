use crate::domain::{FeatureRecord, RiskTier, RiskVerdict};
use crate::error::RiskError;
use crate::model::{ModelArtifact, ModelService};
use std::sync::Arc;

/// Turns the model's class code and probability row into a risk verdict.
#[derive(Clone)]
pub struct RiskClassifier {
    model: Arc<dyn ModelService>,
    artifact: Arc<ModelArtifact>,
}

impl std::fmt::Debug for RiskClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskClassifier")
            .field("model", &self.model.name())
            .field("artifact", &format_args!("{} {}", self.artifact.name, self.artifact.version))
            .finish()
    }
}

impl RiskClassifier {
    pub fn new(model: Arc<dyn ModelService>, artifact: Arc<ModelArtifact>) -> Self {
        Self { model, artifact }
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub async fn classify(&self, record: &FeatureRecord) -> Result<RiskVerdict, RiskError> {
        record.check_finite()?;
        self.artifact.check_record(record)?;

        let batch = std::slice::from_ref(record);
        let class = single_row("predict", self.model.predict(batch).await?)?;
        let probabilities = single_row("predict_proba", self.model.predict_proba(batch).await?)?;

        if probabilities.len() != self.artifact.classes.len() {
            return Err(RiskError::model_service(format!(
                "probability row has {} entries but the artifact declares {} classes",
                probabilities.len(),
                self.artifact.classes.len()
            )));
        }
        let confidence = max_probability(&probabilities)?;
        let tier = RiskTier::from_class(class)?;

        Ok(RiskVerdict {
            tier,
            confidence_percent: confidence * 100.0,
        })
    }
}

fn single_row<T>(call: &str, rows: Vec<T>) -> Result<T, RiskError> {
    let n = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), n) {
        (Some(row), 1) => Ok(row),
        _ => Err(RiskError::model_service(format!(
            "{call} returned {n} rows for a single record"
        ))),
    }
}

fn max_probability(probabilities: &[f64]) -> Result<f64, RiskError> {
    // Also catches NaN and infinities.
    if let Some(bad) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(RiskError::model_service(format!(
            "class probability {bad} is outside [0, 1]"
        )));
    }
    probabilities
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or_else(|| RiskError::model_service("empty probability row"))
}
