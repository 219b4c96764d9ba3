use crate::domain::FeatureRecord;
use crate::error::RiskError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Manifest describing the serialized classifier: where it is served and the schema it was fit on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub version: String,
    /// Base URL of the inference process hosting the pipeline.
    #[serde(default)]
    pub endpoint: Option<String>,
    pub numeric_features: Vec<String>,
    /// Column name -> categories seen during training.
    pub categorical_features: BTreeMap<String, Vec<String>>,
    /// Class codes in the order `predict_proba` reports them.
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
}

fn default_classes() -> Vec<i64> {
    vec![0, 1, 2]
}

impl ModelArtifact {
    pub fn load(path: &Path) -> Result<Self, RiskError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| RiskError::ArtifactLoad {
            path: display.clone(),
            detail: e.to_string(),
        })?;
        Self::from_json(&display, &text)
    }

    pub fn from_json(source: &str, text: &str) -> Result<Self, RiskError> {
        let load_err = |detail: String| RiskError::ArtifactLoad {
            path: source.to_string(),
            detail,
        };

        let artifact = serde_json::from_str::<ModelArtifact>(text)
            .map_err(|e| load_err(format!("invalid manifest JSON: {e}")))?;
        artifact.validate().map_err(load_err)?;

        let unknown: Vec<i64> = artifact
            .classes
            .iter()
            .copied()
            .filter(|c| !(0..=2).contains(c))
            .collect();
        if !unknown.is_empty() {
            tracing::warn!(
                artifact = %artifact.name,
                ?unknown,
                "artifact declares classes with no risk tier; predictions of them will fail"
            );
        }

        Ok(artifact)
    }

    fn validate(&self) -> Result<(), String> {
        let expected: BTreeSet<&str> = FeatureRecord::NUMERIC_COLUMNS.into_iter().collect();
        let declared: BTreeSet<&str> = self.numeric_features.iter().map(String::as_str).collect();
        if declared != expected || declared.len() != self.numeric_features.len() {
            let missing: Vec<_> = expected.difference(&declared).collect();
            let unexpected: Vec<_> = declared.difference(&expected).collect();
            return Err(format!(
                "numeric features do not match the input schema (missing {missing:?}, unexpected {unexpected:?})"
            ));
        }

        let stage_column = FeatureRecord::CATEGORICAL_COLUMN;
        if let Some(extra) = self
            .categorical_features
            .keys()
            .find(|k| k.as_str() != stage_column)
        {
            return Err(format!("unexpected categorical feature {extra:?}"));
        }
        match self.categorical_features.get(stage_column) {
            Some(categories) if !categories.is_empty() => {}
            _ => return Err(format!("no vocabulary for categorical feature {stage_column:?}")),
        }

        if self.classes.is_empty() {
            return Err("classes must be non-empty".to_string());
        }
        let unique: BTreeSet<i64> = self.classes.iter().copied().collect();
        if unique.len() != self.classes.len() {
            return Err(format!("classes must not repeat (got {:?})", self.classes));
        }
        Ok(())
    }

    pub fn stage_vocabulary(&self) -> &[String] {
        self.categorical_features
            .get(FeatureRecord::CATEGORICAL_COLUMN)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Rejects a record the embedded encoder would fail on.
    pub fn check_record(&self, record: &FeatureRecord) -> Result<(), RiskError> {
        let label = record.crop_stage.label();
        if self.stage_vocabulary().iter().any(|c| c == label) {
            return Ok(());
        }
        Err(RiskError::schema_mismatch(
            FeatureRecord::CATEGORICAL_COLUMN,
            format!(
                "category {label:?} was not seen when {} {} was fit (known: {:?})",
                self.name,
                self.version,
                self.stage_vocabulary()
            ),
        ))
    }
}

#[cfg(test)]
pub(crate) fn test_artifact() -> ModelArtifact {
    ModelArtifact::from_json("test", MANIFEST_V1).unwrap()
}

#[cfg(test)]
pub(crate) const MANIFEST_V1: &str = r#"{
    "name": "coffee_disease_model",
    "version": "v1",
    "endpoint": "http://127.0.0.1:8500",
    "numeric_features": [
        "Temp(Avg)", "Humidity(%)", "Rainfall(mm)", "WindSpeed(m/s)",
        "Temp(Avg)_Lag14", "Humidity(%)_Lag14", "Rainfall(mm)_Lag14", "WindSpeed(m/s)_Lag14"
    ],
    "categorical_features": {
        "CropStage": ["Flowering", "Berry Development", "Ripening", "Harvesting"]
    },
    "classes": [0, 1, 2]
}"#;
