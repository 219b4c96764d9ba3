use thiserror::Error;

/// Failures that abort a single analysis request.
///
/// Upstream details are carried verbatim so callers can show them to the user as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error("schema mismatch on {field}: {detail}")]
    SchemaMismatch { field: String, detail: String },

    #[error("failed to load model artifact {path}: {detail}")]
    ArtifactLoad { path: String, detail: String },

    #[error("model returned undefined class {class} (expected 0, 1 or 2)")]
    UndefinedClass { class: i64 },

    #[error("model service error: {detail}")]
    ModelService { detail: String },
}

impl RiskError {
    pub fn schema_mismatch(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            field: field.into(),
            detail: detail.into(),
        }
    }

    pub fn model_service(detail: impl Into<String>) -> Self {
        Self::ModelService {
            detail: detail.into(),
        }
    }

    /// Stable machine-readable name, used in JSON error bodies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::ArtifactLoad { .. } => "artifact_load",
            Self::UndefinedClass { .. } => "undefined_class",
            Self::ModelService { .. } => "model_service",
        }
    }
}
