use crate::classify::RiskClassifier;
use crate::domain::{CropStage, FeatureRecord, RiskVerdict, WeatherReading};
use crate::error::RiskError;
use crate::normalize::normalize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

/// Result of one "Analyze Risk Level" action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub request_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub crop_stage: CropStage,
    pub record: FeatureRecord,
    pub verdict: RiskVerdict,
    pub headline: String,
    pub advisory: String,
    pub indicator: String,
}

/// Raw form input -> normalized record -> verdict. Errors are returned unchanged.
pub async fn analyze(
    classifier: &RiskClassifier,
    reading: &WeatherReading,
    stage_label: &str,
) -> Result<Assessment, RiskError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("analyze", %request_id, crop_stage = %stage_label);

    async move {
        let res = run(classifier, reading, stage_label, request_id).await;
        match &res {
            Ok(assessment) => tracing::info!(
                tier = %assessment.verdict.tier,
                confidence_percent = assessment.verdict.confidence_percent,
                "risk assessed"
            ),
            Err(err) => tracing::warn!(error = %err, kind = err.kind(), "risk analysis failed"),
        }
        res
    }
    .instrument(span)
    .await
}

async fn run(
    classifier: &RiskClassifier,
    reading: &WeatherReading,
    stage_label: &str,
    request_id: Uuid,
) -> Result<Assessment, RiskError> {
    let crop_stage = stage_label.parse::<CropStage>()?;
    let record = normalize(reading, crop_stage);
    let verdict = classifier.classify(&record).await?;

    Ok(Assessment {
        request_id,
        analyzed_at: Utc::now(),
        crop_stage,
        record,
        verdict,
        headline: verdict.summary(),
        advisory: verdict.tier.advisory().to_string(),
        indicator: verdict.tier.indicator().to_string(),
    })
}
