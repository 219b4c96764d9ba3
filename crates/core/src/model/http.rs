use crate::config::Settings;
use crate::domain::FeatureRecord;
use crate::error::RiskError;
use crate::model::{ModelArtifact, ModelService};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PREDICT_PATH: &str = "/v1/predict";
const PREDICT_PROBA_PATH: &str = "/v1/predict_proba";

/// Talks to an inference process that hosts the pickled pipeline and exposes
/// `predict` / `predict_proba` over JSON.
#[derive(Debug, Clone)]
pub struct HttpModelService {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    instances: &'a [FeatureRecord],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct PredictProbaResponse {
    probabilities: Vec<Vec<f64>>,
}

impl HttpModelService {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, RiskError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| RiskError::model_service(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// `MODEL_SERVICE_URL` wins over the endpoint recorded in the artifact.
    pub fn from_settings(settings: &Settings, artifact: &ModelArtifact) -> Result<Self, RiskError> {
        let base_url = settings
            .model_service_url
            .clone()
            .or_else(|| artifact.endpoint.clone())
            .ok_or_else(|| RiskError::ArtifactLoad {
                path: settings.model_artifact_path.display().to_string(),
                detail: "no endpoint in artifact and MODEL_SERVICE_URL is unset".to_string(),
            })?;

        Self::new(
            base_url,
            settings.model_service_api_key.clone(),
            settings.model_service_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap, RiskError> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            let value = HeaderValue::from_str(api_key)
                .map_err(|e| RiskError::model_service(format!("invalid api key header: {e}")))?;
            headers.insert("x-api-key", value);
        }
        Ok(headers)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        records: &[FeatureRecord],
    ) -> Result<T, RiskError> {
        let url = self.url(path);
        let res = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&InferenceRequest { instances: records })
            .send()
            .await
            .map_err(|e| RiskError::model_service(format!("request to {url} failed: {e}")))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| RiskError::model_service(format!("failed to read response body: {e}")))?;

        // The pipeline's own validation failures (unseen category, missing column) come back as
        // client errors; anything else is the service's problem.
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(RiskError::schema_mismatch("record", text));
        }
        if !status.is_success() {
            return Err(RiskError::model_service(format!("HTTP {status}: {text}")));
        }

        serde_json::from_str::<T>(&text).map_err(|e| {
            RiskError::model_service(format!("unexpected response from {path}: {e}: {text}"))
        })
    }
}

#[async_trait::async_trait]
impl ModelService for HttpModelService {
    fn name(&self) -> &'static str {
        "http_inference"
    }

    async fn predict(&self, records: &[FeatureRecord]) -> Result<Vec<i64>, RiskError> {
        let parsed: PredictResponse = self.post(PREDICT_PATH, records).await?;
        ensure_rows(PREDICT_PATH, parsed.predictions.len(), records.len())?;
        Ok(parsed.predictions)
    }

    async fn predict_proba(&self, records: &[FeatureRecord]) -> Result<Vec<Vec<f64>>, RiskError> {
        let parsed: PredictProbaResponse = self.post(PREDICT_PROBA_PATH, records).await?;
        ensure_rows(PREDICT_PROBA_PATH, parsed.probabilities.len(), records.len())?;
        Ok(parsed.probabilities)
    }
}

fn ensure_rows(path: &str, got: usize, sent: usize) -> Result<(), RiskError> {
    if got == sent {
        return Ok(());
    }
    Err(RiskError::model_service(format!(
        "{path} returned {got} rows for {sent} inputs"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CropStage, WeatherReading};
    use crate::model::artifact::test_artifact;
    use crate::normalize::normalize;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn record() -> FeatureRecord {
        normalize(&WeatherReading::default(), CropStage::Flowering)
    }

    #[tokio::test]
    async fn posts_instances_with_training_column_names() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::default();
        let seen_in_handler = seen.clone();
        let app = Router::new().route(
            "/v1/predict",
            post(move |Json(body): Json<Value>| {
                let seen = seen_in_handler.clone();
                async move {
                    *seen.lock().unwrap() = Some(body);
                    Json(json!({"predictions": [1]}))
                }
            }),
        );
        let base = spawn(app).await;

        let service = HttpModelService::new(format!("{base}/"), None, None).unwrap();
        let predictions = service.predict(&[record()]).await.unwrap();
        assert_eq!(predictions, vec![1]);

        let body = seen.lock().unwrap().clone().unwrap();
        let row = &body["instances"][0];
        assert_eq!(row["Temp(Avg)"], json!(22.0));
        assert_eq!(row["Humidity(%)_Lag14"], json!(70.0));
        assert_eq!(row["WindSpeed(m/s)_Lag14"], json!(2.0));
        assert_eq!(row["CropStage"], json!("Flowering"));
    }

    #[tokio::test]
    async fn sends_api_key_header_when_configured() {
        let app = Router::new().route(
            "/v1/predict_proba",
            post(|headers: AxumHeaders| async move {
                let key = headers
                    .get("x-api-key")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if key == "secret" {
                    (AxumStatus::OK, Json(json!({"probabilities": [[0.1, 0.65, 0.25]]})))
                } else {
                    (AxumStatus::UNAUTHORIZED, Json(json!({"detail": "bad key"})))
                }
            }),
        );
        let base = spawn(app).await;

        let service = HttpModelService::new(&base, Some("secret".to_string()), None).unwrap();
        let proba = service.predict_proba(&[record()]).await.unwrap();
        assert_eq!(proba, vec![vec![0.1, 0.65, 0.25]]);

        let anonymous = HttpModelService::new(&base, None, None).unwrap();
        let err = anonymous.predict_proba(&[record()]).await.unwrap_err();
        assert!(matches!(err, RiskError::ModelService { .. }));
        assert!(err.to_string().contains("401"), "{err}");
    }

    #[tokio::test]
    async fn unprocessable_entity_is_a_schema_mismatch_with_body_verbatim() {
        let detail = "Found unknown categories ['Unknown'] in column 0 during transform";
        let app = Router::new().route(
            "/v1/predict",
            post(move || async move { (AxumStatus::UNPROCESSABLE_ENTITY, detail) }),
        );
        let base = spawn(app).await;

        let service = HttpModelService::new(&base, None, None).unwrap();
        let err = service.predict(&[record()]).await.unwrap_err();
        assert_eq!(err, RiskError::schema_mismatch("record", detail));
    }

    #[tokio::test]
    async fn row_count_mismatch_is_rejected() {
        let app = Router::new().route(
            "/v1/predict",
            post(|| async { Json(json!({"predictions": [0, 2]})) }),
        );
        let base = spawn(app).await;

        let service = HttpModelService::new(&base, None, None).unwrap();
        let err = service.predict(&[record()]).await.unwrap_err();
        assert!(matches!(err, RiskError::ModelService { .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_a_model_service_error() {
        let app = Router::new().route(
            "/v1/predict",
            post(|| async { Json(json!({"prediction": "LOW"})) }),
        );
        let base = spawn(app).await;

        let service = HttpModelService::new(&base, None, None).unwrap();
        let err = service.predict(&[record()]).await.unwrap_err();
        assert!(matches!(err, RiskError::ModelService { .. }));
    }

    #[test]
    fn settings_url_overrides_artifact_endpoint() {
        let artifact = test_artifact();
        let mut settings = Settings::default();

        let service = HttpModelService::from_settings(&settings, &artifact).unwrap();
        assert_eq!(service.base_url(), "http://127.0.0.1:8500");

        settings.model_service_url = Some("http://inference.internal:9000".to_string());
        let service = HttpModelService::from_settings(&settings, &artifact).unwrap();
        assert_eq!(service.base_url(), "http://inference.internal:9000");
    }

    #[test]
    fn missing_endpoint_is_an_artifact_load_error() {
        let mut artifact = test_artifact();
        artifact.endpoint = None;
        let err = HttpModelService::from_settings(&Settings::default(), &artifact).unwrap_err();
        assert!(matches!(err, RiskError::ArtifactLoad { .. }));
    }
}
