use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coffee_risk_core::analysis::{self, Assessment};
use coffee_risk_core::domain::WeatherReading;
use coffee_risk_core::model::ModelRegistry;
use coffee_risk_core::RiskError;

mod page;

use page::{FormValues, Outcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = coffee_risk_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let registry = Arc::new(ModelRegistry::from_settings(settings));

    // Load eagerly so a broken artifact shows up at startup. The failure stays cached and every
    // analysis reports it.
    if let Err(e) = registry.get() {
        sentry_anyhow::capture_anyhow(&anyhow::Error::new(e.clone()));
        tracing::error!(error = %e, "model artifact unavailable; starting API in degraded mode");
    }

    let app = router(AppState { registry });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze_form))
        .route("/api/v1/analyze", post(analyze_json))
        .route("/api/v1/model", get(model_info))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    registry: Arc<ModelRegistry>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnalyzeRequest {
    #[serde(default = "default_temperature")]
    temperature: f64,
    #[serde(default = "default_humidity")]
    humidity: f64,
    #[serde(default = "default_rainfall")]
    rainfall: f64,
    #[serde(default = "default_wind_speed")]
    wind_speed: f64,
    crop_stage: String,
}

fn default_temperature() -> f64 {
    WeatherReading::default().avg_temperature
}

fn default_humidity() -> f64 {
    WeatherReading::default().humidity_percent
}

fn default_rainfall() -> f64 {
    WeatherReading::default().rainfall_mm
}

fn default_wind_speed() -> f64 {
    WeatherReading::default().wind_speed_mps
}

impl AnalyzeRequest {
    fn reading(&self) -> WeatherReading {
        WeatherReading {
            avg_temperature: self.temperature,
            humidity_percent: self.humidity,
            rainfall_mm: self.rainfall,
            wind_speed_mps: self.wind_speed,
        }
    }

    fn form_values(&self) -> FormValues {
        FormValues {
            temperature: self.temperature,
            humidity: self.humidity,
            rainfall: self.rainfall,
            wind_speed: self.wind_speed,
            crop_stage: self.crop_stage.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiError {
    kind: &'static str,
    error: String,
}

fn status_for(err: &RiskError) -> StatusCode {
    match err {
        RiskError::SchemaMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RiskError::ArtifactLoad { .. } => StatusCode::SERVICE_UNAVAILABLE,
        RiskError::UndefinedClass { .. } | RiskError::ModelService { .. } => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn report(err: &RiskError) {
    // Bad user input is not an incident.
    if !matches!(err, RiskError::SchemaMismatch { .. }) {
        sentry_anyhow::capture_anyhow(&anyhow::Error::new(err.clone()));
    }
}

async fn run_analysis(state: &AppState, req: &AnalyzeRequest) -> Result<Assessment, RiskError> {
    let classifier = state.registry.get()?;
    analysis::analyze(&classifier, &req.reading(), &req.crop_stage).await
}

async fn index() -> Html<String> {
    Html(page::render(&FormValues::default(), None))
}

async fn analyze_form(
    State(state): State<AppState>,
    form: Result<Form<AnalyzeRequest>, FormRejection>,
) -> Response {
    let req = match form {
        Ok(Form(req)) => req,
        Err(rejection) => {
            let err = RiskError::schema_mismatch("form", rejection.body_text());
            return (
                rejection.status(),
                Html(page::render(&FormValues::default(), Some(Outcome::Failed(&err)))),
            )
                .into_response();
        }
    };
    let values = req.form_values();
    match run_analysis(&state, &req).await {
        Ok(assessment) => {
            Html(page::render(&values, Some(Outcome::Verdict(&assessment)))).into_response()
        }
        Err(err) => {
            report(&err);
            (
                status_for(&err),
                Html(page::render(&values, Some(Outcome::Failed(&err)))),
            )
                .into_response()
        }
    }
}

async fn analyze_json(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<Assessment>, (StatusCode, Json<ApiError>)> {
    run_analysis(&state, &req).await.map(Json).map_err(|err| {
        report(&err);
        (
            status_for(&err),
            Json(ApiError {
                kind: err.kind(),
                error: err.to_string(),
            }),
        )
    })
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    version: String,
    numeric_features: Vec<String>,
    crop_stages: Vec<String>,
    classes: Vec<i64>,
}

async fn model_info(
    State(state): State<AppState>,
) -> Result<Json<ModelInfo>, (StatusCode, Json<ApiError>)> {
    let classifier = state.registry.get().map_err(|err| {
        (
            status_for(&err),
            Json(ApiError {
                kind: err.kind(),
                error: err.to_string(),
            }),
        )
    })?;
    let artifact = classifier.artifact();

    Ok(Json(ModelInfo {
        name: artifact.name.clone(),
        version: artifact.version.clone(),
        numeric_features: artifact.numeric_features.clone(),
        crop_stages: artifact.stage_vocabulary().to_vec(),
        classes: artifact.classes.clone(),
    }))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &coffee_risk_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
