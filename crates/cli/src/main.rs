use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coffee_risk_core::analysis::{self, Assessment};
use coffee_risk_core::domain::WeatherReading;
use coffee_risk_core::model::ModelRegistry;

#[derive(Debug, Parser)]
#[command(name = "coffee_risk_cli", about = "Assess Coffee Leaf Rust risk for one set of readings")]
struct Args {
    /// Average temperature (°C).
    #[arg(long, default_value_t = 22.0, allow_negative_numbers = true)]
    temperature: f64,

    /// Relative humidity (%).
    #[arg(long, default_value_t = 70.0, allow_negative_numbers = true)]
    humidity: f64,

    /// Rainfall (mm).
    #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
    rainfall: f64,

    /// Wind speed (m/s).
    #[arg(long, default_value_t = 2.0, allow_negative_numbers = true)]
    wind_speed: f64,

    /// One of: Flowering, "Berry Development", Ripening, Harvesting.
    #[arg(long, default_value = "Flowering")]
    crop_stage: String,

    /// Model artifact manifest. Overrides MODEL_ARTIFACT_PATH.
    #[arg(long)]
    artifact: Option<PathBuf>,

    /// Inference endpoint. Overrides MODEL_SERVICE_URL and the artifact's endpoint.
    #[arg(long)]
    model_url: Option<String>,

    /// Print the full assessment as JSON.
    #[arg(long)]
    json: bool,
}

impl Args {
    fn reading(&self) -> WeatherReading {
        WeatherReading {
            avg_temperature: self.temperature,
            humidity_percent: self.humidity,
            rainfall_mm: self.rainfall,
            wind_speed_mps: self.wind_speed,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = coffee_risk_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Some(path) = &args.artifact {
        settings.model_artifact_path = path.clone();
    }
    if let Some(url) = &args.model_url {
        settings.model_service_url = Some(url.clone());
    }

    let registry = ModelRegistry::from_settings(settings);
    let res = run(&registry, &args).await;

    match res {
        Ok(assessment) => {
            print_assessment(&assessment, args.json)?;
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            Err(err)
        }
    }
}

async fn run(registry: &ModelRegistry, args: &Args) -> anyhow::Result<Assessment> {
    let classifier = registry.get()?;
    let assessment = analysis::analyze(&classifier, &args.reading(), &args.crop_stage).await?;
    Ok(assessment)
}

fn print_assessment(assessment: &Assessment, json: bool) -> anyhow::Result<()> {
    if json {
        let text =
            serde_json::to_string_pretty(assessment).context("failed to encode assessment")?;
        println!("{text}");
    } else {
        println!("[{}] {}", assessment.indicator, assessment.headline);
        println!("{}", assessment.advisory);
    }
    Ok(())
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
