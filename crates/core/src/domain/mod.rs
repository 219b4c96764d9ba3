pub mod risk;
pub mod weather;

pub use risk::{RiskTier, RiskVerdict};
pub use weather::{CropStage, FeatureRecord, WeatherReading};
