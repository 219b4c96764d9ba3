use crate::domain::{CropStage, FeatureRecord, WeatherReading};

/// Builds the model's input row from one set of readings.
///
/// Historical readings are not available at inference time, so each `_Lag14` column is filled with
/// the current value. Values are passed through unchanged, including physically impossible ones;
/// clamping them would shift predictions away from what the artifact was trained on.
pub fn normalize(reading: &WeatherReading, stage: CropStage) -> FeatureRecord {
    FeatureRecord {
        temp_avg: reading.avg_temperature,
        humidity: reading.humidity_percent,
        rainfall: reading.rainfall_mm,
        wind_speed: reading.wind_speed_mps,
        temp_avg_lag14: reading.avg_temperature,
        humidity_lag14: reading.humidity_percent,
        rainfall_lag14: reading.rainfall_mm,
        wind_speed_lag14: reading.wind_speed_mps,
        crop_stage: stage,
    }
}
