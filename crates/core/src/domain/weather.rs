use crate::error::RiskError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Growth stage of the coffee crop. The labels are the exact category values the model was fit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CropStage {
    #[serde(rename = "Flowering")]
    Flowering,
    #[serde(rename = "Berry Development")]
    BerryDevelopment,
    #[serde(rename = "Ripening")]
    Ripening,
    #[serde(rename = "Harvesting")]
    Harvesting,
}

impl CropStage {
    /// Selector order.
    pub const ALL: [CropStage; 4] = [
        CropStage::Flowering,
        CropStage::BerryDevelopment,
        CropStage::Ripening,
        CropStage::Harvesting,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CropStage::Flowering => "Flowering",
            CropStage::BerryDevelopment => "Berry Development",
            CropStage::Ripening => "Ripening",
            CropStage::Harvesting => "Harvesting",
        }
    }
}

impl fmt::Display for CropStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CropStage {
    type Err = RiskError;

    // Exact match only: the encoder behind the model compares bytes, not meaning.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CropStage::ALL
            .into_iter()
            .find(|stage| stage.label() == s)
            .ok_or_else(|| {
                RiskError::schema_mismatch(
                    FeatureRecord::CATEGORICAL_COLUMN,
                    format!(
                        "unknown category {s:?}; expected one of {:?}",
                        CropStage::ALL.map(CropStage::label)
                    ),
                )
            })
    }
}

/// Raw weather readings as entered by the user. No range validation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// °C
    pub avg_temperature: f64,
    pub humidity_percent: f64,
    pub rainfall_mm: f64,
    pub wind_speed_mps: f64,
}

impl Default for WeatherReading {
    fn default() -> Self {
        Self {
            avg_temperature: 22.0,
            humidity_percent: 70.0,
            rainfall_mm: 5.0,
            wind_speed_mps: 2.0,
        }
    }
}

/// One row in the exact schema the model artifact was trained on.
///
/// Field renames are the training column names and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(rename = "Temp(Avg)")]
    pub temp_avg: f64,
    #[serde(rename = "Humidity(%)")]
    pub humidity: f64,
    #[serde(rename = "Rainfall(mm)")]
    pub rainfall: f64,
    #[serde(rename = "WindSpeed(m/s)")]
    pub wind_speed: f64,
    #[serde(rename = "Temp(Avg)_Lag14")]
    pub temp_avg_lag14: f64,
    #[serde(rename = "Humidity(%)_Lag14")]
    pub humidity_lag14: f64,
    #[serde(rename = "Rainfall(mm)_Lag14")]
    pub rainfall_lag14: f64,
    #[serde(rename = "WindSpeed(m/s)_Lag14")]
    pub wind_speed_lag14: f64,
    #[serde(rename = "CropStage")]
    pub crop_stage: CropStage,
}

impl FeatureRecord {
    pub const NUMERIC_COLUMNS: [&'static str; 8] = [
        "Temp(Avg)",
        "Humidity(%)",
        "Rainfall(mm)",
        "WindSpeed(m/s)",
        "Temp(Avg)_Lag14",
        "Humidity(%)_Lag14",
        "Rainfall(mm)_Lag14",
        "WindSpeed(m/s)_Lag14",
    ];

    pub const CATEGORICAL_COLUMN: &'static str = "CropStage";

    /// Numeric values paired with their column names, in `NUMERIC_COLUMNS` order.
    pub fn numeric_values(&self) -> [(&'static str, f64); 8] {
        let c = Self::NUMERIC_COLUMNS;
        [
            (c[0], self.temp_avg),
            (c[1], self.humidity),
            (c[2], self.rainfall),
            (c[3], self.wind_speed),
            (c[4], self.temp_avg_lag14),
            (c[5], self.humidity_lag14),
            (c[6], self.rainfall_lag14),
            (c[7], self.wind_speed_lag14),
        ]
    }

    /// NaN and infinities have no JSON form and would reach the model as missing values.
    pub fn check_finite(&self) -> Result<(), RiskError> {
        match self.numeric_values().into_iter().find(|(_, v)| !v.is_finite()) {
            Some((column, value)) => Err(RiskError::schema_mismatch(
                column,
                format!("value {value} is not a finite number"),
            )),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_stage_label_parses_back() {
        for stage in CropStage::ALL {
            assert_eq!(stage.label().parse::<CropStage>().unwrap(), stage);
        }
    }

    #[test]
    fn unknown_stage_is_a_schema_mismatch() {
        let err = "Unknown".parse::<CropStage>().unwrap_err();
        assert!(matches!(
            err,
            RiskError::SchemaMismatch { ref field, .. } if field == "CropStage"
        ));
    }

    #[test]
    fn stage_labels_are_case_sensitive() {
        assert!("flowering".parse::<CropStage>().is_err());
        assert!("Berry development".parse::<CropStage>().is_err());
        assert!(" Ripening".parse::<CropStage>().is_err());
    }

    #[test]
    fn record_serializes_with_training_column_names_in_order() {
        let record = FeatureRecord {
            temp_avg: 22.0,
            humidity: 70.0,
            rainfall: 5.0,
            wind_speed: 2.0,
            temp_avg_lag14: 22.0,
            humidity_lag14: 70.0,
            rainfall_lag14: 5.0,
            wind_speed_lag14: 2.0,
            crop_stage: CropStage::BerryDevelopment,
        };

        let text = serde_json::to_string(&record).unwrap();
        let mut last = 0;
        for column in FeatureRecord::NUMERIC_COLUMNS
            .iter()
            .chain(std::iter::once(&FeatureRecord::CATEGORICAL_COLUMN))
        {
            let pos = text
                .find(&format!("\"{column}\":"))
                .unwrap_or_else(|| panic!("missing column {column}"));
            assert!(pos >= last, "column {column} out of order");
            last = pos;
        }

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["CropStage"], json!("Berry Development"));
        assert_eq!(value.as_object().unwrap().len(), 9);
    }

    #[test]
    fn non_finite_values_name_their_column() {
        let mut record = FeatureRecord {
            temp_avg: 22.0,
            humidity: 70.0,
            rainfall: 5.0,
            wind_speed: 2.0,
            temp_avg_lag14: 22.0,
            humidity_lag14: 70.0,
            rainfall_lag14: 5.0,
            wind_speed_lag14: 2.0,
            crop_stage: CropStage::Ripening,
        };
        record.check_finite().unwrap();

        record.wind_speed = f64::NEG_INFINITY;
        let err = record.check_finite().unwrap_err();
        assert_eq!(
            err,
            RiskError::schema_mismatch("WindSpeed(m/s)", "value -inf is not a finite number")
        );

        record.humidity = f64::NAN;
        let err = record.check_finite().unwrap_err();
        assert!(matches!(
            err,
            RiskError::SchemaMismatch { ref field, .. } if field == "Humidity(%)"
        ));
    }

    #[test]
    fn default_reading_matches_form_defaults() {
        let reading = WeatherReading::default();
        assert_eq!(reading.avg_temperature, 22.0);
        assert_eq!(reading.humidity_percent, 70.0);
        assert_eq!(reading.rainfall_mm, 5.0);
        assert_eq!(reading.wind_speed_mps, 2.0);
    }
}
