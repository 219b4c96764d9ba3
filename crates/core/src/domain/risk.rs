use crate::error::RiskError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Class codes are fixed by training: 0 = low, 1 = medium, 2 = high.
    pub fn from_class(class: i64) -> Result<Self, RiskError> {
        match class {
            0 => Ok(RiskTier::Low),
            1 => Ok(RiskTier::Medium),
            2 => Ok(RiskTier::High),
            other => Err(RiskError::UndefinedClass { class: other }),
        }
    }

    pub fn class_code(self) -> i64 {
        match self {
            RiskTier::Low => 0,
            RiskTier::Medium => 1,
            RiskTier::High => 2,
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            RiskTier::Low => "LOW RISK",
            RiskTier::Medium => "MEDIUM RISK DETECTED",
            RiskTier::High => "HIGH RISK DETECTED",
        }
    }

    pub fn advisory(self) -> &'static str {
        match self {
            RiskTier::Low => {
                "Status: Conditions are currently stable. Continue routine farm maintenance."
            }
            RiskTier::Medium => {
                "Caution: Weather conditions are becoming favorable for disease. Monitor closely."
            }
            RiskTier::High => {
                "Action Required: Immediate monitoring and preventive spraying recommended."
            }
        }
    }

    /// Traffic-light colour.
    pub fn indicator(self) -> &'static str {
        match self {
            RiskTier::Low => "green",
            RiskTier::Medium => "yellow",
            RiskTier::High => "red",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskVerdict {
    pub tier: RiskTier,
    /// 0..=100
    pub confidence_percent: f64,
}

impl RiskVerdict {
    pub fn summary(&self) -> String {
        format!(
            "{} ({:.1}% Confidence)",
            self.tier.headline(),
            self.confidence_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_codes_map_to_fixed_tiers() {
        assert_eq!(RiskTier::from_class(0).unwrap(), RiskTier::Low);
        assert_eq!(RiskTier::from_class(1).unwrap(), RiskTier::Medium);
        assert_eq!(RiskTier::from_class(2).unwrap(), RiskTier::High);
        for tier in [RiskTier::Low, RiskTier::Medium, RiskTier::High] {
            assert_eq!(RiskTier::from_class(tier.class_code()).unwrap(), tier);
        }
    }

    #[test]
    fn unseen_class_codes_are_errors_not_low() {
        assert_eq!(
            RiskTier::from_class(3),
            Err(RiskError::UndefinedClass { class: 3 })
        );
        assert_eq!(
            RiskTier::from_class(-1),
            Err(RiskError::UndefinedClass { class: -1 })
        );
    }

    #[test]
    fn summary_formats_confidence_to_one_decimal() {
        let verdict = RiskVerdict {
            tier: RiskTier::High,
            confidence_percent: 80.0,
        };
        assert_eq!(verdict.summary(), "HIGH RISK DETECTED (80.0% Confidence)");

        let verdict = RiskVerdict {
            tier: RiskTier::Low,
            confidence_percent: 66.666,
        };
        assert_eq!(verdict.summary(), "LOW RISK (66.7% Confidence)");
    }

    #[test]
    fn tier_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&RiskTier::Medium).unwrap(),
            "\"MEDIUM\""
        );
    }
}
