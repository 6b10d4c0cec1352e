//! Verification data model
//!
//! Wire names are camelCase to match what the relay has always served to the
//! browser dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Roof classification reported by the vision model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoofType {
    Flat,
    Sloped,
    Other,
    Unknown,
}

impl RoofType {
    /// Canonical label used on the wire and in exports
    pub fn label(&self) -> &'static str {
        match self {
            RoofType::Flat => "Flat",
            RoofType::Sloped => "Sloped",
            RoofType::Other => "Other",
            RoofType::Unknown => "Unknown",
        }
    }

    /// Map a free-text label onto one of the four roof types
    ///
    /// Model output is not constrained to the canonical labels, and the relay's
    /// fallback verdict uses "Flat / Industrial".
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase();
        if normalized.is_empty() || normalized == "unknown" {
            RoofType::Unknown
        } else if normalized.starts_with("flat") {
            RoofType::Flat
        } else if ["sloped", "pitched", "slanted", "gable", "hip"]
            .iter()
            .any(|prefix| normalized.starts_with(prefix))
        {
            RoofType::Sloped
        } else {
            RoofType::Other
        }
    }
}

impl From<String> for RoofType {
    fn from(label: String) -> Self {
        RoofType::from_label(&label)
    }
}

impl From<RoofType> for String {
    fn from(roof_type: RoofType) -> Self {
        roof_type.label().to_string()
    }
}

impl fmt::Display for RoofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Axis-aligned panel region, normalized to [0, 1] image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// True when every corner lies in [0, 1] and min <= max on both axes
    pub fn is_normalized(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        in_unit(self.xmin)
            && in_unit(self.ymin)
            && in_unit(self.xmax)
            && in_unit(self.ymax)
            && self.xmin <= self.xmax
            && self.ymin <= self.ymax
    }
}

/// Structured outcome of one image analysis
///
/// Produced once per analysis call and not mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub solar_installed: bool,
    /// Percent, 0-100
    pub confidence: f64,
    pub roof_type: RoofType,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(with = "crate::time::epoch_millis")]
    pub timestamp: DateTime<Utc>,
    /// Set by the relay when it substituted its canned verdict
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

/// Typed decimal-degree location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidInput(format!(
                "latitude out of range [-90, 90]: {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidInput(format!(
                "longitude out of range [-180, 180]: {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse a latitude/longitude pair typed by a reviewer
    ///
    /// Both blank means "no location". Exactly one blank is an error.
    pub fn parse(latitude: &str, longitude: &str) -> Result<Option<Self>> {
        let (lat, lng) = (latitude.trim(), longitude.trim());
        match (lat.is_empty(), lng.is_empty()) {
            (true, true) => Ok(None),
            (false, false) => {
                let latitude = parse_degrees("latitude", lat)?;
                let longitude = parse_degrees("longitude", lng)?;
                Self::new(latitude, longitude).map(Some)
            }
            (true, false) => Err(Error::InvalidInput(
                "longitude given without latitude".to_string(),
            )),
            (false, true) => Err(Error::InvalidInput(
                "latitude given without longitude".to_string(),
            )),
        }
    }
}

fn parse_degrees(field: &str, text: &str) -> Result<f64> {
    text.parse::<f64>().map_err(|_| {
        Error::InvalidInput(format!(
            "{} is not a decimal degree value: '{}'",
            field, text
        ))
    })
}

/// Batch item lifecycle
///
/// Pending -> Processing -> Completed | Failed, once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl BatchStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "Pending",
            BatchStatus::Processing => "Processing",
            BatchStatus::Completed => "Completed",
            BatchStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One rooftop location in a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub status: BatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<VerificationResult>,
    /// Why the item failed, when it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl BatchItem {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            status: BatchStatus::Pending,
            result: None,
            failure: None,
        }
    }

    /// Return to the initial Pending state, dropping any previous result
    pub fn reset(&mut self) {
        self.status = BatchStatus::Pending;
        self.result = None;
        self.failure = None;
    }
}
