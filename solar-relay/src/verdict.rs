//! Audit prompts and model-output repair
//!
//! The model is asked for JSON but its text is not trusted to be clean: it may
//! arrive fenced in markdown, with snake_case keys, with confidence outside
//! the percent range, or with a bounding box on Gemini's native 0-1000 scale.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use solar_common::{BoundingBox, RoofType, VerificationResult};

use crate::upstream::UpstreamError;

/// System-level task description sent with every request
pub const SYSTEM_INSTRUCTION: &str = "\
You are an expert AI auditor for the PM Surya Ghar rooftop solar subsidy scheme.
Analyze satellite rooftop imagery and determine whether solar PV panels are installed.
Return confidence, roof type, bounding box, and reasoning.
Respond with a single JSON object and nothing else, using exactly these keys:
  solarInstalled (boolean),
  confidence (number from 0 to 100),
  roofType (one of \"Flat\", \"Sloped\", \"Other\", \"Unknown\"),
  boundingBox (object with xmin, ymin, xmax, ymax normalized to 0-1, or null when no panels are visible),
  reasoning (short explanation of the visual evidence).";

/// Per-request instruction sent next to the image
pub const ANALYZE_PROMPT: &str = "Analyze rooftop for solar PV panels and return JSON.";

/// Keys arrive here already camelCased by `rename_camel_keys`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelVerdict {
    #[serde(alias = "solarPanelsDetected")]
    solar_installed: bool,
    confidence: Option<f64>,
    #[serde(default)]
    roof_type: Option<String>,
    #[serde(default, alias = "box2d")]
    bounding_box: Option<Value>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Parse and repair the model's text into a verification result
///
/// `timestamp` is the generation time attached by the relay.
pub fn parse_verdict(
    text: &str,
    timestamp: DateTime<Utc>,
) -> Result<VerificationResult, UpstreamError> {
    let json = extract_json_object(text)
        .ok_or_else(|| UpstreamError::Parse("no JSON object in model output".to_string()))?;

    let raw = rename_camel_keys(
        serde_json::from_str::<Value>(json)
            .map_err(|e| UpstreamError::Parse(format!("invalid JSON from model: {}", e)))?,
    );
    let verdict: ModelVerdict = serde_json::from_value(raw)
        .map_err(|e| UpstreamError::Parse(format!("unexpected verdict shape: {}", e)))?;

    let confidence = verdict
        .confidence
        .ok_or_else(|| UpstreamError::Parse("confidence missing".to_string()))?;

    Ok(VerificationResult {
        solar_installed: verdict.solar_installed,
        confidence: normalize_confidence(confidence)?,
        roof_type: RoofType::from_label(verdict.roof_type.as_deref().unwrap_or("")),
        bounding_box: verdict.bounding_box.as_ref().and_then(normalize_bounding_box),
        reasoning: verdict.reasoning.unwrap_or_default().trim().to_string(),
        timestamp,
        fallback: false,
    })
}

/// Locate the outermost JSON object, skipping markdown fences and chatter
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Map snake_case top-level keys onto the camelCase names
fn rename_camel_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (snake_to_camel(&key), value))
                .collect(),
        ),
        other => other,
    }
}

fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for ch in key.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Percent clamped to [0, 100]
///
/// The prompt asks for a percent, so small values such as `1` or `0.5` are
/// taken as low confidence and never rescaled.
pub fn normalize_confidence(confidence: f64) -> Result<f64, UpstreamError> {
    if !confidence.is_finite() {
        return Err(UpstreamError::Parse(format!(
            "confidence is not a number: {}",
            confidence
        )));
    }
    Ok(confidence.clamp(0.0, 100.0))
}

/// Accept `{xmin, ymin, xmax, ymax}` or `[ymin, xmin, ymax, xmax]`
///
/// Boxes on a 0-1000 scale are divided down; inverted corners are swapped.
/// Anything else is dropped.
pub fn normalize_bounding_box(value: &Value) -> Option<BoundingBox> {
    let [xmin, ymin, xmax, ymax] = match value {
        Value::Object(map) => {
            let get = |key: &str| map.get(key).and_then(Value::as_f64);
            [get("xmin")?, get("ymin")?, get("xmax")?, get("ymax")?]
        }
        Value::Array(items) if items.len() == 4 => {
            let nums: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
            if nums.len() != 4 {
                return None;
            }
            [nums[1], nums[0], nums[3], nums[2]]
        }
        _ => return None,
    };

    let coords = [xmin, ymin, xmax, ymax];
    if coords.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return None;
    }

    let max = coords.iter().cloned().fold(0.0_f64, f64::max);
    let scale = if max <= 1.0 {
        1.0
    } else if max <= 1000.0 {
        1000.0
    } else {
        return None;
    };

    let (x0, x1) = (xmin / scale, xmax / scale);
    let (y0, y1) = (ymin / scale, ymax / scale);

    Some(BoundingBox {
        xmin: x0.min(x1),
        ymin: y0.min(y1),
        xmax: x0.max(x1),
        ymax: y0.max(y1),
    })
}
