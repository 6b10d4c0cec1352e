//! Tagged analysis outcomes
//!
//! A canned relay verdict and a real one have the same shape on the wire. The
//! client keeps them apart so a guessed positive is never reported as a
//! verified installation.

use serde::{Deserialize, Serialize};

use crate::models::VerificationResult;

/// How one analysis request ended, as seen by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// The vision model produced this verdict
    Verified(VerificationResult),
    /// The relay could not reach a verdict and substituted its canned one
    Degraded {
        result: VerificationResult,
        reason: String,
    },
    /// No verdict at all
    Failed { reason: String },
}

impl AnalysisOutcome {
    /// Classify a relay response body by its fallback marker
    pub fn from_relay_result(result: VerificationResult) -> Self {
        if result.fallback {
            AnalysisOutcome::Degraded {
                result,
                reason: "relay substituted its fallback verdict".to_string(),
            }
        } else {
            AnalysisOutcome::Verified(result)
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        AnalysisOutcome::Failed {
            reason: reason.into(),
        }
    }

    /// The verdict carried by this outcome, canned or not
    pub fn result(&self) -> Option<&VerificationResult> {
        match self {
            AnalysisOutcome::Verified(result) => Some(result),
            AnalysisOutcome::Degraded { result, .. } => Some(result),
            AnalysisOutcome::Failed { .. } => None,
        }
    }

    pub fn into_result(self) -> Option<VerificationResult> {
        match self {
            AnalysisOutcome::Verified(result) => Some(result),
            AnalysisOutcome::Degraded { result, .. } => Some(result),
            AnalysisOutcome::Failed { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, AnalysisOutcome::Degraded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AnalysisOutcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoofType;
    use crate::time::now;

    fn result(fallback: bool) -> VerificationResult {
        VerificationResult {
            solar_installed: true,
            confidence: 89.6,
            roof_type: RoofType::Flat,
            bounding_box: None,
            reasoning: String::new(),
            timestamp: now(),
            fallback,
        }
    }

    #[test]
    fn test_fallback_marker_yields_degraded() {
        let outcome = AnalysisOutcome::from_relay_result(result(true));
        assert!(outcome.is_degraded());
        assert!(outcome.result().is_some());
    }

    #[test]
    fn test_plain_result_is_verified() {
        let outcome = AnalysisOutcome::from_relay_result(result(false));
        assert!(matches!(outcome, AnalysisOutcome::Verified(_)));
    }

    #[test]
    fn test_failed_has_no_result() {
        let outcome = AnalysisOutcome::failed("connection refused");
        assert!(outcome.is_failed());
        assert!(outcome.into_result().is_none());
    }
}
