//! Single-image verification session
//!
//! Holds one image, the reviewer's location text and the last usable
//! outcome. A failed analysis leaves all of it as it was.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solar_common::{AnalysisOutcome, BoundingBox, Coordinates, RoofType, VerificationResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::Analyzer;
use crate::error::{Result, ReviewError};

/// Default export file name
pub const AUDIT_FILE_NAME: &str = "solar_verification_audit.json";

#[derive(Debug, Clone)]
struct LoadedImage {
    /// File path or "data URL", for logs
    source: String,
    /// Base64 payload, possibly still carrying a data-URL prefix
    data: String,
}

/// Exported audit record for one verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(with = "solar_common::time::epoch_millis")]
    pub timestamp: DateTime<Utc>,
    pub solar_installed: bool,
    pub confidence: f64,
    pub roof_type: RoofType,
    pub reasoning: String,
    pub bounding_box: Option<BoundingBox>,
    /// Marks a record built from the relay's canned verdict
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl AuditRecord {
    pub fn new(location: Option<Coordinates>, result: &VerificationResult) -> Self {
        Self {
            latitude: location.map(|c| c.latitude),
            longitude: location.map(|c| c.longitude),
            timestamp: result.timestamp,
            solar_installed: result.solar_installed,
            confidence: result.confidence,
            roof_type: result.roof_type,
            reasoning: result.reasoning.clone(),
            bounding_box: result.bounding_box,
            fallback: result.fallback,
        }
    }
}

/// One reviewer's single-image workflow
#[derive(Debug, Default)]
pub struct SingleVerification {
    image: Option<LoadedImage>,
    latitude: String,
    longitude: String,
    outcome: Option<AnalysisOutcome>,
    loading: Arc<AtomicBool>,
}

impl SingleVerification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and base64-encode an image file; clears any previous result
    pub fn load_image_file(&mut self, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path).map_err(|source| ReviewError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), bytes = bytes.len(), "Loaded image");
        self.set_image(path.display().to_string(), STANDARD.encode(bytes));
        Ok(())
    }

    /// Use a data URL or bare base64 string; clears any previous result
    pub fn load_data_url(&mut self, data_url: impl Into<String>) {
        self.set_image("data URL".to_string(), data_url.into());
    }

    fn set_image(&mut self, source: String, data: String) {
        self.image = Some(LoadedImage { source, data });
        self.outcome = None;
    }

    /// Free-text latitude and longitude, validated only at export
    pub fn set_location(&mut self, latitude: impl Into<String>, longitude: impl Into<String>) {
        self.latitude = latitude.into();
        self.longitude = longitude.into();
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Shared view of the loading flag for progress indicators
    pub fn loading_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.loading)
    }

    pub fn result(&self) -> Option<&VerificationResult> {
        self.outcome.as_ref().and_then(AnalysisOutcome::result)
    }

    /// Analyze the loaded image
    ///
    /// Verified and degraded outcomes replace the stored one. A failed
    /// analysis returns `AnalysisFailed` and changes nothing.
    pub async fn analyze(&mut self, analyzer: &dyn Analyzer) -> Result<&AnalysisOutcome> {
        let Some(image) = &self.image else {
            return Err(ReviewError::NoImage);
        };

        info!(source = %image.source, "Analyzing image");
        self.loading.store(true, Ordering::SeqCst);
        let outcome = analyzer.analyze(&image.data).await;
        self.loading.store(false, Ordering::SeqCst);

        match outcome {
            AnalysisOutcome::Failed { reason } => {
                warn!(reason = %reason, "Analysis failed");
                Err(ReviewError::AnalysisFailed(reason))
            }
            outcome => {
                let stored: &AnalysisOutcome = self.outcome.insert(outcome);
                Ok(stored)
            }
        }
    }

    /// Compose the audit record from the location fields and stored result
    pub fn audit_record(&self) -> Result<AuditRecord> {
        let result = self.result().ok_or(ReviewError::NoResult)?;
        let location = Coordinates::parse(&self.latitude, &self.longitude)?;
        Ok(AuditRecord::new(location, result))
    }

    /// Write the audit record as pretty-printed JSON
    pub fn export_audit(&self, path: &Path) -> Result<PathBuf> {
        let record = self.audit_record()?;
        let json = serde_json::to_string_pretty(&record)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Wrote verification audit");
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use solar_common::time::from_epoch_millis;
    use std::sync::Mutex;

    struct Scripted {
        outcome: AnalysisOutcome,
        seen: Mutex<Vec<String>>,
        loading: Mutex<Option<Arc<AtomicBool>>>,
        loading_during_call: AtomicBool,
    }

    impl Scripted {
        fn new(outcome: AnalysisOutcome) -> Self {
            Self {
                outcome,
                seen: Mutex::new(Vec::new()),
                loading: Mutex::new(None),
                loading_during_call: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl Analyzer for Scripted {
        async fn analyze(&self, image_base64: &str) -> AnalysisOutcome {
            self.seen.lock().unwrap().push(image_base64.to_string());
            if let Some(flag) = self.loading.lock().unwrap().as_ref() {
                self.loading_during_call
                    .store(flag.load(Ordering::SeqCst), Ordering::SeqCst);
            }
            self.outcome.clone()
        }
    }

    fn verdict(fallback: bool) -> VerificationResult {
        VerificationResult {
            solar_installed: true,
            confidence: 91.5,
            roof_type: RoofType::Flat,
            bounding_box: Some(BoundingBox {
                xmin: 0.25,
                ymin: 0.25,
                xmax: 0.75,
                ymax: 0.5,
            }),
            reasoning: "Two panel rows".to_string(),
            timestamp: from_epoch_millis(1_730_000_000_000).unwrap(),
            fallback,
        }
    }

    #[tokio::test]
    async fn test_analyze_without_image_sends_nothing() {
        let analyzer = Scripted::new(AnalysisOutcome::Verified(verdict(false)));
        let mut session = SingleVerification::new();

        let err = session.analyze(&analyzer).await.unwrap_err();
        assert!(matches!(err, ReviewError::NoImage));
        assert!(analyzer.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_loading_flag_set_during_call() {
        let analyzer = Scripted::new(AnalysisOutcome::Verified(verdict(false)));
        let mut session = SingleVerification::new();
        session.load_data_url("data:image/png;base64,AAAA");
        *analyzer.loading.lock().unwrap() = Some(session.loading_flag());

        session.analyze(&analyzer).await.unwrap();

        assert!(analyzer.loading_during_call.load(Ordering::SeqCst));
        assert!(!session.is_loading());
        assert_eq!(analyzer.seen.lock().unwrap()[0], "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_result() {
        let mut session = SingleVerification::new();
        session.load_data_url("AAAA");
        session
            .analyze(&Scripted::new(AnalysisOutcome::Verified(verdict(false))))
            .await
            .unwrap();

        let err = session
            .analyze(&Scripted::new(AnalysisOutcome::failed("relay returned 502")))
            .await
            .unwrap_err();

        assert!(matches!(err, ReviewError::AnalysisFailed(ref reason) if reason.contains("502")));
        assert_eq!(session.result(), Some(&verdict(false)));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_new_image_clears_result() {
        let mut session = SingleVerification::new();
        session.load_data_url("AAAA");
        session
            .analyze(&Scripted::new(AnalysisOutcome::Verified(verdict(false))))
            .await
            .unwrap();
        assert!(session.result().is_some());

        session.load_data_url("BBBB");
        assert!(session.result().is_none());
        assert!(matches!(session.audit_record(), Err(ReviewError::NoResult)));
    }

    #[tokio::test]
    async fn test_degraded_outcome_is_kept_and_marked() {
        let mut session = SingleVerification::new();
        session.load_data_url("AAAA");
        let outcome = session
            .analyze(&Scripted::new(AnalysisOutcome::from_relay_result(verdict(true))))
            .await
            .unwrap();
        assert!(outcome.is_degraded());

        let record = session.audit_record().unwrap();
        assert!(record.fallback);
    }

    #[tokio::test]
    async fn test_audit_record_round_trips() {
        let mut session = SingleVerification::new();
        session.load_data_url("AAAA");
        session.set_location(" 28.6139 ", "77.2090");
        session
            .analyze(&Scripted::new(AnalysisOutcome::Verified(verdict(false))))
            .await
            .unwrap();

        let record = session.audit_record().unwrap();
        assert_eq!(record.latitude, Some(28.6139));
        assert_eq!(record.longitude, Some(77.2090));

        let json = serde_json::to_string_pretty(&record).unwrap();
        let parsed: AuditRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["timestamp"], 1_730_000_000_000_i64);
        assert_eq!(value["roofType"], "Flat");
        assert!(value.get("fallback").is_none());
    }

    #[tokio::test]
    async fn test_blank_location_exports_null() {
        let mut session = SingleVerification::new();
        session.load_data_url("AAAA");
        session
            .analyze(&Scripted::new(AnalysisOutcome::Verified(verdict(false))))
            .await
            .unwrap();

        let value = serde_json::to_value(session.audit_record().unwrap()).unwrap();
        assert!(value["latitude"].is_null());
        assert!(value["longitude"].is_null());
    }

    #[tokio::test]
    async fn test_malformed_location_is_rejected_at_export() {
        let mut session = SingleVerification::new();
        session.load_data_url("AAAA");
        session.set_location("north", "77.2");
        session
            .analyze(&Scripted::new(AnalysisOutcome::Verified(verdict(false))))
            .await
            .unwrap();

        assert!(matches!(
            session.audit_record(),
            Err(ReviewError::Common(solar_common::Error::InvalidInput(_)))
        ));
    }

    #[test]
    fn test_missing_image_file() {
        let mut session = SingleVerification::new();
        let err = session
            .load_image_file(Path::new("/nonexistent/roof.jpg"))
            .unwrap_err();
        assert!(matches!(err, ReviewError::ImageRead { .. }));
        assert!(session.image.is_none());
    }
}
