//! Sequential batch verification
//!
//! Items run strictly one at a time in list order. Progress goes out on the
//! event bus as each item finishes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::Serialize;
use solar_common::events::{progress_percent, AuditEvent, EventBus};
use solar_common::{AnalysisOutcome, BatchItem, BatchStatus};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::client::Analyzer;

/// Payload sent for every item unless per-item images are configured
pub const PLACEHOLDER_PAYLOAD: &str = "BATCH_PLACEHOLDER";

/// Extensions tried, in order, for `<images_dir>/<id>.<ext>`
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// The five demonstration sites
pub fn seed_items() -> Vec<BatchItem> {
    vec![
        BatchItem::new("BATCH-001", 28.6139, 77.2090),
        BatchItem::new("BATCH-002", 19.0760, 72.8777),
        BatchItem::new("BATCH-003", 12.9716, 77.5946),
        BatchItem::new("BATCH-004", 13.0827, 80.2707),
        BatchItem::new("BATCH-005", 22.5726, 88.3639),
    ]
}

/// Where each item's image comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PayloadSource {
    /// The same placeholder string for every item; no real imagery
    #[default]
    Placeholder,
    /// `<dir>/<item id>.<ext>`; an item with no file fails
    ImagesDir(PathBuf),
}

impl PayloadSource {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, PayloadSource::Placeholder)
    }

    /// Base64 payload for one item, or the reason there is none
    pub fn payload_for(&self, item: &BatchItem) -> Result<String, String> {
        match self {
            PayloadSource::Placeholder => Ok(PLACEHOLDER_PAYLOAD.to_string()),
            PayloadSource::ImagesDir(dir) => {
                let path = find_item_image(dir, &item.id)
                    .ok_or_else(|| format!("no image for {} in {}", item.id, dir.display()))?;
                let bytes = std::fs::read(&path)
                    .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
                Ok(STANDARD.encode(bytes))
            }
        }
    }
}

fn find_item_image(dir: &Path, id: &str) -> Option<PathBuf> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", id, ext)))
        .find(|path| path.is_file())
}

/// Counts from one finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchSummary {
    pub completed: usize,
    pub failed: usize,
    /// Completed items whose verdict was the relay's canned fallback
    pub degraded: usize,
}

/// A batch item list and its run state
#[derive(Debug)]
pub struct BatchSession {
    items: Vec<BatchItem>,
    source: PayloadSource,
    progress: u8,
    events: EventBus,
}

impl BatchSession {
    pub fn new(items: Vec<BatchItem>, source: PayloadSource, events: EventBus) -> Self {
        Self {
            items,
            source,
            progress: 0,
            events,
        }
    }

    /// Session over the five seed items
    pub fn seeded(source: PayloadSource, events: EventBus) -> Self {
        Self::new(seed_items(), source, events)
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    /// Percent of items finished in the current or last run
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Take the item list, releasing the event bus
    pub fn into_items(self) -> Vec<BatchItem> {
        self.items
    }

    /// Run every item once, in order
    ///
    /// All items are reset to Pending first. Failures are recorded on the
    /// item and the run continues.
    pub async fn run(&mut self, analyzer: &dyn Analyzer) -> BatchSummary {
        for item in &mut self.items {
            item.reset();
        }
        self.progress = 0;

        let total = self.items.len();
        let placeholder = self.source.is_placeholder();
        if placeholder {
            warn!(
                payload = PLACEHOLDER_PAYLOAD,
                "Batch run uses the shared placeholder payload; results do not reflect per-site imagery"
            );
        }
        info!(total, "Batch run started");
        self.events.emit_lossy(AuditEvent::BatchStarted {
            total,
            placeholder_payload: placeholder,
            timestamp: Utc::now(),
        });

        let mut summary = BatchSummary::default();
        for index in 0..total {
            let item_id = self.items[index].id.clone();
            self.items[index].status = BatchStatus::Processing;
            self.events.emit_lossy(AuditEvent::BatchItemStarted {
                index,
                item_id: item_id.clone(),
                timestamp: Utc::now(),
            });

            let outcome = match self.source.payload_for(&self.items[index]) {
                Ok(payload) => analyzer.analyze(&payload).await,
                Err(reason) => AnalysisOutcome::failed(reason),
            };

            let degraded = outcome.is_degraded();
            let item = &mut self.items[index];
            match outcome {
                AnalysisOutcome::Failed { reason } => {
                    warn!(item = %item_id, reason = %reason, "Batch item failed");
                    item.status = BatchStatus::Failed;
                    item.failure = Some(reason);
                    summary.failed += 1;
                }
                outcome => {
                    item.status = BatchStatus::Completed;
                    item.result = outcome.into_result();
                    summary.completed += 1;
                    if degraded {
                        summary.degraded += 1;
                    }
                }
            }
            let status = item.status;

            self.progress = progress_percent(index + 1, total);
            self.events.emit_lossy(AuditEvent::BatchItemFinished {
                index,
                item_id,
                status,
                degraded,
                timestamp: Utc::now(),
            });
            self.events.emit_lossy(AuditEvent::BatchProgress {
                completed: index + 1,
                total,
                percent: self.progress,
            });
        }

        info!(
            completed = summary.completed,
            failed = summary.failed,
            degraded = summary.degraded,
            "Batch run finished"
        );
        self.events.emit_lossy(AuditEvent::BatchCompleted {
            completed: summary.completed,
            failed: summary.failed,
            degraded: summary.degraded,
            timestamp: Utc::now(),
        });

        summary
    }
}
