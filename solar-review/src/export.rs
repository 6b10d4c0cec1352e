//! Batch CSV export

use solar_common::time::to_epoch_millis;
use solar_common::BatchItem;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;

/// Default export file name
pub const CSV_FILE_NAME: &str = "batch_verification_audit.csv";

pub const CSV_HEADERS: [&str; 8] = [
    "Batch ID",
    "Latitude",
    "Longitude",
    "Status",
    "Solar Installed",
    "Confidence",
    "Roof Type",
    "Timestamp",
];

/// One CSV row; result columns are empty when the item has none
pub fn csv_row(item: &BatchItem) -> [String; 8] {
    let result = item.result.as_ref();
    [
        item.id.clone(),
        item.lat.to_string(),
        item.lng.to_string(),
        item.status.label().to_string(),
        result.map(|r| r.solar_installed.to_string()).unwrap_or_default(),
        result.map(|r| r.confidence.to_string()).unwrap_or_default(),
        result.map(|r| r.roof_type.label().to_string()).unwrap_or_default(),
        result
            .map(|r| to_epoch_millis(&r.timestamp).to_string())
            .unwrap_or_default(),
    ]
}

/// Header plus one row per item, `\n` terminated
pub fn write_batch_csv<W: Write>(items: &[BatchItem], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(CSV_HEADERS)?;
    for item in items {
        csv_writer.write_record(csv_row(item))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the batch CSV to `path`
pub fn export_batch_csv(items: &[BatchItem], path: &Path) -> Result<PathBuf> {
    let file = std::fs::File::create(path)?;
    write_batch_csv(items, file)?;
    info!(path = %path.display(), rows = items.len(), "Wrote batch audit");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solar_common::time::from_epoch_millis;
    use solar_common::{BatchStatus, RoofType, VerificationResult};

    fn items() -> Vec<BatchItem> {
        let mut done = BatchItem::new("BATCH-001", 28.6139, 77.209);
        done.status = BatchStatus::Completed;
        done.result = Some(VerificationResult {
            solar_installed: true,
            confidence: 89.6,
            roof_type: RoofType::Other,
            bounding_box: None,
            reasoning: "Arrays, with commas".to_string(),
            timestamp: from_epoch_millis(1_730_000_000_000).unwrap(),
            fallback: false,
        });

        let mut failed = BatchItem::new("BATCH-002", 19.076, 72.8777);
        failed.status = BatchStatus::Failed;
        failed.failure = Some("relay unreachable".to_string());

        vec![done, failed, BatchItem::new("BATCH-003", 12.9716, 77.5946)]
    }

    fn render(items: &[BatchItem]) -> String {
        let mut buf = Vec::new();
        write_batch_csv(items, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let csv = render(&items());
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "Batch ID,Latitude,Longitude,Status,Solar Installed,Confidence,Roof Type,Timestamp"
        );
        assert_eq!(lines[1], "BATCH-001,28.6139,77.209,Completed,true,89.6,Other,1730000000000");
        assert_eq!(lines[2], "BATCH-002,19.076,72.8777,Failed,,,,");
        assert_eq!(lines[3], "BATCH-003,12.9716,77.5946,Pending,,,,");
        assert!(!csv.contains('\r'));
    }

    #[test]
    fn test_empty_batch_is_header_only() {
        assert_eq!(render(&[]).lines().count(), 1);
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CSV_FILE_NAME);

        export_batch_csv(&items(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render(&items()));
    }
}
