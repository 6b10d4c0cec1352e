//! # Solar Audit Common Library
//!
//! Shared code for the relay service and the review client:
//! - Verification data model (results, bounding boxes, roof types, batch items)
//! - Tagged analysis outcomes
//! - Audit event bus
//! - TOML configuration loading and tracing setup
//! - Timestamp wire helpers

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod outcome;
pub mod time;

pub use error::{Error, Result};
pub use models::{BatchItem, BatchStatus, BoundingBox, Coordinates, RoofType, VerificationResult};
pub use outcome::AnalysisOutcome;
