//! solar-review library interface
//!
//! Reviewer-side workflows against the relay: single-image verification,
//! sequential batch runs, file exports and the overview dashboard.

pub mod batch;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod single;

pub use batch::{BatchSession, BatchSummary, PayloadSource};
pub use client::{Analyzer, RelayClient};
pub use error::{Result, ReviewError};
pub use single::{AuditRecord, SingleVerification};
