//! HTTP API handlers for solar-relay

pub mod analyze;
pub mod buildinfo;
pub mod health;

pub use analyze::{analyze_routes, AnalyzeRequest};
pub use buildinfo::{get_build_info, BuildInfo};
pub use health::health_routes;
