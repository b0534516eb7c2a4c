//! Application services - the pipeline wired over the ports
//!
//! - **Ingestor**: driver frames in, corrected readings appended to history
//! - **QueryService**: current reading and recent history out

pub mod ingest;
pub mod query;

pub use ingest::{wall_clock_ms, IngestStats, Ingestor};
pub use query::QueryService;
