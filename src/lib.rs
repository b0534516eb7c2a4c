//! CO2 Monitor Library
//!
//! This library ingests telemetry frames from a CO2 / temperature / humidity
//! sensor, corrects humidity for the sensor's temperature bias, keeps the
//! last 100 readings in memory and serves them over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                                 │
//! │  - RawReading / Reading entities                                 │
//! │  - HumidityCorrection service                                    │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Ports (Traits)                               │
//! │  - DriverPort: frames pushed from the device                     │
//! │  - HistoryPort: append / snapshot / latest                       │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters                                     │
//! │  - SerialDriver: serial port reader thread                       │
//! │  - MemoryHistory: copy-on-write ring of 100 readings             │
//! │  - http: /current and /history on axum                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Data Flow
//!
//! ```text
//! SerialDriver ─frame─▶ Ingestor ─▶ decode_frame ─▶ HumidityCorrection
//!                                                         │
//!                      http ◀─ QueryService ◀─ MemoryHistory
//! ```

pub mod protocol;

pub use protocol::{decode_frame, NotFound, ReadingJson, FRAME_PREFIX};

/// Domain layer - pure logic
pub mod domain;

/// Ports - traits defining boundaries
pub mod ports;

/// Adapters - concrete implementations
pub mod adapters;

/// Services - the pipeline over the ports
pub mod services;

pub mod config;

// Re-export key domain types
pub use domain::{HumidityCorrection, RawReading, Reading};

// Re-export key port traits
pub use ports::{DriverPort, FrameHandler, HistoryPort, HISTORY_CAPACITY};

// Re-export adapters
pub use adapters::{MemoryHistory, SerialDriver};

pub use config::{Command, Config, ConfigError, DotenvStatus};
pub use services::{IngestStats, Ingestor, QueryService};
