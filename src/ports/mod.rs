//! Ports (interfaces) defining the boundaries of the application
//!
//! Ports are traits that define how the pipeline meets the outside world.
//! They keep decoding, correction and history independent of the serial
//! device and of the HTTP transport.
//!
//! - **DriverPort**: where telemetry frames come from (serial device, replay)
//! - **HistoryPort**: where corrected readings are kept and read back

pub mod driver;
pub mod storage;

pub use driver::{DriverError, DriverPort, FrameHandler};
pub use storage::{HistoryPort, HISTORY_CAPACITY};
