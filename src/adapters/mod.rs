//! Adapters - concrete implementations of ports
//!
//! Adapters connect the pipeline to the outside world by implementing
//! the port traits or exposing services over a transport.
//!
//! # Available Adapters
//!
//! - **memory_history**: copy-on-write in-memory history
//! - **serial_driver**: UD-CO2S style sensor over a serial port
//! - **http**: JSON query endpoints on axum

pub mod http;
pub mod memory_history;
pub mod serial_driver;

pub use memory_history::MemoryHistory;
pub use serial_driver::SerialDriver;
