//! Driver port - abstraction for the device that streams telemetry frames
//!
//! The driver owns the physical connection and pushes frames to a single
//! registered handler on a thread of its own choosing. It offers no error
//! channel: a failed `open` shows up only as a stream that never starts.

use std::sync::Arc;

/// Handler invoked once per frame.
///
/// `None` stands for a null frame from the driver and must be ignored.
pub type FrameHandler = Arc<dyn Fn(Option<&[u8]>) + Send + Sync>;

/// Error type for driver operations
///
/// Never crosses the port: adapters log these and go silent, matching the
/// boundary contract.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Device path is empty or contains a NUL byte
    #[error("invalid device path {0:?}")]
    InvalidPath(String),
    /// Failed to open or configure the serial port
    #[error("serial port: {0}")]
    Serial(#[from] serialport::Error),
    /// Failed to write to the device
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for a streaming telemetry device
///
/// # Example Implementation
///
/// ```ignore
/// struct ReplayDriver {
///     frames: Vec<Vec<u8>>,
///     handler: Option<FrameHandler>,
/// }
///
/// impl DriverPort for ReplayDriver {
///     fn register_callback(&mut self, handler: FrameHandler) {
///         self.handler = Some(handler);
///     }
///
///     fn open(&mut self, _device_path: &str) {
///         if let Some(handler) = &self.handler {
///             for frame in &self.frames {
///                 handler(Some(frame));
///             }
///         }
///     }
///
///     fn close(&mut self) {
///         self.handler = None;
///     }
/// }
/// ```
pub trait DriverPort {
    /// Register the frame handler, replacing any previous one
    fn register_callback(&mut self, handler: FrameHandler);

    /// Begin streaming from the device at `device_path`
    ///
    /// Failures are not returned.
    fn open(&mut self, device_path: &str);

    /// Stop streaming
    fn close(&mut self);
}
