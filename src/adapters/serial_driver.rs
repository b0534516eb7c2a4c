//! Serial device driver adapter
//!
//! This adapter implements the DriverPort trait for a UD-CO2S style sensor
//! attached as a USB CDC serial port. The device streams one text frame per
//! line after receiving the start command.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use serialport::SerialPort;

use crate::ports::driver::{DriverError, DriverPort, FrameHandler};

/// Default line speed of the sensor
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Read timeout; the reader checks for `close` at least this often
const READ_TIMEOUT: Duration = Duration::from_millis(5000);

/// Starts periodic measurement
const START_COMMAND: &[u8] = b"STA\r\n";

/// Stops periodic measurement
const STOP_COMMAND: &[u8] = b"STP\r\n";

/// Upper bound on a buffered line without a newline
const MAX_LINE_LEN: usize = 1024;

/// USB descriptor strings that identify the sensor
const SENSOR_MARKERS: [&str; 2] = ["UD-CO2S", "I-O DATA"];

/// Whether a USB port's descriptor strings name a UD-CO2S sensor
pub fn looks_like_sensor(manufacturer: Option<&str>, product: Option<&str>) -> bool {
    [manufacturer, product].into_iter().flatten().any(|text| {
        let text = text.to_ascii_uppercase();
        SENSOR_MARKERS.iter().any(|marker| text.contains(marker))
    })
}

/// An open streaming session
struct Session {
    /// Control handle; the reader thread owns a clone
    port: Box<dyn SerialPort>,
    /// Set by `close`, polled by the reader thread
    stop: Arc<AtomicBool>,
}

/// Serial port driver
///
/// One reader thread per open session. Frames are handed to the registered
/// handler on that thread.
pub struct SerialDriver {
    baud_rate: u32,
    /// Shared with the reader thread so the handler can be swapped or cleared
    handler: Arc<Mutex<Option<FrameHandler>>>,
    session: Option<Session>,
}

impl SerialDriver {
    /// Create a driver for the given line speed
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            handler: Arc::new(Mutex::new(None)),
            session: None,
        }
    }

    /// Whether a session is currently streaming
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    fn start(&self, device_path: &str) -> Result<Session, DriverError> {
        if device_path.is_empty() || device_path.contains('\0') {
            return Err(DriverError::InvalidPath(device_path.to_string()));
        }

        let mut port = serialport::new(device_path, self.baud_rate)
            .timeout(READ_TIMEOUT)
            .flow_control(serialport::FlowControl::None)
            .open()?;

        port.write_all(START_COMMAND)?;
        port.flush()?;

        let reader_port = port.try_clone()?;
        let stop = Arc::new(AtomicBool::new(false));

        let handler = Arc::clone(&self.handler);
        let reader_stop = Arc::clone(&stop);
        let name = device_path.to_string();

        thread::Builder::new()
            .name("serial-reader".into())
            .spawn(move || read_frames(reader_port, handler, reader_stop, name))?;

        Ok(Session { port, stop })
    }

    fn stop_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop.store(true, Ordering::Release);
            if let Err(e) = session.port.write_all(STOP_COMMAND) {
                debug!("Stop command not delivered: {}", e);
            }
        }
    }
}

impl Default for SerialDriver {
    fn default() -> Self {
        Self::new(DEFAULT_BAUD_RATE)
    }
}

impl DriverPort for SerialDriver {
    fn register_callback(&mut self, handler: FrameHandler) {
        *self.handler.lock() = Some(handler);
    }

    fn open(&mut self, device_path: &str) {
        self.stop_session();

        match self.start(device_path) {
            Ok(session) => {
                info!("Streaming from {} at {} baud", device_path, self.baud_rate);
                self.session = Some(session);
            }
            Err(e) => {
                error!("Failed to open {:?}: {}", device_path, e);
            }
        }
    }

    fn close(&mut self) {
        if self.session.is_some() {
            info!("Closing serial driver");
        }
        self.stop_session();
        *self.handler.lock() = None;
    }
}

impl Drop for SerialDriver {
    fn drop(&mut self) {
        self.stop_session();
    }
}

/// Outcome of one bounded line read
#[derive(Debug, PartialEq, Eq)]
enum LineRead {
    /// `line` holds a complete line, newline included
    Line,
    /// The stream ended
    Eof,
    /// This many bytes arrived without a newline and were discarded
    Overflow(usize),
}

/// Append bytes to `line` up to and including the next newline.
///
/// Unlike `read_until`, gives up once `line` passes `MAX_LINE_LEN`, so a
/// device that never sends a newline cannot grow the buffer without bound.
/// On error (a read timeout included) bytes already taken stay in `line`.
fn read_line_bounded<R: BufRead>(reader: &mut R, line: &mut Vec<u8>) -> io::Result<LineRead> {
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(LineRead::Eof);
        }

        let (taken, complete) = match available.iter().position(|&b| b == b'\n') {
            Some(end) => (end + 1, true),
            None => (available.len(), false),
        };
        line.extend_from_slice(&available[..taken]);
        reader.consume(taken);

        if complete {
            return Ok(LineRead::Line);
        }
        if line.len() > MAX_LINE_LEN {
            let discarded = line.len();
            line.clear();
            return Ok(LineRead::Overflow(discarded));
        }
    }
}

/// Reader thread body: split the byte stream into lines and dispatch each
fn read_frames(
    port: Box<dyn SerialPort>,
    handler: Arc<Mutex<Option<FrameHandler>>>,
    stop: Arc<AtomicBool>,
    name: String,
) {
    let mut reader = BufReader::new(port);
    let mut line = Vec::with_capacity(64);

    while !stop.load(Ordering::Acquire) {
        match read_line_bounded(&mut reader, &mut line) {
            Ok(LineRead::Eof) => {
                warn!("{}: end of stream", name);
                break;
            }
            Ok(LineRead::Line) => {
                if stop.load(Ordering::Acquire) {
                    break;
                }
                // Clone out so `close` never waits on a running handler
                let current = handler.lock().clone();
                if let Some(current) = current {
                    current(Some(line.as_slice()));
                }
                line.clear();
            }
            Ok(LineRead::Overflow(discarded)) => {
                warn!("{}: discarding {} bytes without newline", name, discarded);
            }
            // Partial bytes stay in `line` and the next read completes it
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                error!("{}: error reading line: {}", name, e);
                break;
            }
        }
    }

    debug!("{}: reader stopped", name);
}
