//! Ingestion service - turns driver frames into stored readings
//!
//! Decode, correct, timestamp, append. Nothing is reported back to the
//! driver: rejected frames are counted and dropped, and a panic anywhere in
//! the pipeline is caught at the handler boundary.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, error};
use parking_lot::Mutex;

use crate::domain::{HumidityCorrection, Reading};
use crate::ports::driver::FrameHandler;
use crate::ports::storage::HistoryPort;
use crate::protocol::decode_frame;

/// Milliseconds since the Unix epoch
pub type Clock = fn() -> i64;

/// Wall clock used outside tests
pub fn wall_clock_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Frame counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Frames handed to the ingestor, null frames included
    pub frames_received: u32,
    /// Frames that became a stored reading
    pub readings_stored: u32,
    /// Frames dropped: null, other message class, malformed, or a panic
    /// while handling
    pub frames_dropped: u32,
}

/// Ingestion callback target
pub struct Ingestor {
    history: Arc<dyn HistoryPort>,
    correction: HumidityCorrection,
    clock: Clock,
    /// Serializes the handler body; drivers may call from several threads
    gate: Mutex<()>,
    frames_received: AtomicU32,
    readings_stored: AtomicU32,
    frames_dropped: AtomicU32,
}

impl Ingestor {
    /// Create an ingestor appending to `history` with the UD-CO2S correction
    pub fn new(history: Arc<dyn HistoryPort>) -> Self {
        Self {
            history,
            correction: HumidityCorrection::UD_CO2S,
            clock: wall_clock_ms,
            gate: Mutex::new(()),
            frames_received: AtomicU32::new(0),
            readings_stored: AtomicU32::new(0),
            frames_dropped: AtomicU32::new(0),
        }
    }

    /// Use a different humidity correction
    pub fn with_correction(mut self, correction: HumidityCorrection) -> Self {
        self.correction = correction;
        self
    }

    /// Use a different timestamp source
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Handle one frame, returning the reading that was stored, if any
    pub fn ingest(&self, frame: Option<&[u8]>) -> Option<Reading> {
        let _gate = self.gate.lock();
        self.frames_received.fetch_add(1, Ordering::Relaxed);

        let stored = frame.and_then(|bytes| self.process(bytes));
        match stored {
            Some(_) => self.readings_stored.fetch_add(1, Ordering::Relaxed),
            None => self.frames_dropped.fetch_add(1, Ordering::Relaxed),
        };
        stored
    }

    fn process(&self, bytes: &[u8]) -> Option<Reading> {
        let Some(raw) = decode_frame(bytes) else {
            debug!("Dropped frame: {:?}", String::from_utf8_lossy(bytes).trim());
            return None;
        };

        let (temperature_c, humidity_percent) = self
            .correction
            .correct(raw.humidity_percent, raw.raw_temperature_units);

        let reading = Reading::new((self.clock)(), raw.co2, temperature_c, humidity_percent);
        self.history.append(reading);

        debug!(
            "Stored reading: co2={}ppm temp={:.1}C hum={:.1}%",
            reading.co2_ppm(),
            reading.temperature_c(),
            reading.humidity_percent()
        );
        Some(reading)
    }

    /// Current counters
    pub fn stats(&self) -> IngestStats {
        IngestStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            readings_stored: self.readings_stored.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
        }
    }

    /// Frame handler for `DriverPort::register_callback`
    ///
    /// Never unwinds into the driver.
    pub fn handler(self: &Arc<Self>) -> FrameHandler {
        let ingestor = Arc::clone(self);
        Arc::new(move |frame: Option<&[u8]>| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| ingestor.ingest(frame)));
            if outcome.is_err() {
                ingestor.frames_dropped.fetch_add(1, Ordering::Relaxed);
                error!("Frame handler panicked; frame dropped");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryHistory;

    fn fixed_clock() -> i64 {
        1_700_000_000_000
    }

    fn setup() -> (Arc<MemoryHistory>, Arc<Ingestor>) {
        let history = Arc::new(MemoryHistory::new());
        let ingestor = Arc::new(Ingestor::new(history.clone()).with_clock(fixed_clock));
        (history, ingestor)
    }

    #[test]
    fn test_valid_frame_is_corrected_and_stored() {
        let (history, ingestor) = setup();

        let reading = ingestor.ingest(Some(b"CO2=800,HUM=45,TMP=22\r\n")).unwrap();

        assert_eq!(reading.timestamp_ms(), 1_700_000_000_000);
        assert_eq!(reading.co2_ppm(), 800);
        assert_eq!(reading.temperature_c(), 17.5);
        assert!((reading.humidity_percent() - 58.57386143667059).abs() < 1e-9);
        assert_eq!(history.latest(), Some(reading));
    }

    #[test]
    fn test_rejected_frames_leave_history_untouched() {
        let (history, ingestor) = setup();

        assert_eq!(ingestor.ingest(None), None);
        assert_eq!(ingestor.ingest(Some(b"OK STA")), None);
        assert_eq!(ingestor.ingest(Some(b"CO2=800,HUM=x,TMP=22")), None);

        assert!(history.is_empty());
        assert_eq!(
            ingestor.stats(),
            IngestStats {
                frames_received: 3,
                readings_stored: 0,
                frames_dropped: 3,
            }
        );
    }

    #[test]
    fn test_handler_feeds_history() {
        let (history, ingestor) = setup();
        let handler = ingestor.handler();

        handler(Some(b"CO2=600,HUM=50,TMP=25"));
        handler(None);
        handler(Some(b"CO2=610,HUM=50,TMP=25"));

        let co2: Vec<i32> = history.snapshot().iter().map(Reading::co2_ppm).collect();
        assert_eq!(co2, vec![610, 600]);
        assert_eq!(ingestor.stats().readings_stored, 2);
        assert_eq!(ingestor.stats().frames_dropped, 1);
    }

    #[test]
    fn test_custom_correction() {
        let history = Arc::new(MemoryHistory::new());
        let ingestor = Ingestor::new(history)
            .with_correction(HumidityCorrection::new(0.0))
            .with_clock(fixed_clock);

        let reading = ingestor.ingest(Some(b"CO2=500,HUM=40,TMP=20")).unwrap();
        assert_eq!(reading.temperature_c(), 20.0);
        assert!((reading.humidity_percent() - 40.0).abs() < 1e-9);
    }

    struct PanickingHistory;

    impl HistoryPort for PanickingHistory {
        fn append(&self, _reading: Reading) {
            panic!("storage failure");
        }

        fn snapshot(&self) -> Vec<Reading> {
            Vec::new()
        }

        fn latest(&self) -> Option<Reading> {
            None
        }
    }

    #[test]
    fn test_handler_swallows_panics() {
        let ingestor = Arc::new(Ingestor::new(Arc::new(PanickingHistory)));
        let handler = ingestor.handler();

        handler(Some(b"CO2=800,HUM=45,TMP=22"));
        // Gate is not poisoned; later frames still go through
        handler(Some(b"CO2=800,HUM=45,TMP=22"));

        assert_eq!(
            ingestor.stats(),
            IngestStats {
                frames_received: 2,
                readings_stored: 0,
                frames_dropped: 2,
            }
        );
    }

    #[test]
    fn test_non_finite_correction_is_still_stored() {
        let (history, ingestor) = setup();

        let reading = ingestor.ingest(Some(b"CO2=400,HUM=50,TMP=-244")).unwrap();

        assert_eq!(reading.temperature_c(), -248.5);
        assert!(!reading.humidity_percent().is_finite());
        assert_eq!(history.len(), 1);
        assert_eq!(ingestor.stats().readings_stored, 1);
    }
}
