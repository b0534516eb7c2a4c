//! End-to-end: scripted driver → ingestor → history → queries

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use co2::{DriverPort, FrameHandler, HistoryPort, Ingestor, MemoryHistory, QueryService, HISTORY_CAPACITY};

/// Replays canned frames on `open`, the way a device would stream them
#[derive(Default)]
struct ReplayDriver {
    frames: Vec<Option<Vec<u8>>>,
    handler: Option<FrameHandler>,
}

impl ReplayDriver {
    fn new(frames: Vec<Option<Vec<u8>>>) -> Self {
        Self {
            frames,
            handler: None,
        }
    }
}

impl DriverPort for ReplayDriver {
    fn register_callback(&mut self, handler: FrameHandler) {
        self.handler = Some(handler);
    }

    fn open(&mut self, _device_path: &str) {
        if let Some(handler) = &self.handler {
            for frame in &self.frames {
                handler(frame.as_deref());
            }
        }
    }

    fn close(&mut self) {
        self.handler = None;
    }
}

static TICK: AtomicI64 = AtomicI64::new(0);

fn ticking_clock() -> i64 {
    TICK.fetch_add(1, Ordering::SeqCst) + 1
}

fn frame(text: &str) -> Option<Vec<u8>> {
    Some(text.as_bytes().to_vec())
}

#[test]
fn replayed_stream_is_filtered_corrected_and_served() {
    let history = Arc::new(MemoryHistory::new());
    let ingestor = Arc::new(Ingestor::new(history.clone()));
    let queries = QueryService::new(history.clone());

    let mut driver = ReplayDriver::new(vec![
        frame("OK STA\r\n"),
        frame("CO2=800,HUM=45,TMP=22\r\n"),
        None,
        frame("CO2=bad,HUM=45,TMP=22\r\n"),
        frame("FOO=1\r\n"),
        frame("CO2=950,HUM=50,TMP=24\r\n"),
    ]);
    driver.register_callback(ingestor.handler());
    driver.open("replay");
    driver.close();

    let served = queries.history();
    assert_eq!(served.len(), 2);
    assert_eq!(served[0].co2_ppm(), 950);
    assert_eq!(served[1].co2_ppm(), 800);
    assert_eq!(served[1].temperature_c(), 17.5);
    assert!((served[1].humidity_percent() - 58.57386143667059).abs() < 1e-9);

    assert_eq!(queries.current(), Some(served[0]));

    let stats = ingestor.stats();
    assert_eq!(stats.frames_received, 6);
    assert_eq!(stats.readings_stored, 2);
    assert_eq!(stats.frames_dropped, 4);
}

#[test]
fn long_stream_keeps_most_recent_window() {
    let history = Arc::new(MemoryHistory::new());
    let ingestor = Arc::new(Ingestor::new(history.clone()).with_clock(ticking_clock));

    let frames = (0..150)
        .map(|i| frame(&format!("CO2={},HUM=40,TMP=25", 400 + i)))
        .collect();
    let mut driver = ReplayDriver::new(frames);
    driver.register_callback(ingestor.handler());
    driver.open("replay");

    let snapshot = history.snapshot();
    assert_eq!(snapshot.len(), HISTORY_CAPACITY);
    assert_eq!(snapshot[0].co2_ppm(), 549);
    assert_eq!(snapshot[99].co2_ppm(), 450);
    assert!(snapshot
        .windows(2)
        .all(|pair| pair[0].timestamp_ms() > pair[1].timestamp_ms()));
}

#[test]
fn silent_driver_leaves_queries_empty() {
    let history = Arc::new(MemoryHistory::new());
    let ingestor = Arc::new(Ingestor::new(history.clone()));
    let queries = QueryService::new(history);

    let mut driver = ReplayDriver::default();
    driver.register_callback(ingestor.handler());
    driver.open("");

    assert_eq!(queries.current(), None);
    assert!(queries.history().is_empty());
}
