//! In-memory history adapter
//!
//! This adapter implements the HistoryPort trait with a fixed-capacity ring
//! published copy-on-write. Each append builds the next window off to the
//! side and swaps it in; readers clone an `Arc` to whichever window is
//! current and never see one mid-update.

use std::sync::Arc;

use heapless::Deque;
use parking_lot::{Mutex, RwLock};

use crate::domain::Reading;
use crate::ports::storage::{HistoryPort, HISTORY_CAPACITY};

/// One published state of the history, newest at the front
#[derive(Clone, Debug, Default)]
pub struct Window {
    readings: Deque<Reading, HISTORY_CAPACITY>,
}

impl Window {
    /// Push at the front, evicting from the back when full
    fn push_newest(&mut self, reading: Reading) {
        if self.readings.is_full() {
            self.readings.pop_back();
        }
        // Cannot fail: a slot was freed above if needed
        let _ = self.readings.push_front(reading);
    }

    /// Most recent reading
    pub fn newest(&self) -> Option<&Reading> {
        self.readings.front()
    }

    /// Readings newest-first
    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Copy-on-write reading history
///
/// Appends are serialized by `write_gate`; the `current` lock is held only
/// long enough to clone or replace the `Arc`.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    current: RwLock<Arc<Window>>,
    write_gate: Mutex<()>,
}

impl MemoryHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the current window, without copying readings
    pub fn window(&self) -> Arc<Window> {
        Arc::clone(&self.current.read())
    }
}

impl HistoryPort for MemoryHistory {
    fn append(&self, reading: Reading) {
        let _gate = self.write_gate.lock();

        let mut next = Window::clone(&self.window());
        next.push_newest(reading);

        *self.current.write() = Arc::new(next);
    }

    fn snapshot(&self) -> Vec<Reading> {
        self.window().iter().copied().collect()
    }

    fn latest(&self) -> Option<Reading> {
        self.window().newest().copied()
    }

    fn len(&self) -> usize {
        self.window().len()
    }

    fn is_empty(&self) -> bool {
        self.window().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn reading(ts: i64) -> Reading {
        Reading::new(ts, 400 + ts as i32, 20.0, 50.0)
    }

    #[test]
    fn test_empty_history() {
        let history = MemoryHistory::new();
        assert_eq!(history.latest(), None);
        assert!(history.snapshot().is_empty());
        assert!(history.is_empty());
    }

    #[test]
    fn test_snapshot_is_reverse_insertion_order() {
        let history = MemoryHistory::new();
        for ts in 1..=5 {
            history.append(reading(ts));
        }

        let dates: Vec<i64> = history.snapshot().iter().map(Reading::timestamp_ms).collect();
        assert_eq!(dates, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_exactly_full() {
        let history = MemoryHistory::new();
        for ts in 1..=HISTORY_CAPACITY as i64 {
            history.append(reading(ts));
        }

        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), HISTORY_CAPACITY);
        assert_eq!(snapshot[0].timestamp_ms(), 100);
        assert_eq!(snapshot[99].timestamp_ms(), 1);
    }

    #[test]
    fn test_overflow_keeps_last_hundred() {
        let history = MemoryHistory::new();
        for ts in 1..=150 {
            history.append(reading(ts));
        }

        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), 100);
        assert_eq!(snapshot[0].timestamp_ms(), 150);
        assert_eq!(snapshot[99].timestamp_ms(), 51);

        let expected: Vec<i64> = (51..=150).rev().collect();
        let dates: Vec<i64> = snapshot.iter().map(Reading::timestamp_ms).collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn test_latest_matches_snapshot_head() {
        let history = MemoryHistory::new();
        for ts in [7, 3, 9, 1] {
            history.append(reading(ts));
            assert_eq!(history.latest(), history.snapshot().first().copied());
        }
        assert_eq!(history.latest().map(|r| r.timestamp_ms()), Some(1));
    }

    #[test]
    fn test_old_window_is_frozen() {
        let history = MemoryHistory::new();
        history.append(reading(1));
        let before = history.window();

        history.append(reading(2));

        assert_eq!(before.len(), 1);
        assert_eq!(history.window().len(), 2);
    }

    #[test]
    fn test_concurrent_readers_see_consistent_windows() {
        let history = Arc::new(MemoryHistory::new());

        let writer = {
            let history = Arc::clone(&history);
            thread::spawn(move || {
                for ts in 1..=500 {
                    history.append(reading(ts));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let history = Arc::clone(&history);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let snapshot = history.snapshot();
                        assert!(snapshot.len() <= HISTORY_CAPACITY);
                        // Consecutive timestamps, strictly descending
                        for pair in snapshot.windows(2) {
                            assert_eq!(pair[0].timestamp_ms(), pair[1].timestamp_ms() + 1);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.latest().map(|r| r.timestamp_ms()), Some(500));
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let history = Arc::new(MemoryHistory::new());

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let history = Arc::clone(&history);
                thread::spawn(move || {
                    for i in 0..20 {
                        history.append(reading(w * 100 + i));
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(history.len(), 80);
    }
}
