//! History port - abstraction for the rolling window of corrected readings
//!
//! This trait allows ingestion and queries to share history without knowing
//! how it is held or synchronized.

use crate::domain::Reading;

/// Number of readings retained
pub const HISTORY_CAPACITY: usize = 100;

/// Port for the reading history
///
/// Ordering is newest-first: index 0 is the most recent append. Any number of
/// threads may read while one appends.
///
/// # Example Implementation
///
/// ```ignore
/// struct MemoryHistory {
///     current: RwLock<Arc<Window>>,
/// }
///
/// impl HistoryPort for MemoryHistory {
///     fn append(&self, reading: Reading) {
///         let mut next = (**self.current.read()).clone();
///         next.push_newest(reading);
///         *self.current.write() = Arc::new(next);
///     }
///     // ...
/// }
/// ```
pub trait HistoryPort: Send + Sync {
    /// Insert a reading at the head, dropping the oldest past
    /// `HISTORY_CAPACITY`
    ///
    /// This is the only mutating operation.
    fn append(&self, reading: Reading);

    /// Copy of the whole history, newest-first
    ///
    /// Never observes a half-applied append.
    fn snapshot(&self) -> Vec<Reading>;

    /// Most recent reading, or `None` before the first append
    fn latest(&self) -> Option<Reading>;

    /// Number of readings currently held
    fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether nothing has been appended yet
    fn is_empty(&self) -> bool {
        self.latest().is_none()
    }
}
