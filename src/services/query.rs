//! Query service - read-only views over the history

use std::sync::Arc;

use crate::domain::Reading;
use crate::ports::storage::HistoryPort;

/// Answers "current" and "history" requests
#[derive(Clone)]
pub struct QueryService {
    history: Arc<dyn HistoryPort>,
}

impl QueryService {
    pub fn new(history: Arc<dyn HistoryPort>) -> Self {
        Self { history }
    }

    /// Most recent reading; `None` until the first frame is stored
    pub fn current(&self) -> Option<Reading> {
        self.history.latest()
    }

    /// Every retained reading, newest-first
    pub fn history(&self) -> Vec<Reading> {
        self.history.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryHistory;

    #[test]
    fn test_empty() {
        let service = QueryService::new(Arc::new(MemoryHistory::new()));
        assert_eq!(service.current(), None);
        assert!(service.history().is_empty());
    }

    #[test]
    fn test_current_is_newest() {
        let history = Arc::new(MemoryHistory::new());
        let service = QueryService::new(history.clone());

        history.append(Reading::new(1, 500, 20.0, 40.0));
        history.append(Reading::new(2, 510, 20.5, 41.0));

        assert_eq!(service.current().map(|r| r.timestamp_ms()), Some(2));
        assert_eq!(service.history().len(), 2);
        // Queries never mutate
        assert_eq!(history.len(), 2);
    }
}
