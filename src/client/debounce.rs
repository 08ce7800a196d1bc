use std::sync::atomic::{AtomicU64, Ordering};

use tokio::time::Duration;

/// Delay applied to search input before a query is issued.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(400);

/// Trailing-edge debouncer. Each call bumps a generation counter; after the
/// delay only the call that still owns the latest generation yields its value.
pub struct Debouncer {
    delay: Duration,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
        }
    }

    /// Waits out the delay and returns `Some(value)` only if no newer call
    /// arrived in the meantime.
    pub async fn settle<V>(&self, value: V) -> Option<V> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if self.generation.load(Ordering::SeqCst) == ticket {
            Some(value)
        } else {
            None
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}
