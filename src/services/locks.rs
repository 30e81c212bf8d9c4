//! Per-book mutual exclusion for the lending consistency unit

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of one async mutex per book id.
///
/// Entries are created on demand and dropped again once no task holds or
/// waits on them, so the map only ever contains books with work in flight.
#[derive(Clone, Default)]
pub struct BookLocks {
    inner: Arc<Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>>,
}

/// Held for the duration of a borrow, return or delete of one book
pub struct BookGuard {
    book_id: i64,
    guard: Option<OwnedMutexGuard<()>>,
    registry: BookLocks,
}

impl BookLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other task works on `book_id`
    pub async fn lock(&self, book_id: i64) -> BookGuard {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(book_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let guard = mutex.lock_owned().await;

        BookGuard {
            book_id,
            guard: Some(guard),
            registry: self.clone(),
        }
    }

    /// Number of books with a live lock entry
    pub fn active(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Drop for BookGuard {
    fn drop(&mut self) {
        // Release first so the strong count below only sees the map and waiters
        drop(self.guard.take());

        let mut map = self.registry.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = map.get(&self.book_id) {
            if Arc::strong_count(entry) == 1 {
                map.remove(&self.book_id);
            }
        }
    }
}
