use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct Entry {
    generation: u64,
    token: CancellationToken,
}

/// In-flight authentication requests keyed by cookie.
///
/// The lock is never held across an await.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    next_generation: Arc<AtomicU64>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `cookie` until the returned guard is dropped. A second
    /// registration of the same cookie replaces the first.
    pub fn register(&self, cookie: &str) -> InFlightGuard {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        self.entries.lock().insert(
            cookie.to_string(),
            Entry {
                generation,
                token: token.clone(),
            },
        );
        InFlightGuard {
            registry: self.clone(),
            cookie: cookie.to_string(),
            generation,
            token,
        }
    }

    /// Cancel the request for `cookie`. Returns whether one was in flight.
    pub fn cancel(&self, cookie: &str) -> bool {
        match self.entries.lock().get(cookie) {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, cookie: &str) -> bool {
        self.entries.lock().contains_key(cookie)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, cookie: &str, generation: u64) {
        let mut entries = self.entries.lock();
        if entries.get(cookie).is_some_and(|e| e.generation == generation) {
            entries.remove(cookie);
        }
    }
}

/// Registration of one in-flight request; deregisters on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: InFlightRegistry,
    cookie: String,
    generation: u64,
    token: CancellationToken,
}

impl InFlightGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.release(&self.cookie, self.generation);
    }
}
