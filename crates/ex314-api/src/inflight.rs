//! At most one reply in flight per thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Entries {
    next_id: AtomicU64,
    by_thread: Mutex<HashMap<String, (u64, CancellationToken)>>,
}

#[derive(Clone, Default)]
pub struct InflightRegistry {
    entries: Arc<Entries>,
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the thread; `None` while another send holds it
    pub fn begin(&self, thread_id: &str) -> Option<InflightGuard> {
        let mut by_thread = self.entries.by_thread.lock().ok()?;
        if by_thread.contains_key(thread_id) {
            return None;
        }

        let id = self.entries.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        by_thread.insert(thread_id.to_string(), (id, token.clone()));

        Some(InflightGuard {
            entries: Arc::clone(&self.entries),
            thread_id: thread_id.to_string(),
            id,
            token,
        })
    }

    /// Cancel the send holding `thread_id`; false when there is none
    pub fn cancel(&self, thread_id: &str) -> bool {
        let token = match self.entries.by_thread.lock() {
            Ok(by_thread) => by_thread.get(thread_id).map(|(_, t)| t.clone()),
            Err(_) => None,
        };
        match token {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, thread_id: &str) -> bool {
        self.entries
            .by_thread
            .lock()
            .map(|by_thread| by_thread.contains_key(thread_id))
            .unwrap_or(false)
    }
}

/// Releases the thread on drop
pub struct InflightGuard {
    entries: Arc<Entries>,
    thread_id: String,
    id: u64,
    token: CancellationToken,
}

impl InflightGuard {
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        if let Ok(mut by_thread) = self.entries.by_thread.lock() {
            if by_thread.get(&self.thread_id).is_some_and(|(id, _)| *id == self.id) {
                by_thread.remove(&self.thread_id);
            }
        }
    }
}
