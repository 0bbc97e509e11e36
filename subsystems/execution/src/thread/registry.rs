//! # Thread Registry
//!
//! Kernel-owned lookup from [`ThreadId`] to the thread itself. Schedulers
//! deal in ids; whoever drives them uses the registry to turn a dequeued id
//! back into a thread it can make ready. The registry is an explicit value
//! the kernel instantiates, not a process-wide global.

use alloc::sync::Arc;

use hashbrown::HashMap;
use spin::RwLock;

use super::thread::{Thread, ThreadId};

/// Registry of live threads.
#[derive(Debug, Default)]
pub struct ThreadRegistry {
    threads: RwLock<HashMap<ThreadId, Arc<Thread>>>,
}

impl ThreadRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
        }
    }

    /// Register a thread. Registering the same id twice is a caller error.
    pub fn register(&self, thread: Arc<Thread>) {
        let id = thread.id();
        let previous = self.threads.write().insert(id, thread);
        assert!(previous.is_none(), "registry: duplicate {id}");
        log::trace!("registry: registered {id}");
    }

    /// Remove a thread, returning it if it was present.
    pub fn unregister(&self, id: ThreadId) -> Option<Arc<Thread>> {
        let removed = self.threads.write().remove(&id);
        if removed.is_some() {
            log::trace!("registry: unregistered {id}");
        }
        removed
    }

    /// Look up a thread by id.
    pub fn get(&self, id: ThreadId) -> Option<Arc<Thread>> {
        self.threads.read().get(&id).cloned()
    }

    /// Number of registered threads.
    pub fn len(&self) -> usize {
        self.threads.read().len()
    }

    /// Whether no threads are registered.
    pub fn is_empty(&self) -> bool {
        self.threads.read().is_empty()
    }
}
