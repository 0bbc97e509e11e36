//! # Thread
//!
//! The schedulable unit: identity, name, lifecycle status, and the slot a
//! scheduler uses to attach its per-thread bookkeeping record. The thread
//! itself carries no scheduling policy; `make_ready` and `suspend` are the
//! hooks the synchronization layer drives after consulting a scheduler.

use alloc::string::String;
use core::fmt;
use core::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use super::states::Status;

/// Next thread id to hand out.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a thread for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(u64);

impl ThreadId {
    /// Raw numeric value, for logs and diagnostics.
    #[inline(always)]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tid{}", self.0)
    }
}

/// Per-thread storage for a scheduler's bookkeeping handle.
///
/// The thread owns the slot; the scheduler owns the record the handle refers
/// to. Keeping the handle on the thread avoids any side lookup from thread
/// identity to scheduling state.
#[derive(Debug)]
pub struct SchedSlot(AtomicU64);

impl SchedSlot {
    const VACANT: u64 = u64::MAX;

    /// New vacant slot.
    pub const fn new() -> Self {
        Self(AtomicU64::new(Self::VACANT))
    }

    /// The stored raw handle, if any.
    #[inline]
    pub fn get(&self) -> Option<u64> {
        match self.0.load(Ordering::Acquire) {
            Self::VACANT => None,
            raw => Some(raw),
        }
    }

    /// Store a raw handle.
    #[inline]
    pub fn set(&self, raw: u64) {
        debug_assert_ne!(raw, Self::VACANT, "SchedSlot: reserved handle value");
        self.0.store(raw, Ordering::Release);
    }

    /// Empty the slot.
    #[inline]
    pub fn clear(&self) {
        self.0.store(Self::VACANT, Ordering::Release);
    }
}

impl Default for SchedSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// A schedulable execution unit.
#[derive(Debug)]
pub struct Thread {
    id: ThreadId,
    name: String,
    status: AtomicU8,
    sched_slot: SchedSlot,
}

impl Thread {
    /// Create a new thread in the `New` state.
    pub fn new(name: impl Into<String>) -> Self {
        let id = ThreadId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            id,
            name: name.into(),
            status: AtomicU8::new(Status::New.as_u8()),
            sched_slot: SchedSlot::new(),
        }
    }

    /// This thread's identity.
    #[inline(always)]
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Human-readable name.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle status.
    #[inline]
    pub fn status(&self) -> Status {
        Status::from_u8(self.status.load(Ordering::Acquire))
    }

    /// The slot a scheduler attaches its bookkeeping handle to.
    #[inline(always)]
    pub fn sched_slot(&self) -> &SchedSlot {
        &self.sched_slot
    }

    /// Make the thread eligible to run.
    ///
    /// Called by the synchronization layer after a scheduler hands this
    /// thread back from a wait queue. Actually placing it on a run queue is
    /// the caller's job.
    pub fn make_ready(&self) {
        self.transition(Status::Ready);
    }

    /// Suspend the (running) thread until it is made ready again.
    pub fn suspend(&self) {
        self.transition(Status::Blocked);
    }

    /// Mark the thread as having started execution.
    pub fn start_running(&self) {
        self.transition(Status::Running);
    }

    /// Mark the thread as done.
    pub fn finish(&self) {
        self.transition(Status::Finished);
    }

    fn transition(&self, to: Status) {
        let from = self.status();
        assert!(
            from.can_transition_to(to),
            "thread {}: illegal transition {:?} -> {:?}",
            self.id,
            from,
            to
        );
        self.status.store(to.as_u8(), Ordering::Release);
        log::trace!("{} ({}): {:?} -> {:?}", self.id, self.name, from, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique() {
        let a = Thread::new("a");
        let b = Thread::new("b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_lifecycle() {
        let t = Thread::new("worker");
        assert_eq!(t.status(), Status::New);
        t.make_ready();
        assert_eq!(t.status(), Status::Ready);
        t.start_running();
        t.suspend();
        assert_eq!(t.status(), Status::Blocked);
        t.make_ready();
        t.start_running();
        t.finish();
        assert_eq!(t.status(), Status::Finished);
    }

    #[test]
    #[should_panic(expected = "illegal transition")]
    fn test_illegal_transition_panics() {
        let t = Thread::new("bad");
        t.suspend();
    }

    #[test]
    fn test_sched_slot() {
        let t = Thread::new("slotted");
        assert!(t.sched_slot().get().is_none());
        t.sched_slot().set(42);
        assert_eq!(t.sched_slot().get(), Some(42));
        t.sched_slot().clear();
        assert!(t.sched_slot().get().is_none());
    }
}
