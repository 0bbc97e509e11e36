//! # Scheduling State and Priority Donation
//!
//! One [`ThreadState`] record exists per thread the scheduler has seen. It
//! carries the thread's base priority, its cached effective priority, the
//! wait queues the thread currently holds, and the single queue it is
//! blocked on. Effective priority is derived: the base priority raised by
//! the strongest waiter on any donation-enabled queue the thread holds.
//!
//! [`refresh_chain`] is the donation algorithm. Donation has to travel: if a
//! thread holding a resource is itself blocked on another resource, a boost
//! it receives must reach whoever holds that one too. The walk follows
//! `blocked_on` to the owning thread and continues until a recomputation
//! leaves a value unchanged.

use alloc::vec::Vec;

use corten_execution::ThreadId;
use static_assertions::const_assert;

use crate::arena::{Arena, Handle};
use crate::queue::{QueueId, WaitQueue};

/// Lowest priority a thread can have.
pub const PRIORITY_MIN: u8 = 0;
/// Highest priority a thread can have.
pub const PRIORITY_MAX: u8 = 7;
/// Priority assigned to a thread on first contact with the scheduler.
pub const PRIORITY_DEFAULT: u8 = 1;

const_assert!(PRIORITY_MIN <= PRIORITY_DEFAULT);
const_assert!(PRIORITY_DEFAULT <= PRIORITY_MAX);

/// Longest `blocked_on -> owner` chain a refresh will follow. The donation
/// graph is acyclic in well-formed programs; the cap keeps a caller-created
/// cycle from hanging the scheduler.
pub(crate) const MAX_DONATION_DEPTH: usize = 32;

/// Handle to a thread's scheduling record.
pub type StateId = Handle<ThreadState>;

/// Per-thread scheduling record.
#[derive(Debug)]
pub struct ThreadState {
    pub(crate) unit: ThreadId,
    pub(crate) base: u8,
    pub(crate) effective: u8,
    pub(crate) owned: Vec<QueueId>,
    pub(crate) blocked_on: Option<QueueId>,
    pub(crate) arrival: u64,
}

impl ThreadState {
    pub(crate) fn new(unit: ThreadId) -> Self {
        Self {
            unit,
            base: PRIORITY_DEFAULT,
            effective: PRIORITY_DEFAULT,
            owned: Vec::new(),
            blocked_on: None,
            arrival: 0,
        }
    }

    /// The thread this record belongs to.
    #[inline(always)]
    pub fn unit(&self) -> ThreadId {
        self.unit
    }

    /// Base priority, as set through the scheduler.
    #[inline(always)]
    pub fn base_priority(&self) -> u8 {
        self.base
    }

    /// Effective priority including donations.
    #[inline(always)]
    pub fn effective_priority(&self) -> u8 {
        self.effective
    }
}

/// Recompute `start`'s effective priority and propagate the result up its
/// donation chain.
///
/// The start node always pushes one hop: its *donation* to the owner of the
/// queue it is blocked on may have changed (it may have just enqueued) even
/// when its own effective value did not. Past that first hop the walk stops
/// as soon as a node's value settles, which makes repeated calls with no
/// intervening mutation free of further cascading.
pub(crate) fn refresh_chain(
    threads: &mut Arena<ThreadState>,
    queues: &Arena<WaitQueue>,
    start: StateId,
) {
    let mut current = start;
    for hop in 0..MAX_DONATION_DEPTH {
        let fresh = effective_of(threads, queues, current);
        let state = &mut threads[current];
        let changed = state.effective != fresh;
        state.effective = fresh;

        if !changed && hop > 0 {
            return;
        }
        match threads[current].blocked_on.and_then(|q| queues[q].owner()) {
            Some(owner) => current = owner,
            None => return,
        }
    }
    log::warn!(
        "donation chain exceeds {} hops, possible ownership cycle; propagation stopped",
        MAX_DONATION_DEPTH
    );
}

/// What `state`'s effective priority should be right now: the base priority,
/// raised by the strongest waiter on each donation-enabled queue it holds.
fn effective_of(threads: &Arena<ThreadState>, queues: &Arena<WaitQueue>, id: StateId) -> u8 {
    let state = &threads[id];
    let mut effective = state.base;
    for &queue in &state.owned {
        if let Some(donated) = queues[queue].donation(threads) {
            effective = effective.max(donated);
        }
    }
    effective
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let thread = corten_execution::Thread::new("fresh");
        let state = ThreadState::new(thread.id());
        assert_eq!(state.base_priority(), PRIORITY_DEFAULT);
        assert_eq!(state.effective_priority(), PRIORITY_DEFAULT);
        assert!(state.blocked_on.is_none());
        assert!(state.owned.is_empty());
    }

    #[test]
    fn test_effective_tracks_base_without_donation() {
        let thread = corten_execution::Thread::new("solo");
        let mut threads = Arena::new();
        let queues = Arena::new();
        let id = threads.insert(ThreadState::new(thread.id()));

        threads[id].base = 6;
        refresh_chain(&mut threads, &queues, id);
        assert_eq!(threads[id].effective, 6);

        // Idempotent: a second refresh changes nothing.
        refresh_chain(&mut threads, &queues, id);
        assert_eq!(threads[id].effective, 6);
    }
}
