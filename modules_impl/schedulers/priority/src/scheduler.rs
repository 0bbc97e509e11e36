//! # Priority Scheduler Facade
//!
//! Entry points the synchronization layer drives: queue creation, the
//! waiter/holder protocol (`wait_for_access`, `acquire`, `next_thread`),
//! and the priority accessors. The scheduler owns every bookkeeping record
//! in two arenas and hands out handles; it takes no locks of its own.
//! Callers bracket every operation with a preemption-disable guard, and the
//! entry points assert that guarantee rather than re-establish it.

use corten_execution::{preempt, Thread, ThreadId};

use crate::arena::Arena;
use crate::error::{Result, SchedError};
use crate::queue::{QueueId, WaitQueue};
use crate::state::{refresh_chain, StateId, ThreadState, PRIORITY_MAX, PRIORITY_MIN};

/// Priority scheduler with donation.
///
/// Dequeue order is highest effective priority first, round-robin among
/// equals. A thread blocked on a donation-enabled queue lends its effective
/// priority to the queue's holder, transitively through any chain of held
/// resources, so a high-priority waiter can never be stalled behind a holder
/// that is too low-priority to get scheduled.
#[derive(Debug, Default)]
pub struct PriorityScheduler {
    threads: Arena<ThreadState>,
    queues: Arena<WaitQueue>,
    clock: u64,
}

impl PriorityScheduler {
    /// Create a scheduler with no known threads or queues.
    pub fn new() -> Self {
        Self {
            threads: Arena::new(),
            queues: Arena::new(),
            clock: 0,
        }
    }

    /// Create a wait queue for one resource.
    ///
    /// `transfers_priority` is fixed for the queue's lifetime: when true,
    /// waiters donate their effective priority to the queue's holder.
    pub fn new_wait_queue(&mut self, transfers_priority: bool) -> QueueId {
        self.queues.insert(WaitQueue::new(transfers_priority))
    }

    /// Destroy a queue. The resource must be idle: no waiters, no holder.
    pub fn destroy_queue(&mut self, queue: QueueId) {
        debug_assert!(preempt::is_disabled(), "scheduler entered with preemption enabled");
        let q = &self.queues[queue];
        assert!(
            q.is_empty() && q.owner().is_none(),
            "destroying a queue still in use"
        );
        self.queues.remove(queue);
    }

    /// The scheduling record for `unit`, created on first contact.
    ///
    /// The handle is cached in the thread's scheduling slot, so lookup after
    /// the first call is a slot read plus a generation check.
    pub fn state_for(&mut self, unit: &Thread) -> StateId {
        if let Some(raw) = unit.sched_slot().get() {
            let handle = StateId::from_raw(raw);
            if self.threads.contains(handle) {
                return handle;
            }
        }
        let handle = self.threads.insert(ThreadState::new(unit.id()));
        unit.sched_slot().set(handle.to_raw());
        handle
    }

    /// `unit`'s base priority.
    pub fn priority(&mut self, unit: &Thread) -> u8 {
        debug_assert!(preempt::is_disabled(), "scheduler entered with preemption enabled");
        let state = self.state_for(unit);
        self.threads[state].base
    }

    /// `unit`'s effective priority, donations included.
    pub fn effective_priority(&mut self, unit: &Thread) -> u8 {
        debug_assert!(preempt::is_disabled(), "scheduler entered with preemption enabled");
        let state = self.state_for(unit);
        self.threads[state].effective
    }

    /// Set `unit`'s base priority and re-derive every affected effective
    /// priority, including the holder of whatever `unit` is blocked on.
    ///
    /// Out-of-range values are rejected without mutating anything.
    pub fn set_priority(&mut self, unit: &Thread, priority: u8) -> Result<()> {
        debug_assert!(preempt::is_disabled(), "scheduler entered with preemption enabled");
        if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
            return Err(SchedError::out_of_range(priority));
        }
        let state = self.state_for(unit);
        if self.threads[state].base == priority {
            return Ok(());
        }
        log::trace!(
            "sched: {} base priority {} -> {}",
            unit.id(),
            self.threads[state].base,
            priority
        );
        self.threads[state].base = priority;
        refresh_chain(&mut self.threads, &self.queues, state);
        Ok(())
    }

    /// Raise `unit`'s base priority by one step.
    ///
    /// Returns `false` when already at the maximum (no change made).
    pub fn increase_priority(&mut self, unit: &Thread) -> bool {
        let current = self.priority(unit);
        if current == PRIORITY_MAX {
            return false;
        }
        self.set_priority(unit, current + 1).is_ok()
    }

    /// Lower `unit`'s base priority by one step.
    ///
    /// Returns `false` when already at the minimum (no change made).
    pub fn decrease_priority(&mut self, unit: &Thread) -> bool {
        let current = self.priority(unit);
        if current == PRIORITY_MIN {
            return false;
        }
        self.set_priority(unit, current - 1).is_ok()
    }

    /// Register `unit` as a waiter on `queue`.
    ///
    /// Stamps arrival order, then re-derives priorities so a donation-enabled
    /// queue boosts its holder right away. The caller still has to actually
    /// suspend the thread; the scheduler only records the wait.
    pub fn wait_for_access(&mut self, queue: QueueId, unit: &Thread) {
        debug_assert!(preempt::is_disabled(), "scheduler entered with preemption enabled");
        let state = self.state_for(unit);
        assert!(
            self.threads[state].blocked_on.is_none(),
            "{} is already waiting on a queue",
            unit.id()
        );
        assert!(
            self.queues[queue].owner() != Some(state),
            "{} cannot wait on a queue it holds",
            unit.id()
        );

        let stamp = self.clock;
        self.clock += 1;
        {
            let record = &mut self.threads[state];
            record.arrival = stamp;
            record.blocked_on = Some(queue);
        }
        self.queues[queue].push_waiter(state);
        refresh_chain(&mut self.threads, &self.queues, state);
        log::trace!("sched: {} waiting (stamp {})", unit.id(), stamp);
    }

    /// Hand `unit` the resource guarded by `queue` without contention.
    ///
    /// Models taking a free resource, so the wait set must be empty; a
    /// contended queue is drained through [`Self::next_thread`] instead.
    pub fn acquire(&mut self, queue: QueueId, unit: &Thread) {
        debug_assert!(preempt::is_disabled(), "scheduler entered with preemption enabled");
        let state = self.state_for(unit);
        assert!(
            self.queues[queue].is_empty(),
            "acquire on a queue with waiters"
        );
        self.release_owner(queue);
        self.queues[queue].set_owner(Some(state));
        self.threads[state].owned.push(queue);
        refresh_chain(&mut self.threads, &self.queues, state);
    }

    /// Remove and return the next thread to run from `queue`.
    ///
    /// Picks the highest effective priority, earliest arrival among equals.
    /// On a donation-enabled queue, ownership of the resource moves to the
    /// chosen thread and the previous holder loses the queue's donations.
    /// An empty queue yields `None` and releases the holder, leaving the
    /// resource free. Making the returned thread runnable is the caller's
    /// job.
    pub fn next_thread(&mut self, queue: QueueId) -> Option<ThreadId> {
        debug_assert!(preempt::is_disabled(), "scheduler entered with preemption enabled");
        let Some(chosen) = self.queues[queue].best_waiter(&self.threads) else {
            self.release_owner(queue);
            return None;
        };

        self.queues[queue].remove_waiter(chosen);
        self.threads[chosen].blocked_on = None;

        if self.queues[queue].transfers_priority() {
            self.release_owner(queue);
            self.queues[queue].set_owner(Some(chosen));
            self.threads[chosen].owned.push(queue);
        }
        refresh_chain(&mut self.threads, &self.queues, chosen);

        let unit = self.threads[chosen].unit;
        log::trace!("sched: {} dequeued", unit);
        Some(unit)
    }

    /// Withdraw `unit` from `queue` without granting it the resource, e.g.
    /// because the thread is being torn down while waiting.
    ///
    /// The holder's priorities are re-derived: the departing waiter may have
    /// been the donation source.
    pub fn cancel_wait(&mut self, queue: QueueId, unit: &Thread) {
        debug_assert!(preempt::is_disabled(), "scheduler entered with preemption enabled");
        let state = self.state_for(unit);
        assert_eq!(
            self.threads[state].blocked_on,
            Some(queue),
            "{} is not waiting on that queue",
            unit.id()
        );
        self.queues[queue].remove_waiter(state);
        self.threads[state].blocked_on = None;
        if let Some(owner) = self.queues[queue].owner() {
            refresh_chain(&mut self.threads, &self.queues, owner);
        }
    }

    /// Drop `unit`'s scheduling record as part of thread teardown.
    ///
    /// The thread must not be waiting and must not hold any queue; its slot
    /// is cleared and the record's handle becomes stale.
    pub fn retire(&mut self, unit: &Thread) {
        debug_assert!(preempt::is_disabled(), "scheduler entered with preemption enabled");
        let Some(raw) = unit.sched_slot().get() else {
            return;
        };
        let handle = StateId::from_raw(raw);
        if let Some(state) = self.threads.get(handle) {
            assert!(
                state.blocked_on.is_none(),
                "retiring {} while it is waiting",
                unit.id()
            );
            assert!(
                state.owned.is_empty(),
                "retiring {} while it holds resources",
                unit.id()
            );
            self.threads.remove(handle);
        }
        unit.sched_slot().clear();
    }

    /// The thread currently holding the resource guarded by `queue`.
    pub fn queue_owner(&self, queue: QueueId) -> Option<ThreadId> {
        self.queues[queue].owner().map(|s| self.threads[s].unit)
    }

    /// Number of threads waiting on `queue`.
    pub fn wait_count(&self, queue: QueueId) -> usize {
        self.queues[queue].len()
    }

    /// Clear `queue`'s holder and take the queue out of that thread's owned
    /// set, re-deriving its priorities.
    fn release_owner(&mut self, queue: QueueId) {
        if let Some(previous) = self.queues[queue].owner() {
            self.queues[queue].set_owner(None);
            let owned = &mut self.threads[previous].owned;
            if let Some(pos) = owned.iter().position(|&q| q == queue) {
                owned.swap_remove(pos);
            }
            refresh_chain(&mut self.threads, &self.queues, previous);
        }
    }
}
