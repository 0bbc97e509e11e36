//! # Corten Priority Scheduler
//!
//! Priority scheduling with donation for the Corten execution subsystem.
//! Each thread carries a base priority in `[PRIORITY_MIN, PRIORITY_MAX]`;
//! wait queues hand resources to the highest effective priority first,
//! round-robin among equals.
//!
//! ## Priority inversion
//!
//! A high-priority thread blocked on a resource held by a low-priority
//! thread would otherwise stall until the holder happens to get CPU time.
//! Queues created with `transfers_priority` donate each waiter's effective
//! priority to the holder - transitively, through whole chains of held
//! resources - so the holder runs soon, finishes, and hands the resource
//! over.
//!
//! ## Concurrency model
//!
//! Cooperative and externally serialized: every operation must run under a
//! preemption-disable guard ([`corten_execution::preempt`]), which the entry
//! points assert. The scheduler suspends and wakes nothing itself; it only
//! decides who is next, and the synchronization layer built on top drives
//! the actual blocking.
//!
//! Bookkeeping lives in generational arenas and is linked by handles, not
//! references - the donation graph is cyclic (thread -> owned queue ->
//! waiting thread -> ...) and is walked by index.

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

pub mod arena;
pub mod error;
pub mod queue;
pub mod scheduler;
pub mod state;

pub use arena::{Arena, Handle};
pub use error::{Result, SchedError};
pub use queue::{QueueId, WaitQueue};
pub use scheduler::PriorityScheduler;
pub use state::{StateId, ThreadState, PRIORITY_DEFAULT, PRIORITY_MAX, PRIORITY_MIN};
