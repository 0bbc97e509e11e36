//! # Corten Execution Subsystem
//!
//! The execution subsystem provides the raw schedulable-unit abstraction
//! consumed by the scheduler modules: thread identity and lifecycle state,
//! the per-thread slot that carries a scheduler's bookkeeping handle, the
//! kernel-owned thread registry, and the preemption-disable primitive that
//! callers hold around every scheduler operation.
//!
//! ## Components
//!
//! - **Thread**: identity, name, lifecycle status, scheduling slot
//! - **Registry**: `ThreadId` to `Thread` lookup, owned by the kernel
//! - **Preempt**: RAII preemption-disable guard (the atomicity primitive)
//!
//! Policy lives elsewhere: this crate never decides *which* thread runs,
//! it only models threads and the guarantees schedulers rely on.

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

pub mod preempt;
pub mod thread;

pub use thread::{SchedSlot, Status, Thread, ThreadId, ThreadRegistry};
