//! # Preemption Control
//!
//! The atomicity primitive the scheduler modules build on. Holding a
//! [`PreemptGuard`] asserts that no concurrent mutation of scheduler state
//! can be interleaved - on real hardware this maps to disabling local
//! interrupts, in hosted builds it is a plain depth counter. Scheduler entry
//! points check [`is_disabled`] instead of taking their own locks.
//!
//! Guards nest: each [`disable`] increments the depth, each drop decrements
//! it, and preemption is considered disabled while the depth is non-zero.

use core::marker::PhantomData;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Current preemption-disable nesting depth.
static DISABLE_DEPTH: AtomicUsize = AtomicUsize::new(0);

/// RAII guard for a preemption-disabled section.
///
/// The guard is `!Send`: the section must end on the context that began it.
#[derive(Debug)]
pub struct PreemptGuard {
    _not_send: PhantomData<*const ()>,
}

/// Disable preemption until the returned guard is dropped.
#[inline]
pub fn disable() -> PreemptGuard {
    DISABLE_DEPTH.fetch_add(1, Ordering::Acquire);
    PreemptGuard {
        _not_send: PhantomData,
    }
}

/// Whether preemption is currently disabled.
#[inline(always)]
pub fn is_disabled() -> bool {
    DISABLE_DEPTH.load(Ordering::Acquire) > 0
}

/// Current nesting depth, mostly useful for diagnostics.
#[inline(always)]
pub fn depth() -> usize {
    DISABLE_DEPTH.load(Ordering::Acquire)
}

impl Drop for PreemptGuard {
    fn drop(&mut self) {
        let prev = DISABLE_DEPTH.fetch_sub(1, Ordering::Release);
        debug_assert!(prev > 0, "preempt: unbalanced guard drop");
    }
}
