//! Test utilities for ervec development.
//!
//! Provides a fault-injecting allocator ([`FlakyAlloc`]) for exercising the
//! allocation-failure paths, reusable element fixtures, and a harness for
//! asserting that a contract violation aborts the process.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod aborts;
pub mod fixtures;

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ervec_core::{RawAlloc, System};

/// When a [`FlakyAlloc`] starts refusing requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailPlan {
    /// Every request succeeds (as far as the system allocator allows).
    Never,
    /// Every request from now on fails.
    Always,
    /// The next `n` requests succeed, every later one fails.
    After(usize),
}

#[derive(Debug)]
struct Counters {
    /// Allocation and reallocation requests seen so far.
    requests: AtomicUsize,
    /// Request number from which failures start (`usize::MAX` = never).
    fail_from: AtomicUsize,
    failures: AtomicUsize,
    live_blocks: AtomicUsize,
}

/// A [`System`]-backed allocator that fails on demand.
///
/// Clones share their counters and plan, so a test can keep one clone
/// and arm it while the vector owns another. Releases are never refused.
/// Uses atomics so it stays `Send`.
#[derive(Clone, Debug)]
pub struct FlakyAlloc {
    counters: Arc<Counters>,
}

impl FlakyAlloc {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(Counters {
                requests: AtomicUsize::new(0),
                fail_from: AtomicUsize::new(usize::MAX),
                failures: AtomicUsize::new(0),
                live_blocks: AtomicUsize::new(0),
            }),
        }
    }

    /// Create an allocator already armed with `plan`.
    pub fn with_plan(plan: FailPlan) -> Self {
        let alloc = Self::new();
        alloc.arm(plan);
        alloc
    }

    /// Decide when requests start failing, counting from now.
    pub fn arm(&self, plan: FailPlan) {
        let now = self.counters.requests.load(Ordering::Relaxed);
        let fail_from = match plan {
            FailPlan::Never => usize::MAX,
            FailPlan::Always => now,
            FailPlan::After(n) => now.saturating_add(n),
        };
        self.counters.fail_from.store(fail_from, Ordering::Relaxed);
    }

    /// Shorthand for `arm(FailPlan::Never)`.
    pub fn disarm(&self) {
        self.arm(FailPlan::Never);
    }

    /// Allocation and reallocation requests seen, refused ones included.
    pub fn requests(&self) -> usize {
        self.counters.requests.load(Ordering::Relaxed)
    }

    /// Requests refused so far.
    pub fn failures(&self) -> usize {
        self.counters.failures.load(Ordering::Relaxed)
    }

    /// Blocks handed out and not yet released. Zero once every owner has
    /// been dropped, unless something leaked.
    pub fn live_blocks(&self) -> usize {
        self.counters.live_blocks.load(Ordering::Relaxed)
    }

    fn admit(&self) -> bool {
        let n = self.counters.requests.fetch_add(1, Ordering::Relaxed);
        if n >= self.counters.fail_from.load(Ordering::Relaxed) {
            self.counters.failures.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    fn track(&self, block: Option<NonNull<u8>>) -> Option<NonNull<u8>> {
        if block.is_some() {
            self.counters.live_blocks.fetch_add(1, Ordering::Relaxed);
        }
        block
    }
}

impl Default for FlakyAlloc {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: every successful request is forwarded to `System`, and blocks are
// handed back to `System` unchanged.
#[allow(unsafe_code)]
unsafe impl RawAlloc for FlakyAlloc {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if !self.admit() {
            return None;
        }
        self.track(System.allocate(layout))
    }

    fn allocate_zeroed(&self, layout: Layout) -> Option<NonNull<u8>> {
        if !self.admit() {
            return None;
        }
        self.track(System.allocate_zeroed(layout))
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> Option<NonNull<u8>> {
        if !self.admit() {
            return None;
        }
        // SAFETY: forwarded caller contract; the block came from System.
        unsafe { System.reallocate(ptr, layout, new_size) }
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        self.counters.live_blocks.fetch_sub(1, Ordering::Relaxed);
        // SAFETY: forwarded caller contract; the block came from System.
        unsafe { System.release(ptr, layout) }
    }
}
