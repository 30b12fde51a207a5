//! A process-wide convenience instance.
//!
//! The engine itself keeps allocator state as an explicit value with
//! `init`/`teardown` semantics; this module is the compatibility shim for
//! call sites that instead want a single shared instance: a global
//! [`Allocator`] behind a raw-pointer cell, in the style of a userland
//! libc's own `malloc`/`free`/`realloc` globals. A plain cell wrapper is
//! sound here only because use is single-threaded from this allocator's
//! point of view, the same precondition the engine itself requires.
//!
//! # Safety
//!
//! Every function here is safe to *call*, but the whole module is sound
//! only under the same no-concurrency assumption the rest of this crate
//! makes: at most one thread ever touches the global instance.

use core::cell::UnsafeCell;
use core::ptr::NonNull;

use crate::arena::{AllocatorConfig, ArenaProvider};
use crate::engine::Allocator;

struct GlobalCell<P: ArenaProvider>(UnsafeCell<Option<Allocator<P>>>);

// SAFETY: soundness is a caller obligation (single-threaded use only), as
// documented on the module.
unsafe impl<P: ArenaProvider> Sync for GlobalCell<P> {}

/// A process-wide [`Allocator`] instance over a caller-chosen provider.
///
/// Distinct from [`Allocator`] itself, which has no global state at all;
/// reach for this only when a single shared instance — not an explicit
/// value threaded through the program — is what the call site needs.
pub struct GlobalAllocator<P: ArenaProvider> {
    cell: GlobalCell<P>,
}

impl<P: ArenaProvider> GlobalAllocator<P> {
    /// Creates an uninitialized global slot. Call [`Self::init`] before
    /// using [`Self::acquire`] and friends.
    pub const fn new() -> Self {
        Self { cell: GlobalCell(UnsafeCell::new(None)) }
    }

    /// Initializes the global instance from `provider`. Returns `false`
    /// (and leaves any existing instance untouched) if the provider
    /// cannot supply the initial arena bytes.
    pub fn init(&self, provider: P, config: AllocatorConfig) -> bool {
        match Allocator::init(provider, config) {
            Some(allocator) => {
                unsafe { *self.cell.0.get() = Some(allocator) };
                true
            }
            None => false,
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Allocator<P>) -> R) -> R {
        let slot = unsafe { &mut *self.cell.0.get() };
        let allocator = slot.as_mut().expect("GlobalAllocator::init was not called");
        f(allocator)
    }

    pub fn acquire(&self, size: usize) -> Option<NonNull<u8>> {
        self.with(|a| a.acquire(size))
    }

    pub fn release(&self, ptr: Option<NonNull<u8>>) {
        self.with(|a| a.release(ptr))
    }

    pub fn resize(&self, ptr: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
        self.with(|a| a.resize(ptr, size))
    }

    pub fn zero_acquire(&self, n: usize, s: usize) -> Option<NonNull<u8>> {
        self.with(|a| a.zero_acquire(n, s))
    }

    #[track_caller]
    pub fn check(&self) -> Result<(), crate::CheckViolation> {
        self.with(|a| a.check())
    }
}

impl<P: ArenaProvider> Default for GlobalAllocator<P> {
    fn default() -> Self {
        Self::new()
    }
}
