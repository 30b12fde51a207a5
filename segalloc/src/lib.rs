//! A boundary-tag, segregated-fit dynamic memory allocator over a
//! monotonically-extensible arena.
//!
//! `segalloc` implements the four classical allocator operations —
//! [`Allocator::acquire`], [`Allocator::release`], [`Allocator::resize`],
//! [`Allocator::zero_acquire`] — plus the bookkeeping that makes them fast:
//! in-band boundary tags, a segregated free-list index, immediate
//! coalescing, and a resize-in-place fast path. The engine owns no memory
//! itself; it is generic over an [`ArenaProvider`] that supplies a
//! contiguous, monotonically-growable byte region.
//!
//! The crate is `no_std` except for its own test target (or with the
//! `std` feature enabled, which additionally exposes [`host::FixedArena`],
//! a host-backed provider useful for embedding tests and tooling).

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![allow(unsafe_op_in_unsafe_fn)]

mod bias;
mod block;
pub mod check;
mod coalesce;
mod fit;
pub mod global;
pub mod klog;
mod place;

mod arena;
mod engine;
mod index;
mod raw;

#[cfg(any(test, feature = "std"))]
pub mod host;

#[cfg(test)]
mod tests;

pub use arena::ArenaProvider;
pub use check::CheckViolation;
pub use engine::{Allocator, AllocatorConfig};

pub use block::MIN_BLOCK_SIZE;
pub use index::NUM_BUCKETS;
