//! The arena provider interface and tunables.
//!
//! `ArenaProvider` is the allocator's only external collaborator: it
//! supplies the contiguous, monotonically-growing byte region the engine
//! manages. Implementations might back this with a kernel's page
//! allocator, an `mmap`-simulated heap (see [`crate::host::FixedArena`]),
//! or anything else — the engine never assumes more than the three
//! methods below.

/// Supplies and grows the arena the allocator manages.
///
/// Growth is monotonic only: a conforming provider never shrinks the
/// region between `arena_lo()` and `arena_hi()`, and addresses it has
/// already handed out remain valid for the provider's lifetime.
pub trait ArenaProvider {
    /// The arena's fixed low address.
    fn arena_lo(&self) -> usize;

    /// The arena's current high-water mark (one past the last managed
    /// byte).
    fn arena_hi(&self) -> usize;

    /// Grows the arena by at least `additional_bytes`, returning the old
    /// `arena_hi()` (the start of the freshly-added region), or `None` if
    /// the provider cannot grow further.
    fn extend(&mut self, additional_bytes: usize) -> Option<usize>;
}

/// Tunable parameters for an [`crate::Allocator`].
#[derive(Clone, Copy, Debug)]
pub struct AllocatorConfig {
    /// Minimum amount, in bytes, requested from the arena provider on each
    /// extension (both the initial one and any made to satisfy a miss).
    /// Defaults to 4096.
    pub chunk_size: usize,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self { chunk_size: 4096 }
    }
}

/// Size of the prologue sentinel block (header + footer, no payload).
pub const PROLOGUE_SIZE: usize = 8;

/// Size of the epilogue sentinel header (no footer, no payload).
pub const EPILOGUE_SIZE: usize = 4;
