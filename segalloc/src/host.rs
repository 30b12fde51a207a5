//! A host-backed [`ArenaProvider`] for tests and tooling.
//!
//! `FixedArena` pre-reserves a fixed-capacity buffer and simulates
//! monotonic growth by bumping a high-water mark within it, the same
//! "pre-reserve, bump a break" idiom a page-backed kernel heap uses to
//! simulate growth over a fixed physical region. Because the backing
//! allocation never moves or grows, addresses handed out stay valid for
//! the `FixedArena`'s lifetime, same as the real `ArenaProvider` contract
//! requires.

extern crate alloc;

use alloc::boxed::Box;

use crate::arena::ArenaProvider;

pub struct FixedArena {
    storage: Box<[u8]>,
    base: usize,
    used: usize,
}

impl FixedArena {
    /// Reserves `capacity` bytes of backing storage. The arena starts
    /// empty (`arena_lo() == arena_hi()`); call `extend` to grow it.
    pub fn new(capacity: usize) -> Self {
        let storage = alloc::vec![0u8; capacity].into_boxed_slice();
        let base = storage.as_ptr() as usize;
        Self { storage, base, used: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }
}

impl ArenaProvider for FixedArena {
    fn arena_lo(&self) -> usize {
        self.base
    }

    fn arena_hi(&self) -> usize {
        self.base + self.used
    }

    fn extend(&mut self, additional_bytes: usize) -> Option<usize> {
        let new_used = self.used.checked_add(additional_bytes)?;
        if new_used > self.storage.len() {
            return None;
        }
        let old_hi = self.arena_hi();
        self.used = new_used;
        Some(old_hi)
    }
}
