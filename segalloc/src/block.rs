//! Block header/footer encoding (boundary tags).
//!
//! A block's header and footer are each a single 4-byte word: the low 3
//! bits hold flags (bit 0 = allocated, bits 1-2 reserved), the remaining
//! bits hold the total block size including header and footer. Size is
//! always a multiple of 8, so its low 3 bits are free for flags.

/// Header/footer size, in bytes.
pub const TAG_SIZE: usize = 4;

/// Minimum block size: header + 2 link fields + footer, all of which a
/// free block needs room for.
pub const MIN_BLOCK_SIZE: usize = 16;

/// Payload alignment. No alignment beyond this is supported (non-goal).
pub const ALIGNMENT: usize = 8;

const ALLOC_BIT: u32 = 0b001;
const FLAG_MASK: u32 = 0b111;

/// A packed header/footer word: `size | flags`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BlockTag(u32);

impl BlockTag {
    /// Packs a block size (a multiple of 8) and allocated bit into a tag.
    #[inline]
    pub const fn pack(size: u32, allocated: bool) -> Self {
        debug_assert!(size & FLAG_MASK as u32 == 0);
        BlockTag(size | if allocated { ALLOC_BIT } else { 0 })
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        BlockTag(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn size(self) -> u32 {
        self.0 & !FLAG_MASK
    }

    #[inline]
    pub const fn is_allocated(self) -> bool {
        self.0 & ALLOC_BIT != 0
    }
}

/// Rounds `value` up to the nearest multiple of 8.
#[inline]
pub const fn round_up_8(value: usize) -> usize {
    (value + (ALIGNMENT - 1)) & !(ALIGNMENT - 1)
}

/// Normalizes a client byte count into a block size, per the allocator's
/// request-normalization rule: `asize = max(16, round_up_8(s + 4 + 4))`.
/// Returns `None` for a zero-size request (acquire(0) is a no-op).
#[inline]
pub fn normalize(size: usize) -> Option<usize> {
    if size == 0 {
        return None;
    }
    let with_overhead = size.checked_add(2 * TAG_SIZE)?;
    Some(round_up_8(with_overhead).max(MIN_BLOCK_SIZE))
}
