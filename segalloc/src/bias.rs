//! Biased free-block links.
//!
//! Free-list `pred`/`succ` pointers are stored as 4-byte *biases*: byte
//! offsets from a fixed `base` at the arena's low end. A bias of 0 denotes
//! the null link; `base` is chosen (the start of the bucket-head table,
//! see [`crate::arena`]) so that no real block ever lands exactly on it,
//! which makes bias 0 unambiguous.
//!
//! Biases scale in bytes, not words, keeping the arithmetic here trivial.
//! The cost either way is the same: an arena must stay under 4 GiB for a
//! `u32` bias to address every block in it, which [`crate::arena`]
//! enforces on every extension.

/// Encodes an absolute address as a bias relative to `base`.
#[inline]
pub fn bias_of(base: usize, addr: usize) -> u32 {
    debug_assert!(addr > base, "bias_of: addr must lie above base");
    (addr - base) as u32
}

/// Decodes a bias back into an absolute address, or `None` for the null
/// bias (0).
#[inline]
pub fn addr_of(base: usize, bias: u32) -> Option<usize> {
    if bias == 0 {
        None
    } else {
        Some(base + bias as usize)
    }
}
