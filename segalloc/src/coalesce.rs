//! Coalescer (§4.5): merges a newly-freed block with free neighbors.
//!
//! | Left | Right | Action |
//! |---|---|---|
//! | A | A | keep block as-is |
//! | A | F | remove right from its list; extend block rightward |
//! | F | A | remove left from its list; extend left leftward |
//! | F | F | remove both neighbors; extend across all three |
//!
//! In every case the merged block is (re)inserted into the bucket
//! matching its final size — including the no-op case, since the block
//! arriving here (freshly released, or freshly carved out by `extend`)
//! was never linked into a bucket to begin with.

use crate::block::{BlockTag, TAG_SIZE};
use crate::index;
use crate::raw::{read_u32, write_u32};

fn size_at(addr: usize) -> usize {
    BlockTag::from_raw(unsafe { read_u32(addr) }).size() as usize
}

/// Coalesces the free block at `block` with any free immediate neighbors,
/// writing the merged header/footer and inserting the result into its
/// bucket. Returns the final (possibly merged) block's address.
///
/// # Safety
///
/// `block` must be a currently-free block, not linked into any bucket
/// list, with a valid header/footer already written.
pub unsafe fn coalesce(base: usize, block: usize) -> usize {
    let size = size_at(block);

    let left_footer = block - TAG_SIZE;
    let left_tag = BlockTag::from_raw(unsafe { read_u32(left_footer) });
    let right_header = block + size;
    let right_tag = BlockTag::from_raw(unsafe { read_u32(right_header) });

    let mut start = block;
    let mut total = size;

    if !right_tag.is_allocated() {
        let right_size = right_tag.size() as usize;
        unsafe { index::remove(base, right_header, right_size) };
        total += right_size;
    }

    if !left_tag.is_allocated() {
        let left_size = left_tag.size() as usize;
        let left_start = block - left_size;
        unsafe { index::remove(base, left_start, left_size) };
        start = left_start;
        total += left_size;
    }

    let tag = BlockTag::pack(total as u32, false);
    unsafe {
        write_u32(start, tag.raw());
        write_u32(start + total - TAG_SIZE, tag.raw());
        index::insert(base, start, total, size_at);
    }
    start
}
