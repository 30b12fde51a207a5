//! Placer/splitter (§4.4): commits a free block to a request.

use crate::block::{BlockTag, MIN_BLOCK_SIZE, TAG_SIZE};
use crate::index;
use crate::raw::{read_u32, write_u32};

fn size_at(addr: usize) -> usize {
    BlockTag::from_raw(unsafe { read_u32(addr) }).size() as usize
}

/// Commits the free block at `block` (of size `c`) to a request for
/// `asize` bytes, splitting off a remainder free block when at least
/// [`MIN_BLOCK_SIZE`] bytes would be left over.
///
/// # Safety
///
/// `block` must be a free block of size `c` currently linked into its
/// bucket.
pub unsafe fn place(base: usize, block: usize, asize: usize) {
    let c = size_at(block);
    unsafe { index::remove(base, block, c) };

    if c - asize >= MIN_BLOCK_SIZE {
        let tag = BlockTag::pack(asize as u32, true);
        unsafe {
            write_u32(block, tag.raw());
            write_u32(block + asize - TAG_SIZE, tag.raw());
        }

        let remainder = block + asize;
        let remainder_size = c - asize;
        let rtag = BlockTag::pack(remainder_size as u32, false);
        unsafe {
            write_u32(remainder, rtag.raw());
            write_u32(remainder + remainder_size - TAG_SIZE, rtag.raw());
            // The remainder's right neighbor was allocated (it was part of
            // one contiguous free block a moment ago), so a direct insert
            // suffices — no coalesce needed here.
            index::insert(base, remainder, remainder_size, size_at);
        }
    } else {
        let tag = BlockTag::pack(c as u32, true);
        unsafe {
            write_u32(block, tag.raw());
            write_u32(block + c - TAG_SIZE, tag.raw());
        }
    }
}
