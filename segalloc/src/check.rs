//! Integrity checker (§4.11): debug-time invariant verification.
//!
//! Verifies, in order: prologue/epilogue shape, header==footer and
//! size/alignment for every block, no two consecutive free blocks, every
//! free block lives in exactly one bucket whose range contains its size,
//! free-list pointer symmetry and non-decreasing size order, free-block
//! counts agreeing between the heap walk and the list walk, and every
//! link bias resolving inside the arena.
//!
//! The call site (file and line) of a failing check is captured via
//! `#[track_caller]` plus `core::panic::Location`, the idiomatic Rust
//! analogue of threading a `__LINE__`-style parameter through by hand.

use core::fmt;

use crate::arena::{ArenaProvider, EPILOGUE_SIZE, PROLOGUE_SIZE};
use crate::block::{ALIGNMENT, BlockTag, MIN_BLOCK_SIZE, TAG_SIZE};
use crate::engine::Allocator;
use crate::index::{self, NUM_BUCKETS, bucket_for_size};
use crate::klog::klog_error;
use crate::raw::read_u32;

/// The first structural deviation an integrity check encountered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckViolation {
    PrologueShape,
    EpilogueShape,
    HeaderFooterMismatch { block: usize },
    SizeInvariant { block: usize },
    Unaligned { block: usize },
    ConsecutiveFreeBlocks { block: usize },
    BucketRangeViolation { block: usize, bucket: usize },
    ListAsymmetry { block: usize },
    ListNotSorted { block: usize },
    FreeCountMismatch { heap_walk: usize, list_walk: usize },
    LinkOutOfBounds { block: usize },
}

impl fmt::Display for CheckViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrologueShape => write!(f, "prologue block is malformed"),
            Self::EpilogueShape => write!(f, "epilogue block is malformed"),
            Self::HeaderFooterMismatch { block } => {
                write!(f, "header != footer at block 0x{block:x}")
            }
            Self::SizeInvariant { block } => {
                write!(f, "block 0x{block:x} violates the size invariant")
            }
            Self::Unaligned { block } => write!(f, "block 0x{block:x} is not 8-byte aligned"),
            Self::ConsecutiveFreeBlocks { block } => {
                write!(f, "block 0x{block:x} and its predecessor are both free")
            }
            Self::BucketRangeViolation { block, bucket } => {
                write!(f, "block 0x{block:x} is listed in bucket {bucket} outside its size range")
            }
            Self::ListAsymmetry { block } => {
                write!(f, "free-list pred/succ asymmetry around block 0x{block:x}")
            }
            Self::ListNotSorted { block } => {
                write!(f, "free list is not size-sorted at block 0x{block:x}")
            }
            Self::FreeCountMismatch { heap_walk, list_walk } => write!(
                f,
                "free block count mismatch: heap walk found {heap_walk}, list walk found {list_walk}"
            ),
            Self::LinkOutOfBounds { block } => {
                write!(f, "a free-list link at block 0x{block:x} points outside the arena")
            }
        }
    }
}

fn tag_at(addr: usize) -> BlockTag {
    BlockTag::from_raw(unsafe { read_u32(addr) })
}

fn footer_addr(block: usize, size: usize) -> usize {
    block + size - TAG_SIZE
}

fn payload_aligned(block: usize) -> bool {
    (block + TAG_SIZE) % ALIGNMENT == 0
}

/// Runs every structural invariant against `allocator`'s current state.
/// Returns the first violation found, if any. The call site (file and
/// line) is logged alongside it.
#[track_caller]
pub fn check<P: ArenaProvider>(allocator: &Allocator<P>) -> Result<(), CheckViolation> {
    let result = verify(allocator);
    if let Err(violation) = result {
        let caller = core::panic::Location::caller();
        klog_error!("heap check failed at {}:{}: {}", caller.file(), caller.line(), violation);
    }
    result
}

fn verify<P: ArenaProvider>(allocator: &Allocator<P>) -> Result<(), CheckViolation> {
    let base = allocator.arena_lo();
    let heap_start = allocator.heap_start();
    let arena_hi = allocator.arena_hi();

    verify_prologue(heap_start)?;
    let epilogue = verify_blocks_and_epilogue(heap_start, arena_hi)?;
    let heap_walk_count = count_free_via_heap_walk(heap_start, epilogue);
    let list_walk_count = verify_buckets(base, heap_start, arena_hi)?;

    if heap_walk_count != list_walk_count {
        return Err(CheckViolation::FreeCountMismatch {
            heap_walk: heap_walk_count,
            list_walk: list_walk_count,
        });
    }
    Ok(())
}

fn verify_prologue(prologue: usize) -> Result<(), CheckViolation> {
    let header = tag_at(prologue);
    let footer = tag_at(prologue + TAG_SIZE);
    if header.size() as usize != PROLOGUE_SIZE || !header.is_allocated() || header != footer {
        return Err(CheckViolation::PrologueShape);
    }
    if !payload_aligned(prologue) {
        return Err(CheckViolation::Unaligned { block: prologue });
    }
    Ok(())
}

/// Walks every real block from `heap_start` to the epilogue, checking
/// per-block invariants. Returns the epilogue's address.
fn verify_blocks_and_epilogue(heap_start: usize, arena_hi: usize) -> Result<usize, CheckViolation> {
    let mut block = heap_start + PROLOGUE_SIZE;
    let mut prev_free = false;

    loop {
        let header = tag_at(block);
        let size = header.size() as usize;

        if size == 0 {
            // Epilogue.
            if !header.is_allocated() || block + EPILOGUE_SIZE != arena_hi {
                return Err(CheckViolation::EpilogueShape);
            }
            return Ok(block);
        }

        if size < MIN_BLOCK_SIZE || size % ALIGNMENT != 0 {
            return Err(CheckViolation::SizeInvariant { block });
        }
        if !payload_aligned(block) {
            return Err(CheckViolation::Unaligned { block });
        }
        let footer = tag_at(footer_addr(block, size));
        if header != footer {
            return Err(CheckViolation::HeaderFooterMismatch { block });
        }

        let free = !header.is_allocated();
        if free && prev_free {
            return Err(CheckViolation::ConsecutiveFreeBlocks { block });
        }
        prev_free = free;

        block += size;
    }
}

fn count_free_via_heap_walk(heap_start: usize, epilogue: usize) -> usize {
    let mut block = heap_start + PROLOGUE_SIZE;
    let mut count = 0;
    while block < epilogue {
        let tag = tag_at(block);
        if !tag.is_allocated() {
            count += 1;
        }
        block += tag.size() as usize;
    }
    count
}

fn verify_buckets(base: usize, heap_start: usize, arena_hi: usize) -> Result<usize, CheckViolation> {
    let mut total = 0usize;

    for bucket in 0..NUM_BUCKETS {
        let mut prev: Option<usize> = None;
        let mut prev_size = 0usize;
        let mut cur_bias = index::head(base, bucket);

        while cur_bias != 0 {
            let cur = base + cur_bias as usize;
            if cur < heap_start || cur >= arena_hi {
                return Err(CheckViolation::LinkOutOfBounds { block: cur });
            }

            let size = tag_at(cur).size() as usize;
            if bucket_for_size(size) != bucket {
                return Err(CheckViolation::BucketRangeViolation { block: cur, bucket });
            }
            if size < prev_size {
                return Err(CheckViolation::ListNotSorted { block: cur });
            }
            prev_size = size;

            let pred_bias = index::pred(cur);
            let expected_pred = prev.map(|p| p - base).unwrap_or(0);
            if pred_bias as usize != expected_pred {
                return Err(CheckViolation::ListAsymmetry { block: cur });
            }

            total += 1;
            prev = Some(cur);
            cur_bias = index::succ(cur);
        }
    }

    Ok(total)
}
