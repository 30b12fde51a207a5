//! Acquire/release/resize/zero-acquire (§4.6-4.9), composed from the
//! block, index, fit, place, and coalesce layers.

use core::ptr::NonNull;

pub use crate::arena::AllocatorConfig;
use crate::arena::{ArenaProvider, EPILOGUE_SIZE, PROLOGUE_SIZE};
use crate::block::{BlockTag, TAG_SIZE, normalize, round_up_8};
use crate::coalesce::coalesce;
use crate::fit;
use crate::index::{self, BUCKET_TABLE_BYTES};
use crate::klog::{klog_debug, klog_error};
use crate::place::place;
use crate::raw::{read_u32, write_u32};

/// The allocator engine: block layout, segregated index, coalescer,
/// placer, and fit finder composed into the four public operations.
///
/// Owns no memory directly — all managed bytes live in the `P: ArenaProvider`
/// it was built with.
pub struct Allocator<P: ArenaProvider> {
    provider: P,
    config: AllocatorConfig,
    /// Low end of the bucket-head table; also the bias base (§3.3).
    base: usize,
    /// Address of the first real block (immediately after the prologue).
    heap_start: usize,
    /// Cached high-water mark; kept in sync with `provider.arena_hi()`.
    arena_hi: usize,
}

fn size_at(addr: usize) -> usize {
    BlockTag::from_raw(unsafe { read_u32(addr) }).size() as usize
}

impl<P: ArenaProvider> Allocator<P> {
    /// Initializes the allocator over a fresh provider: reserves the
    /// bucket-head table, writes the prologue/epilogue sentinels, and
    /// extends the arena by one initial chunk to create the first free
    /// block (§4.1). Returns `None` if the provider cannot supply the
    /// initial bytes.
    pub fn init(mut provider: P, config: AllocatorConfig) -> Option<Self> {
        let base = provider.arena_lo();
        let prologue_bytes = round_up_8(BUCKET_TABLE_BYTES + PROLOGUE_SIZE + EPILOGUE_SIZE);
        let old_hi = provider.extend(prologue_bytes)?;
        debug_assert_eq!(old_hi, base, "provider must start with an empty arena");

        for bucket in 0..index::NUM_BUCKETS {
            unsafe { write_u32(index::bucket_head_addr(base, bucket), 0) };
        }

        let prologue_addr = base + BUCKET_TABLE_BYTES;
        let prologue_tag = BlockTag::pack(PROLOGUE_SIZE as u32, true);
        unsafe {
            write_u32(prologue_addr, prologue_tag.raw());
            write_u32(prologue_addr + TAG_SIZE, prologue_tag.raw());
        }

        let epilogue_addr = prologue_addr + PROLOGUE_SIZE;
        let epilogue_tag = BlockTag::pack(0, true);
        unsafe { write_u32(epilogue_addr, epilogue_tag.raw()) };

        let mut allocator = Self {
            provider,
            config,
            base,
            heap_start: prologue_addr,
            arena_hi: old_hi + prologue_bytes,
        };

        allocator.extend_arena(config.chunk_size)?;
        Some(allocator)
    }

    /// Extends the arena by at least `min_bytes`, creating one new free
    /// block whose header reuses the old epilogue's slot, and a fresh
    /// epilogue at the new top (§4.10). The new block is coalesced with
    /// its predecessor if that was free. Returns the (possibly merged)
    /// free block's address.
    fn extend_arena(&mut self, min_bytes: usize) -> Option<usize> {
        let rounded = round_up_8(min_bytes);
        let old_hi = self.provider.extend(rounded)?;
        debug_assert_eq!(old_hi, self.arena_hi);

        let new_block = old_hi - EPILOGUE_SIZE;
        let tag = BlockTag::pack(rounded as u32, false);
        unsafe {
            write_u32(new_block, tag.raw());
            write_u32(new_block + rounded - TAG_SIZE, tag.raw());
        }

        let new_epilogue = old_hi + rounded - EPILOGUE_SIZE;
        let epilogue_tag = BlockTag::pack(0, true);
        unsafe { write_u32(new_epilogue, epilogue_tag.raw()) };

        self.arena_hi = old_hi + rounded;

        unsafe { index::insert(self.base, new_block, rounded, size_at) };
        klog_debug!("extend: +{} bytes, arena_hi=0x{:x}", rounded, self.arena_hi);
        Some(unsafe { coalesce(self.base, new_block) })
    }

    /// Acquires at least `size` bytes. Returns `None` iff `size == 0` or
    /// the arena cannot be extended to satisfy the request.
    pub fn acquire(&mut self, size: usize) -> Option<NonNull<u8>> {
        let asize = normalize(size)?;

        let block = match fit::find(self.base, asize) {
            Some(block) => block,
            None => {
                let extend_size = asize.max(self.config.chunk_size);
                match self.extend_arena(extend_size) {
                    Some(block) => block,
                    None => {
                        klog_error!("acquire: out of memory requesting {} bytes", size);
                        return None;
                    }
                }
            }
        };

        unsafe { place(self.base, block, asize) };
        let payload = block + TAG_SIZE;
        Some(unsafe { NonNull::new_unchecked(payload as *mut u8) })
    }

    /// Releases a payload previously returned by `acquire`/`resize`. A
    /// `None` pointer is a no-op.
    pub fn release(&mut self, ptr: Option<NonNull<u8>>) {
        let Some(ptr) = ptr else { return };
        let block = ptr.as_ptr() as usize - TAG_SIZE;
        let size = size_at(block);

        let tag = BlockTag::pack(size as u32, false);
        unsafe {
            write_u32(block, tag.raw());
            write_u32(block + size - TAG_SIZE, tag.raw());
            // Link fields are about to be overwritten by whichever bucket
            // picks this block up; zeroing first keeps a freed block's
            // payload bytes deterministic until then.
            write_u32(block + 4, 0);
            write_u32(block + 8, 0);
            coalesce(self.base, block);
        }
    }

    /// Resizes the allocation at `ptr` to `size` bytes, preserving
    /// `min(size, old size)` bytes of content (§4.8). `ptr == None`
    /// behaves as `acquire(size)`; `size == 0` behaves as `release(ptr)`.
    pub fn resize(&mut self, ptr: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
        let Some(ptr) = ptr else {
            return self.acquire(size);
        };
        if size == 0 {
            self.release(Some(ptr));
            return None;
        }

        let asize = normalize(size).expect("size != 0 normalizes to Some");
        let block = ptr.as_ptr() as usize - TAG_SIZE;
        let old_size = size_at(block);

        if asize + crate::block::MIN_BLOCK_SIZE <= old_size {
            self.resize_shrink_with_split(block, asize, old_size);
            return Some(ptr);
        }
        if asize <= old_size {
            return Some(ptr);
        }
        if let Some(()) = self.resize_grow_in_place(block, asize, old_size) {
            return Some(ptr);
        }

        let new_ptr = self.acquire(size)?;
        let copy_len = size.min(old_size - 2 * TAG_SIZE);
        unsafe {
            core::ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), copy_len);
        }
        self.release(Some(ptr));
        Some(new_ptr)
    }

    fn resize_shrink_with_split(&mut self, block: usize, asize: usize, old_size: usize) {
        let tag = BlockTag::pack(asize as u32, true);
        unsafe {
            write_u32(block, tag.raw());
            write_u32(block + asize - TAG_SIZE, tag.raw());
        }

        let tail = block + asize;
        let tail_size = old_size - asize;
        let ttag = BlockTag::pack(tail_size as u32, false);
        unsafe {
            write_u32(tail, ttag.raw());
            write_u32(tail + tail_size - TAG_SIZE, ttag.raw());
            coalesce(self.base, tail);
        }
    }

    /// Attempts to grow `block` by absorbing a free right neighbor large
    /// enough to cover `asize`. Returns `Some(())` on success.
    fn resize_grow_in_place(&mut self, block: usize, asize: usize, old_size: usize) -> Option<()> {
        let right = block + old_size;
        let right_tag = BlockTag::from_raw(unsafe { read_u32(right) });
        if right_tag.is_allocated() {
            return None;
        }
        let right_size = right_tag.size() as usize;
        let combined = old_size + right_size;
        if combined < asize {
            return None;
        }

        unsafe { index::remove(self.base, right, right_size) };

        if combined >= asize + crate::block::MIN_BLOCK_SIZE {
            let tag = BlockTag::pack(asize as u32, true);
            unsafe {
                write_u32(block, tag.raw());
                write_u32(block + asize - TAG_SIZE, tag.raw());
            }
            let tail = block + asize;
            let tail_size = combined - asize;
            let ttag = BlockTag::pack(tail_size as u32, false);
            unsafe {
                write_u32(tail, ttag.raw());
                write_u32(tail + tail_size - TAG_SIZE, ttag.raw());
                index::insert(self.base, tail, tail_size, size_at);
            }
        } else {
            let tag = BlockTag::pack(combined as u32, true);
            unsafe {
                write_u32(block, tag.raw());
                write_u32(block + combined - TAG_SIZE, tag.raw());
            }
        }
        Some(())
    }

    /// Acquires room for `n * s` bytes and zero-initializes it. Overflow
    /// in the multiplication is treated as acquisition failure.
    pub fn zero_acquire(&mut self, n: usize, s: usize) -> Option<NonNull<u8>> {
        let total = n.checked_mul(s)?;
        let ptr = self.acquire(total)?;
        unsafe { core::ptr::write_bytes(ptr.as_ptr(), 0, total) };
        Some(ptr)
    }

    /// The arena's low address (start of the bucket-head table).
    pub fn arena_lo(&self) -> usize {
        self.base
    }

    /// The arena's current high-water mark.
    pub fn arena_hi(&self) -> usize {
        self.arena_hi
    }

    /// Address of the first real (post-prologue) block; used by the
    /// integrity checker to start its heap walk.
    pub(crate) fn heap_start(&self) -> usize {
        self.heap_start
    }

    /// Runs the integrity checker (§4.11) against the current heap state.
    #[track_caller]
    pub fn check(&self) -> Result<(), crate::CheckViolation> {
        crate::check::check(self)
    }
}
