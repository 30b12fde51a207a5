//! Black-box scenarios against the public `Allocator` API, run over a
//! `FixedArena` large enough that none of them hit real memory pressure.

use segalloc::{Allocator, AllocatorConfig};
use segalloc::host::FixedArena;

fn new_allocator(capacity: usize) -> Allocator<FixedArena> {
    let arena = FixedArena::new(capacity);
    Allocator::init(arena, AllocatorConfig { chunk_size: 256 })
        .expect("fixed arena has room for the initial chunk")
}

unsafe fn fill(ptr: *mut u8, len: usize, byte: u8) {
    unsafe { core::ptr::write_bytes(ptr, byte, len) };
}

unsafe fn all_bytes_are(ptr: *const u8, len: usize, byte: u8) -> bool {
    (0..len).all(|i| unsafe { *ptr.add(i) } == byte)
}

#[test]
fn release_coalesces_with_both_neighbors() {
    let mut a = new_allocator(4096);

    let p1 = a.acquire(32).unwrap();
    let p2 = a.acquire(32).unwrap();
    let p3 = a.acquire(32).unwrap();

    a.release(Some(p1));
    a.release(Some(p3));
    assert!(a.check().is_ok());

    // Freeing the middle block should merge it with both now-free
    // neighbors into one block big enough for a much larger request
    // without the arena growing to satisfy it.
    let before = a.arena_hi();
    a.release(Some(p2));
    assert!(a.check().is_ok());

    let big = a.acquire(32 * 3 - 16).unwrap();
    assert_eq!(a.arena_hi(), before, "coalesced block should satisfy this without extending");
    a.release(Some(big));
}

#[test]
fn freed_slot_is_reused_without_growing_the_arena() {
    let mut a = new_allocator(4096);

    let p1 = a.acquire(64).unwrap();
    let hi_after_first = a.arena_hi();

    a.release(Some(p1));
    let p2 = a.acquire(64).unwrap();

    assert_eq!(a.arena_hi(), hi_after_first, "reusing a freed block must not extend the arena");
    assert_eq!(p1.as_ptr(), p2.as_ptr(), "the only free block of this size is the one just freed");
    a.release(Some(p2));
}

#[test]
fn resize_grows_by_absorbing_a_free_right_neighbor_in_place() {
    let mut a = new_allocator(4096);

    let p = a.acquire(32).unwrap();
    let neighbor = a.acquire(256).unwrap();
    unsafe { fill(p.as_ptr(), 32, 0xAB) };

    a.release(Some(neighbor));
    let grown = a.resize(Some(p), 200).expect("right neighbor has room to absorb");

    assert_eq!(grown.as_ptr(), p.as_ptr(), "growing into a free right neighbor must not move the block");
    assert!(unsafe { all_bytes_are(grown.as_ptr(), 32, 0xAB) }, "original bytes must survive an in-place grow");
    assert!(a.check().is_ok());
    a.release(Some(grown));
}

#[test]
fn resize_relocates_when_growth_does_not_fit_in_place() {
    let mut a = new_allocator(4096);

    let p1 = a.acquire(32).unwrap();
    let p2 = a.acquire(32).unwrap();
    unsafe { fill(p1.as_ptr(), 32, 0xCD) };
    // p2 keeps p1 from absorbing a free right neighbor, forcing a
    // relocation to grow.
    let grown = a.resize(Some(p1), 512).expect("arena has room to relocate into");

    assert_ne!(grown.as_ptr(), p1.as_ptr(), "growth past the right neighbor must relocate");
    assert!(unsafe { all_bytes_are(grown.as_ptr(), 32, 0xCD) }, "relocation must preserve the original bytes");
    assert!(a.check().is_ok());

    a.release(Some(grown));
    a.release(Some(p2));
}

#[test]
fn zero_acquire_zeroes_the_returned_region() {
    let mut a = new_allocator(4096);

    let p = a.acquire(64).unwrap();
    unsafe { fill(p.as_ptr(), 64, 0xFF) };
    a.release(Some(p));

    // Reuses the same freed block, which still has garbage (0xFF) bytes
    // in it from the previous occupant.
    let zeroed = a.zero_acquire(8, 8).unwrap();
    assert!(unsafe { all_bytes_are(zeroed.as_ptr(), 64, 0) });
    a.release(Some(zeroed));
}

#[test]
fn resize_with_null_pointer_behaves_as_acquire() {
    let mut a = new_allocator(4096);
    let p = a.resize(None, 48).expect("resize(None, n) acquires");
    assert!(a.check().is_ok());
    a.release(Some(p));
}

#[test]
fn resize_to_zero_behaves_as_release() {
    let mut a = new_allocator(4096);
    let p = a.acquire(48).unwrap();
    assert!(a.resize(Some(p), 0).is_none());
    assert!(a.check().is_ok());
}

#[test]
fn acquire_zero_is_a_no_op() {
    let mut a = new_allocator(4096);
    assert!(a.acquire(0).is_none());
}

#[test]
fn shuffled_allocation_and_release_preserves_integrity_and_disjointness() {
    let mut a = new_allocator(1 << 20);
    let mut live: Vec<(core::ptr::NonNull<u8>, usize, u8)> = Vec::new();
    let mut tag: u8 = 1;

    for round in 0..1000usize {
        // A deterministic "shuffle": alternate between growing the live
        // set and thinning it out, so both acquisition and release paths
        // (and the coalescing they trigger) get exercised repeatedly.
        let acquiring = round % 3 != 0 || live.is_empty();

        if acquiring {
            let size = 8 + (round * 37) % 500;
            if let Some(p) = a.acquire(size) {
                unsafe { fill(p.as_ptr(), size, tag) };
                live.push((p, size, tag));
                tag = tag.wrapping_add(1);
            }
        } else {
            let idx = (round * 13) % live.len();
            let (p, size, byte) = live.swap_remove(idx);
            assert!(unsafe { all_bytes_are(p.as_ptr(), size, byte) }, "live block corrupted before release");
            a.release(Some(p));
        }

        if round % 50 == 0 {
            assert!(a.check().is_ok(), "heap integrity check failed at round {round}");
        }
    }

    // Every surviving block's contents must still be exactly what was
    // written to it — no two acquired regions ever aliased.
    for (p, size, byte) in &live {
        assert!(unsafe { all_bytes_are(p.as_ptr(), *size, *byte) });
    }
    for (p, _, _) in live {
        a.release(Some(p));
    }
    assert!(a.check().is_ok());
}
