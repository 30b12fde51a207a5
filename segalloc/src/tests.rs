//! Unit tests for the layers under the public API: block tags, bias
//! encoding, and bucket boundaries. End-to-end scenarios against the full
//! `Allocator` live in `tests/scenarios.rs`.

use crate::block::{self, BlockTag, MIN_BLOCK_SIZE, normalize, round_up_8};
use crate::bias::{addr_of, bias_of};
use crate::index::{NUM_BUCKETS, bucket_for_size};

#[test]
fn block_tag_roundtrips_size_and_allocated_bit() {
    let free = BlockTag::pack(32, false);
    assert_eq!(free.size(), 32);
    assert!(!free.is_allocated());

    let used = BlockTag::pack(64, true);
    assert_eq!(used.size(), 64);
    assert!(used.is_allocated());

    assert_eq!(BlockTag::from_raw(used.raw()), used);
}

#[test]
fn round_up_8_is_idempotent_on_multiples() {
    assert_eq!(round_up_8(0), 0);
    assert_eq!(round_up_8(1), 8);
    assert_eq!(round_up_8(8), 8);
    assert_eq!(round_up_8(9), 16);
    assert_eq!(round_up_8(24), 24);
}

#[test]
fn normalize_rejects_zero_and_enforces_minimum() {
    assert_eq!(normalize(0), None);
    // Tiny requests still need room for both tags and bottom out at
    // MIN_BLOCK_SIZE.
    assert_eq!(normalize(1), Some(MIN_BLOCK_SIZE));
    // 24 bytes of payload + 8 bytes of tags rounds to 32, already a
    // multiple of 8.
    assert_eq!(normalize(24), Some(32));
    assert_eq!(normalize(usize::MAX), None);
}

#[test]
fn bias_roundtrips_through_base() {
    let base = 0x1000;
    for addr in [0x1004usize, 0x1040, 0x20000] {
        let bias = bias_of(base, addr);
        assert_eq!(addr_of(base, bias), Some(addr));
    }
    assert_eq!(addr_of(base, 0), None);
}

#[test]
fn bucket_boundaries_are_contiguous_and_non_decreasing() {
    assert_eq!(bucket_for_size(16), 0);
    assert_eq!(bucket_for_size(32), 0);
    assert_eq!(bucket_for_size(33), 1);
    assert_eq!(bucket_for_size(64), 1);
    assert_eq!(bucket_for_size(65), 2);

    // Every size maps into a valid bucket, and bucket index is
    // non-decreasing in size.
    let mut prev_bucket = 0;
    let mut prev_size = 0;
    for size in (8..=1 << 16).step_by(8) {
        let bucket = bucket_for_size(size);
        assert!(bucket < NUM_BUCKETS);
        assert!(bucket >= prev_bucket, "bucket regressed at size {size}");
        prev_bucket = bucket;
        prev_size = size;
    }
    let _ = prev_size;

    // Anything absurdly large still lands in the top bucket, not out of
    // bounds.
    assert_eq!(bucket_for_size(usize::MAX / 2), NUM_BUCKETS - 1);
}

#[test]
fn block_constants_are_consistent() {
    assert!(MIN_BLOCK_SIZE >= 2 * block::TAG_SIZE);
    assert_eq!(MIN_BLOCK_SIZE % block::ALIGNMENT, 0);
}
