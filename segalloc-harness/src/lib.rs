//! A trace-driven replay harness for [`segalloc`]: a trace is a flat
//! sequence of allocator operations keyed by small integer handles, and
//! replaying one against a fresh [`Allocator`] both exercises the engine
//! and reports how well it used the arena it was given.
//!
//! A thin std layer over the no_std engine, built the way the rest of
//! this workspace is.

use std::collections::HashMap;
use std::fmt;

use segalloc::host::FixedArena;
use segalloc::{Allocator, AllocatorConfig};

/// One line of a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// `a <id> <size>` — acquire `size` bytes, remember the result as `id`.
    Acquire { id: u32, size: usize },
    /// `r <id>` — release the block remembered as `id`.
    Release { id: u32 },
    /// `e <id> <size>` — resize the block remembered as `id` to `size`
    /// bytes (`e` for "extend", to avoid colliding with `r`elease).
    Resize { id: u32, size: usize },
    /// `z <id> <n> <size>` — zero-acquire `n * size` bytes as `id`.
    ZeroAcquire { id: u32, n: usize, size: usize },
    /// `c` — run the integrity checker.
    Check,
}

#[derive(Debug)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// A parsed sequence of operations.
#[derive(Clone, Debug, Default)]
pub struct Trace {
    pub ops: Vec<Op>,
}

/// Parses a trace from its text form. Blank lines and lines starting with
/// `#` are ignored.
pub fn parse(text: &str) -> Result<Trace, ParseError> {
    let mut ops = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let err = |message: String| ParseError { line: line_no, message };
        let parse_u32 = |s: &str| -> Result<u32, ParseError> {
            s.parse().map_err(|_| err(format!("expected an integer id, got {s:?}")))
        };
        let parse_usize = |s: &str| -> Result<usize, ParseError> {
            s.parse().map_err(|_| err(format!("expected an integer size, got {s:?}")))
        };

        let op = match fields.as_slice() {
            ["a", id, size] => Op::Acquire { id: parse_u32(id)?, size: parse_usize(size)? },
            ["r", id] => Op::Release { id: parse_u32(id)? },
            ["e", id, size] => Op::Resize { id: parse_u32(id)?, size: parse_usize(size)? },
            ["z", id, n, size] => {
                Op::ZeroAcquire { id: parse_u32(id)?, n: parse_usize(n)?, size: parse_usize(size)? }
            }
            ["c"] => Op::Check,
            _ => return Err(err(format!("unrecognized trace line: {line:?}"))),
        };
        ops.push(op);
    }

    Ok(Trace { ops })
}

#[derive(Debug)]
pub enum ReplayError {
    /// An `acquire`/`resize`/`zero_acquire` op returned `None` (the arena
    /// couldn't be grown far enough to satisfy it).
    OutOfMemory { op_index: usize },
    /// An op referenced an `id` with no live block (a double-release, or
    /// a `resize`/`release` of an id never acquired).
    UnknownId { op_index: usize, id: u32 },
    /// A `c` op found a structural violation.
    CheckFailed { op_index: usize, violation: segalloc::CheckViolation },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { op_index } => write!(f, "op {op_index}: arena exhausted"),
            Self::UnknownId { op_index, id } => write!(f, "op {op_index}: unknown id {id}"),
            Self::CheckFailed { op_index, violation } => {
                write!(f, "op {op_index}: integrity check failed: {violation}")
            }
        }
    }
}

impl std::error::Error for ReplayError {}

/// Summary statistics from a completed replay.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReplayReport {
    pub ops_completed: usize,
    pub checks_run: usize,
    /// Highest `arena_hi - arena_lo` observed during the replay.
    pub peak_arena_bytes: usize,
    /// Sum of client-requested payload bytes currently live at the end of
    /// the replay (ignores header/footer/link overhead and fragmentation).
    pub live_payload_bytes: usize,
}

/// Replays `trace` against a fresh [`Allocator`] backed by a [`FixedArena`]
/// of `arena_capacity` bytes.
pub fn replay(trace: &Trace, arena_capacity: usize) -> Result<ReplayReport, ReplayError> {
    let arena = FixedArena::new(arena_capacity);
    let mut allocator = Allocator::init(arena, AllocatorConfig::default())
        .expect("arena_capacity must be large enough for the allocator's initial chunk");

    let mut live: HashMap<u32, (core::ptr::NonNull<u8>, usize)> = HashMap::new();
    let mut report = ReplayReport::default();

    for (op_index, op) in trace.ops.iter().enumerate() {
        match *op {
            Op::Acquire { id, size } => {
                let ptr = allocator.acquire(size).ok_or(ReplayError::OutOfMemory { op_index })?;
                live.insert(id, (ptr, size));
            }
            Op::Release { id } => {
                let (ptr, _) =
                    live.remove(&id).ok_or(ReplayError::UnknownId { op_index, id })?;
                allocator.release(Some(ptr));
            }
            Op::Resize { id, size } => {
                let (ptr, _) =
                    live.remove(&id).ok_or(ReplayError::UnknownId { op_index, id })?;
                let new_ptr = allocator
                    .resize(Some(ptr), size)
                    .ok_or(ReplayError::OutOfMemory { op_index })?;
                live.insert(id, (new_ptr, size));
            }
            Op::ZeroAcquire { id, n, size } => {
                let ptr = allocator
                    .zero_acquire(n, size)
                    .ok_or(ReplayError::OutOfMemory { op_index })?;
                live.insert(id, (ptr, n * size));
            }
            Op::Check => {
                allocator
                    .check()
                    .map_err(|violation| ReplayError::CheckFailed { op_index, violation })?;
                report.checks_run += 1;
            }
        }

        report.ops_completed += 1;
        let arena_bytes = allocator.arena_hi() - allocator.arena_lo();
        report.peak_arena_bytes = report.peak_arena_bytes.max(arena_bytes);
    }

    report.live_payload_bytes = live.values().map(|(_, size)| size).sum();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_op_kind() {
        let trace = parse(
            "\
            # a comment\n\
            a 1 32\n\
            \n\
            r 1\n\
            e 2 64\n\
            z 3 4 8\n\
            c\n\
            ",
        )
        .unwrap();

        assert_eq!(
            trace.ops,
            vec![
                Op::Acquire { id: 1, size: 32 },
                Op::Release { id: 1 },
                Op::Resize { id: 2, size: 64 },
                Op::ZeroAcquire { id: 3, n: 4, size: 8 },
                Op::Check,
            ]
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse("a 1\n").is_err());
        assert!(parse("q 1 2\n").is_err());
    }

    #[test]
    fn replays_a_simple_trace_and_reports_utilization() {
        let trace = parse("a 1 64\na 2 64\nr 1\nc\n").unwrap();
        let report = replay(&trace, 1 << 16).unwrap();

        assert_eq!(report.ops_completed, 4);
        assert_eq!(report.checks_run, 1);
        assert_eq!(report.live_payload_bytes, 64);
        assert!(report.peak_arena_bytes > 0);
    }

    #[test]
    fn releasing_an_unknown_id_is_reported() {
        let trace = parse("r 9\n").unwrap();
        match replay(&trace, 4096) {
            Err(ReplayError::UnknownId { id, .. }) => assert_eq!(id, 9),
            other => panic!("expected UnknownId, got {other:?}"),
        }
    }
}
