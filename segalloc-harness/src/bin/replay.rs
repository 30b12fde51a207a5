//! Command-line front end: `segalloc-replay <trace-file> [arena-bytes]`.

use std::{env, fs, process};

use segalloc_harness::{parse, replay};

fn main() {
    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: segalloc-replay <trace-file> [arena-bytes]");
        process::exit(2);
    };
    let arena_bytes: usize = args
        .next()
        .map(|s| s.parse().expect("arena-bytes must be a positive integer"))
        .unwrap_or(1 << 20);

    let text = fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("segalloc-replay: can't read {path}: {e}");
        process::exit(1);
    });

    let trace = parse(&text).unwrap_or_else(|e| {
        eprintln!("segalloc-replay: {path}: {e}");
        process::exit(1);
    });

    match replay(&trace, arena_bytes) {
        Ok(report) => {
            println!("ops completed:     {}", report.ops_completed);
            println!("checks run:        {}", report.checks_run);
            println!("peak arena bytes:  {}", report.peak_arena_bytes);
            println!("live payload bytes:{}", report.live_payload_bytes);
        }
        Err(e) => {
            eprintln!("segalloc-replay: {path}: {e}");
            process::exit(1);
        }
    }
}
