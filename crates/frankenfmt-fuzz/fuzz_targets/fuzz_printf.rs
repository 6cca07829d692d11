#![no_main]
use frankenfmt_core::{Arg, ArgCursor, Mode, format_to_mode};
use libfuzzer_sys::fuzz_target;

const WIDE: usize = 4096;

fuzz_target!(|data: &[u8]| {
    // First byte picks the small buffer size, second the mode; the rest is
    // the format string.
    let [cap, mode, fmt @ ..] = data else {
        return;
    };
    let cap = usize::from(*cap);
    let mode = if mode & 1 == 0 { Mode::Strict } else { Mode::Legacy };

    let inner = [Arg::Int(-7), Arg::from("in"), Arg::Float(0.5)];
    let args = [
        Arg::Int(-42),
        Arg::Uint(u64::MAX),
        Arg::Float(1.0e-7),
        Arg::from("text"),
        Arg::Ptr(0xdead_beef),
        Arg::from("%d%s"),
        Arg::Cursor(ArgCursor::new(&inner)),
        Arg::Float(f64::NAN),
        Arg::Int(3),
    ];

    let mut small = vec![0xA5u8; cap];
    let mut wide = vec![0xA5u8; WIDE];
    let short = format_to_mode(mode, &mut small, fmt, &args);
    let full = format_to_mode(mode, &mut wide, fmt, &args);
    assert_eq!(short, full, "result depends on buffer size");

    let stored = match full {
        Ok(len) => len.min(cap.saturating_sub(1)),
        Err(_) => small.iter().position(|&b| b == 0).unwrap_or(cap),
    };
    if cap > 0 {
        assert_eq!(small[stored], 0, "missing terminator");
        assert!(stored < cap);
    }
    if full.is_ok_and(|len| len < WIDE) {
        assert_eq!(small[..stored], wide[..stored], "truncated output is not a prefix");
    }
});
