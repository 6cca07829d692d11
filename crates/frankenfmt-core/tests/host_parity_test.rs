//! Differential checks against the host C library's `snprintf`.
//!
//! Only compiled on Linux, where glibc and musl both print exact decimal
//! expansions and share our rendering of `%p`-free conversions.
#![cfg(target_os = "linux")]
#![allow(unsafe_code)]

use std::ffi::{CString, c_char, c_double, c_int, c_long, c_longlong};

use frankenfmt_core::stdio::{Arg, format_to};

fn ours(format: &str, args: &[Arg<'_>]) -> (usize, Vec<u8>) {
    let mut buf = vec![0u8; 1024];
    let len = format_to(&mut buf, format.as_bytes(), args).unwrap();
    let stored = len.min(buf.len() - 1);
    (len, buf[..stored].to_vec())
}

fn host_double(format: &str, v: f64) -> (usize, Vec<u8>) {
    let fmt = CString::new(format).unwrap();
    let mut buf = vec![0u8; 1024];
    // SAFETY: the buffer is writable for its full length and the format takes
    // exactly one double.
    let n = unsafe {
        libc::snprintf(
            buf.as_mut_ptr().cast::<c_char>(),
            buf.len(),
            fmt.as_ptr(),
            v as c_double,
        )
    };
    assert!(n >= 0);
    let n = n as usize;
    (n, buf[..n.min(buf.len() - 1)].to_vec())
}

fn host_long(format: &str, v: i64) -> (usize, Vec<u8>) {
    let fmt = CString::new(format).unwrap();
    let mut buf = vec![0u8; 256];
    // SAFETY: the format takes exactly one long long.
    let n = unsafe {
        libc::snprintf(
            buf.as_mut_ptr().cast::<c_char>(),
            buf.len(),
            fmt.as_ptr(),
            v as c_longlong,
        )
    };
    assert!(n >= 0);
    let n = n as usize;
    (n, buf[..n.min(buf.len() - 1)].to_vec())
}

fn host_star_int(format: &str, width: c_int, v: c_long) -> (usize, Vec<u8>) {
    let fmt = CString::new(format).unwrap();
    let mut buf = vec![0u8; 256];
    // SAFETY: the format takes an int width followed by one long.
    let n = unsafe {
        libc::snprintf(
            buf.as_mut_ptr().cast::<c_char>(),
            buf.len(),
            fmt.as_ptr(),
            width,
            v,
        )
    };
    assert!(n >= 0);
    let n = n as usize;
    (n, buf[..n.min(buf.len() - 1)].to_vec())
}

const DOUBLES: &[f64] = &[
    0.0,
    -0.0,
    1.0,
    -1.5,
    0.1,
    0.5,
    2.5,
    1e-5,
    1e-4,
    123_456.0,
    1_234_567.0,
    1.0 / 3.0,
    core::f64::consts::PI,
    core::f64::consts::E,
    6.02214076e23,
    1.602176634e-19,
    9.999_999_5,
    0.000_999_95,
    f64::MAX,
    f64::MIN_POSITIVE,
    5e-324,
    1e300,
    1e-300,
];

const DOUBLE_FORMATS: &[&str] = &[
    "%f", "%.0f", "%.1f", "%.3f", "%.17f", "%#.0f", "%12.4f", "%-12.4f|", "%+012.3f", "% f",
    "%e", "%.0e", "%.3e", "%#.0e", "%E", "%.20e", "%g", "%.0g", "%.1g", "%.3g", "%#g",
    "%.17g", "%G", "%-10g|", "%010g",
];

#[test]
fn doubles_match_host() {
    for &format in DOUBLE_FORMATS {
        for &v in DOUBLES {
            assert_eq!(
                ours(format, &[Arg::from(v)]),
                host_double(format, v),
                "format {format:?} value {v:e}"
            );
        }
    }
}

#[test]
fn long_fixed_expansions_match_host() {
    for &v in &[5e-324, 2.2250738585072014e-308, 0.1, 1.0 / 3.0] {
        assert_eq!(
            ours("%.800f", &[Arg::from(v)]),
            host_double("%.800f", v),
            "value {v:e}"
        );
    }
    assert_eq!(ours("%.0f", &[Arg::from(f64::MAX)]), host_double("%.0f", f64::MAX));
}

#[test]
fn hex_floats_match_host_at_full_precision() {
    // Subnormals are printed normalized here; glibc keeps a 0x0. lead digit.
    for &v in DOUBLES.iter().filter(|v| !v.is_subnormal()) {
        assert_eq!(
            ours("%.13a", &[Arg::from(v)]),
            host_double("%.13a", v),
            "value {v:e}"
        );
    }
}

#[test]
fn integers_match_host() {
    let formats = [
        "%lld", "%+lld", "% lld", "%20lld", "%-20lld|", "%020lld", "%.25lld", "%llx", "%#llx",
        "%#llX", "%llo", "%#llo", "%#.0llo", "%.0lld", "%llu", "%hhd", "%hd", "%hhu", "%hu",
    ];
    let values = [0, 1, -1, 42, -42, 255, 4096, i64::from(i32::MIN), i64::MAX, i64::MIN];
    for format in formats {
        for v in values {
            assert_eq!(
                ours(format, &[Arg::from(v)]),
                host_long(format, v),
                "format {format:?} value {v}"
            );
        }
    }
}

#[test]
fn star_width_matches_host() {
    for width in [-12, -1, 0, 1, 7, 30] {
        for v in [0, -9, 123_456] {
            assert_eq!(
                ours("[%*ld]", &[Arg::from(width), Arg::from(v as i64)]),
                host_star_int("[%*ld]", width, v),
                "width {width} value {v}"
            );
        }
    }
}
