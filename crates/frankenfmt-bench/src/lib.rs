//! Shared workloads for the frankenfmt benchmarks.
//!
//! Each workload is a format string plus the arguments it consumes, so the
//! same corpus drives both the engine and the host `snprintf` comparison.

use frankenfmt_core::Arg;

/// Doubles spanning the interesting float paths: small integers, values
/// needing many digits, extreme exponents and a subnormal.
pub const DOUBLES: [f64; 8] = [
    0.0,
    1.0,
    0.1,
    3.141_592_653_589_793,
    123_456_789.012_345_68,
    1e300,
    2.225_073_858_507_201_4e-308,
    4.940_656_458_412_465_4e-324,
];

/// A named integer workload.
pub struct IntCase {
    pub name: &'static str,
    pub format: &'static [u8],
    pub value: i64,
}

/// Integer workloads covering each radix and the padding paths.
pub const INT_CASES: [IntCase; 6] = [
    IntCase { name: "d_small", format: b"%d", value: 42 },
    IntCase { name: "lld_min", format: b"%lld", value: i64::MIN },
    IntCase { name: "x_alt", format: b"%#llx", value: 0x0dea_dbee_f000_1234 },
    IntCase { name: "o_wide", format: b"%22llo", value: i64::MAX },
    IntCase { name: "b_prec", format: b"%.40llb", value: 0x5555 },
    IntCase { name: "d_zero_pad", format: b"%+020lld", value: -1_234_567 },
];

/// A mixed line resembling a log record.
pub const MIXED_FORMAT: &[u8] = b"[%s] %-8s pid=%5d t=%.6f addr=%p msg=%.*s\n";

/// Arguments for [`MIXED_FORMAT`].
#[must_use]
pub fn mixed_args() -> [Arg<'static>; 7] {
    [
        Arg::from("2026-10-19T00:00:00Z"),
        Arg::from("INFO"),
        Arg::from(4_711_i32),
        Arg::from(0.125_f64),
        Arg::Ptr(0x7fff_0000_1000),
        Arg::from(12_i32),
        Arg::from("connection established"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workloads_format_cleanly() {
        let mut buf = [0u8; 256];
        for case in &INT_CASES {
            let len = frankenfmt_core::format_to(&mut buf, case.format, &[Arg::Int(case.value)]);
            assert!(len.is_ok(), "{}", case.name);
        }
        let len = frankenfmt_core::format_to(&mut buf, MIXED_FORMAT, &mixed_args()).unwrap();
        assert!(buf[..len].starts_with(b"[2026-10-19T00:00:00Z] INFO     pid= 4711 t=0.125000 "));
        assert!(buf[..len].ends_with(b"msg=connection e\n"));
    }
}
