#![no_main]
use frankenfmt_core::{Arg, format_to};
use libfuzzer_sys::fuzz_target;

const CONVERSIONS: [u8; 8] = *b"feEgGaAF";

fuzz_target!(|data: &[u8]| {
    // 8 bytes of float bits, then conversion, flags and precision selectors.
    let Some((bits, rest)) = data.split_first_chunk::<8>() else {
        return;
    };
    let [conv, flags, prec, ..] = *rest else {
        return;
    };
    let value = f64::from_bits(u64::from_le_bytes(*bits));

    let mut fmt = Vec::with_capacity(16);
    fmt.push(b'%');
    for (bit, flag) in b"-+ #0".iter().enumerate() {
        if flags & (1 << bit) != 0 {
            fmt.push(*flag);
        }
    }
    if flags & 0x80 != 0 {
        fmt.extend_from_slice(b"40");
    }
    fmt.push(b'.');
    fmt.extend_from_slice(prec.to_string().as_bytes());
    fmt.push(CONVERSIONS[usize::from(conv) % CONVERSIONS.len()]);

    let args = [Arg::Float(value)];
    let counted = format_to(&mut [], &fmt, &args).expect("float directive is valid");
    let mut buf = vec![0u8; counted + 1];
    let len = format_to(&mut buf, &fmt, &args).expect("float directive is valid");
    assert_eq!(len, counted, "count-only pass disagrees with stored length");
    assert_eq!(buf[len], 0);
    assert!(buf[..len].is_ascii());

    let exponent_form = matches!(CONVERSIONS[usize::from(conv) % CONVERSIONS.len()], b'e' | b'E');
    if value.is_finite() && exponent_form && prec >= 16 {
        let text = core::str::from_utf8(&buf[..len]).expect("ascii output");
        let parsed: f64 = text.trim().parse().expect("exponent output parses");
        assert_eq!(parsed.to_bits(), value.to_bits(), "{text} does not round-trip");
    }
});
