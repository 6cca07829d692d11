//! Floating-point conversions: `%f %F %e %E %g %G %a %A`.
//!
//! Reference: ISO C11 7.21.6.1 paragraph 8.
//!
//! Decimal output is exact and correctly rounded (half-to-even) at any
//! precision; see [`crate::stdio::decimal`]. Hex-float output works on the
//! integer significand. Neither path consults a host formatting routine.
//!
//! Design invariant: every field length is accounted in `i64` against
//! `i32::MAX` before the first byte of the field is emitted, so a failing
//! directive writes nothing (the driver then writes its error marker).

use crate::error::FieldOverflow;
use crate::stdio::decimal::{DecimalExpansion, Notation};
use crate::stdio::sink::OutputSink;
use crate::stdio::spec::{Conversion, FormatFlags, FormatSpec};

const MAX_LEN: i64 = i32::MAX as i64;
const DEFAULT_PRECISION: usize = 6;

const FRACTION_BITS: u32 = f64::MANTISSA_DIGITS - 1;
const FRACTION_MASK: u64 = (1 << FRACTION_BITS) - 1;
/// Hex digits after the point needed for an exact `f64` significand.
const FRACTION_NIBBLES: usize = (FRACTION_BITS as usize).div_ceil(4);

/// Render a float field.
pub fn format_float(
    sink: &mut OutputSink<'_>,
    value: f64,
    spec: &FormatSpec,
) -> Result<(), FieldOverflow> {
    let flags = spec.flags;
    let prefix = sign_prefix(value.is_sign_negative(), flags);

    if !value.is_finite() {
        let text: &[u8] = match (value.is_nan(), flags.uppercase) {
            (true, false) => b"nan",
            (true, true) => b"NAN",
            (false, false) => b"inf",
            (false, true) => b"INF",
        };
        // Zero padding never applies to nan/inf.
        let field = Field {
            width: spec.width(),
            len: prefix.len() + text.len(),
            flags: FormatFlags {
                zero_pad: false,
                ..flags
            },
        };
        field.open(sink, prefix);
        sink.put_bytes(text);
        field.close(sink);
        return Ok(());
    }

    match spec.conversion {
        Conversion::HexFloat => format_hex_float(sink, value, spec, prefix),
        Conversion::Exponent => format_decimal(sink, value, spec, prefix, Notation::Exponent),
        Conversion::General => format_decimal(sink, value, spec, prefix, Notation::General),
        _ => format_decimal(sink, value, spec, prefix, Notation::Fixed),
    }
}

fn sign_prefix(negative: bool, flags: FormatFlags) -> &'static [u8] {
    if negative {
        b"-"
    } else if flags.force_sign {
        b"+"
    } else if flags.space_sign {
        b" "
    } else {
        b""
    }
}

/// Width padding around a field of known length.
///
/// Order: spaces (right-justified), prefix, zeros (zero-padded), body,
/// spaces (left-justified).
struct Field {
    width: usize,
    len: usize,
    flags: FormatFlags,
}

impl Field {
    fn pad(&self) -> usize {
        self.width.saturating_sub(self.len)
    }

    fn open(&self, sink: &mut OutputSink<'_>, prefix: &[u8]) {
        if !self.flags.left_justify && !self.flags.zero_pad {
            sink.put_repeat(b' ', self.pad());
        }
        sink.put_bytes(prefix);
        if self.flags.zero_pad && !self.flags.left_justify {
            sink.put_repeat(b'0', self.pad());
        }
    }

    fn close(&self, sink: &mut OutputSink<'_>) {
        if self.flags.left_justify {
            sink.put_repeat(b' ', self.pad());
        }
    }
}

/// `[eEpP][+-]d...` with at least `min_digits` exponent digits.
struct ExponentText {
    buf: [u8; 12],
    start: usize,
}

impl ExponentText {
    fn new(letter: u8, exponent: i32, min_digits: usize) -> Self {
        let mut buf = [0u8; 12];
        let mut pos = buf.len();
        let mut magnitude = exponent.unsigned_abs();
        loop {
            pos -= 1;
            buf[pos] = b'0' + (magnitude % 10) as u8;
            magnitude /= 10;
            if magnitude == 0 && buf.len() - pos >= min_digits {
                break;
            }
        }
        pos -= 1;
        buf[pos] = if exponent < 0 { b'-' } else { b'+' };
        pos -= 1;
        buf[pos] = letter;
        Self { buf, start: pos }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[self.start..]
    }
}

// ---------------------------------------------------------------------------
// Decimal: %f %e %g
// ---------------------------------------------------------------------------

fn format_decimal(
    sink: &mut OutputSink<'_>,
    value: f64,
    spec: &FormatSpec,
    prefix: &[u8],
    notation: Notation,
) -> Result<(), FieldOverflow> {
    let alt = spec.flags.alt_form;
    let mut precision = spec.precision().unwrap_or(DEFAULT_PRECISION);

    let mut digits = DecimalExpansion::new(value.abs(), precision, notation);
    digits.round(precision, notation);
    let exponent = digits.exponent();

    let style = match notation {
        Notation::General => {
            // Precision becomes significant digits, then fraction digits.
            if precision == 0 {
                precision = 1;
            }
            let p = precision as i64;
            let e = i64::from(exponent);
            let style = if p > e && e >= -4 {
                precision = (p - e - 1) as usize;
                Notation::Fixed
            } else {
                precision -= 1;
                Notation::Exponent
            };
            if !alt {
                precision = precision.min(digits.significant_fraction_digits(style, exponent));
            }
            style
        }
        other => other,
    };

    let point = precision > 0 || alt;
    let mut len = 1 + precision as i64 + i64::from(point);
    let exponent_text = match style {
        Notation::Exponent => {
            let letter = if spec.flags.uppercase { b'E' } else { b'e' };
            let text = ExponentText::new(letter, exponent, 2);
            len += text.as_bytes().len() as i64;
            Some(text)
        }
        _ => {
            len += i64::from(exponent.max(0));
            None
        }
    };
    len += prefix.len() as i64;
    if len > MAX_LEN {
        return Err(FieldOverflow);
    }

    let field = Field {
        width: spec.width(),
        len: len as usize,
        flags: spec.flags,
    };
    field.open(sink, prefix);
    match exponent_text {
        Some(text) => {
            digits.write_mantissa(sink, precision, alt);
            sink.put_bytes(text.as_bytes());
        }
        None => digits.write_fixed(sink, precision, alt),
    }
    field.close(sink);
    Ok(())
}

// ---------------------------------------------------------------------------
// Hex float: %a
// ---------------------------------------------------------------------------

fn format_hex_float(
    sink: &mut OutputSink<'_>,
    value: f64,
    spec: &FormatSpec,
    sign: &[u8],
) -> Result<(), FieldOverflow> {
    let upper = spec.flags.uppercase;
    let (mut significand, exponent) = significand(value.abs());
    let precision = spec.precision();
    if let Some(p) = precision.filter(|&p| p < FRACTION_NIBBLES) {
        significand = round_significand(significand, p);
    }

    // Rounding may carry into a leading 2.
    let lead = (significand >> FRACTION_BITS) as u8;
    let fraction = significand & FRACTION_MASK;
    let mut nibbles = [0u8; FRACTION_NIBBLES];
    for (n, nibble) in nibbles.iter_mut().enumerate() {
        let shift = FRACTION_BITS as usize - 4 * (n + 1);
        *nibble = ((fraction >> shift) & 0xF) as u8;
    }
    let mut significant = FRACTION_NIBBLES;
    while significant > 0 && nibbles[significant - 1] == 0 {
        significant -= 1;
    }

    let fraction_digits = precision.unwrap_or(significant).max(significant);
    let point = fraction_digits > 0 || spec.flags.alt_form;
    let exponent_text = ExponentText::new(if upper { b'P' } else { b'p' }, exponent, 1);
    let prefix: &[u8] = match (sign, upper) {
        (b"-", false) => b"-0x",
        (b"-", true) => b"-0X",
        (b"+", false) => b"+0x",
        (b"+", true) => b"+0X",
        (b" ", false) => b" 0x",
        (b" ", true) => b" 0X",
        (_, false) => b"0x",
        (_, true) => b"0X",
    };

    let len = prefix.len() as i64
        + 1
        + i64::from(point)
        + fraction_digits as i64
        + exponent_text.as_bytes().len() as i64;
    if len > MAX_LEN {
        return Err(FieldOverflow);
    }

    let digit = |n: u8| {
        let alpha = if upper { b'A' } else { b'a' };
        if n < 10 { b'0' + n } else { alpha + (n - 10) }
    };
    let field = Field {
        width: spec.width(),
        len: len as usize,
        flags: spec.flags,
    };
    field.open(sink, prefix);
    sink.put(digit(lead));
    if point {
        sink.put(b'.');
    }
    for &n in &nibbles[..significant] {
        sink.put(digit(n));
    }
    sink.put_repeat(b'0', fraction_digits - significant);
    sink.put_bytes(exponent_text.as_bytes());
    field.close(sink);
    Ok(())
}

/// Integer significand in `[2^52, 2^53)` and binary exponent of a nonnegative
/// finite value, so that `x = significand * 2^(exponent - 52)`. Subnormals are
/// normalized; zero is `(0, 0)`.
fn significand(x: f64) -> (u64, i32) {
    let bits = x.to_bits();
    let biased = (bits >> FRACTION_BITS) as i32;
    let fraction = bits & FRACTION_MASK;
    if biased == 0 {
        if fraction == 0 {
            return (0, 0);
        }
        let shift = fraction.leading_zeros() - (u64::BITS - 1 - FRACTION_BITS);
        return (fraction << shift, -1022 - shift as i32);
    }
    (fraction | (1 << FRACTION_BITS), biased - 1023)
}

/// Round the significand to `nibbles` hex digits after the point, ties to even.
fn round_significand(significand: u64, nibbles: usize) -> u64 {
    let dropped = FRACTION_BITS - 4 * nibbles as u32;
    let unit = 1u64 << dropped;
    let rem = significand & (unit - 1);
    let kept = significand - rem;
    let half = unit >> 1;
    if rem > half || (rem == half && kept & unit != 0) {
        kept + unit
    } else {
        kept
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_for(conversion: u8) -> FormatSpec {
        let (kind, uppercase) = Conversion::from_byte(conversion).unwrap();
        let mut spec = FormatSpec::new(kind);
        spec.flags.uppercase = uppercase;
        spec
    }

    fn render(value: f64, spec: FormatSpec) -> String {
        let mut buf = vec![0u8; 2048];
        let mut sink = OutputSink::new(&mut buf);
        format_float(&mut sink, value, &spec).unwrap();
        String::from_utf8(sink.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_fixed_defaults() {
        assert_eq!(render(3.25, spec_for(b'f')), "3.250000");
        assert_eq!(render(-0.0, spec_for(b'f')), "-0.000000");
        assert_eq!(render(1.0, spec_for(b'f').with_precision(0)), "1");
    }

    #[test]
    fn test_fixed_alt_keeps_point() {
        let mut spec = spec_for(b'f').with_precision(0);
        spec.flags.alt_form = true;
        assert_eq!(render(2.0, spec), "2.");
    }

    #[test]
    fn test_exponent() {
        assert_eq!(render(1_505_000.0, spec_for(b'e').with_precision(2)), "1.50e+06");
        assert_eq!(render(0.0, spec_for(b'e')), "0.000000e+00");
        assert_eq!(render(1e-300, spec_for(b'E').with_precision(1)), "1.0E-300");
        assert_eq!(render(9.96, spec_for(b'e').with_precision(1)), "1.0e+01");
    }

    #[test]
    fn test_general_switches_notation() {
        assert_eq!(render(0.00001, spec_for(b'g')), "1e-05");
        assert_eq!(render(0.0001, spec_for(b'g')), "0.0001");
        assert_eq!(render(123456.0, spec_for(b'g')), "123456");
        assert_eq!(render(1234567.0, spec_for(b'g')), "1.23457e+06");
        assert_eq!(render(100.0, spec_for(b'G').with_precision(0)), "1E+02");
        assert_eq!(render(0.0, spec_for(b'g')), "0");
    }

    #[test]
    fn test_general_alt_keeps_trailing_zeros() {
        let mut spec = spec_for(b'g');
        spec.flags.alt_form = true;
        assert_eq!(render(1.5, spec), "1.50000");
    }

    #[test]
    fn test_special_values() {
        assert_eq!(render(f64::NAN, spec_for(b'f')), "nan");
        assert_eq!(render(-f64::NAN, spec_for(b'F')), "-NAN");
        assert_eq!(render(f64::INFINITY, spec_for(b'e')), "inf");
        let mut spec = spec_for(b'g').with_width(6);
        spec.flags.zero_pad = true;
        spec.flags.force_sign = true;
        assert_eq!(render(f64::INFINITY, spec), "  +inf");
        spec.flags.left_justify = true;
        spec.flags.zero_pad = false;
        assert_eq!(render(f64::NEG_INFINITY, spec), "-inf  ");
    }

    #[test]
    fn test_zero_padding_after_sign() {
        let mut spec = spec_for(b'f').with_width(9).with_precision(2);
        spec.flags.zero_pad = true;
        assert_eq!(render(-3.14159, spec), "-00003.14");
    }

    #[test]
    fn test_hex_float() {
        assert_eq!(render(1.0, spec_for(b'a')), "0x1p+0");
        assert_eq!(render(0.0, spec_for(b'a')), "0x0p+0");
        assert_eq!(render(-0.5, spec_for(b'A')), "-0X1P-1");
        assert_eq!(render(1.0, spec_for(b'a').with_precision(4)), "0x1.0000p+0");
        assert_eq!(render(f64::from_bits(1), spec_for(b'a')), "0x1p-1074");
        assert_eq!(render(f64::MAX, spec_for(b'a')), "0x1.fffffffffffffp+1023");
    }

    #[test]
    fn test_hex_float_rounding() {
        // 1 + 2^-5 = 0x1.08p+0: tie at one nibble rounds to even (0).
        assert_eq!(render(1.03125, spec_for(b'a').with_precision(1)), "0x1.0p+0");
        // 1 + 3 * 2^-5 = 0x1.18p+0: tie rounds to even (2).
        assert_eq!(render(1.09375, spec_for(b'a').with_precision(1)), "0x1.2p+0");
        assert_eq!(render(1.96875, spec_for(b'a').with_precision(0)), "0x2p+0");
        assert_eq!(render(1.5, spec_for(b'a').with_precision(0)), "0x2p+0");
    }

    #[test]
    fn test_exponent_text() {
        assert_eq!(ExponentText::new(b'e', 5, 2).as_bytes(), b"e+05");
        assert_eq!(ExponentText::new(b'e', -300, 2).as_bytes(), b"e-300");
        assert_eq!(ExponentText::new(b'p', 0, 1).as_bytes(), b"p+0");
        assert_eq!(ExponentText::new(b'p', i32::MIN, 1).as_bytes(), b"p-2147483648");
    }

    #[test]
    fn test_overflowing_precision_is_rejected_before_output() {
        let spec = spec_for(b'f').with_precision(i32::MAX as usize);
        let mut buf = [0u8; 16];
        let mut sink = OutputSink::new(&mut buf);
        assert_eq!(format_float(&mut sink, 1.0, &spec), Err(FieldOverflow));
        assert_eq!(sink.logical_len(), 0);
    }
}
