//! Integer conversions: `%d %i %u %o %x %X %b`, plus `%c %s %p`.
//!
//! Reference: ISO C11 7.21.6.1 paragraphs 6 and 8.
//!
//! The caller widens the argument to a 64-bit magnitude and a sign; nothing
//! here knows about length modifiers.

use crate::stdio::sink::OutputSink;
use crate::stdio::spec::{FormatSpec, Precision};

/// Worst case digit count: base 2 over the widest integer, plus one.
const DIGIT_BUF: usize = u64::BITS as usize + 1;

/// Radix of an integer conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    Binary = 2,
    Octal = 8,
    Decimal = 10,
    Hex = 16,
}

/// Render an integer field.
///
/// The flags must already be normalized for the conversion: `+`/space only
/// survive for signed conversions and `0` is cleared when a precision is
/// given.
pub fn format_integer(
    sink: &mut OutputSink<'_>,
    magnitude: u64,
    negative: bool,
    base: Base,
    spec: &FormatSpec,
) {
    let flags = spec.flags;
    let precision = spec.precision();
    let width = spec.width();

    let mut digits = [0u8; DIGIT_BUF];
    let mut digit_count = render_digits(magnitude, base as u64, flags.uppercase, &mut digits);
    // Explicit precision 0 with value 0: no digits, except `%#.0o`.
    if magnitude == 0 && precision == Some(0) && !(base == Base::Octal && flags.alt_form) {
        digit_count = 0;
    }

    let mut prefix = [0u8; 3];
    let mut prefix_len = 0;
    let sign = if negative {
        Some(b'-')
    } else if flags.force_sign {
        Some(b'+')
    } else if flags.space_sign {
        Some(b' ')
    } else {
        None
    };
    if let Some(sign) = sign {
        prefix[prefix_len] = sign;
        prefix_len += 1;
    }
    if flags.alt_form && magnitude != 0 {
        let alt: &[u8] = match base {
            Base::Hex if flags.uppercase => b"0X",
            Base::Hex => b"0x",
            Base::Binary => b"0b",
            // Only when precision padding will not already lead with a zero.
            Base::Octal if precision.unwrap_or(0) <= digit_count => b"0",
            _ => b"",
        };
        prefix[prefix_len..prefix_len + alt.len()].copy_from_slice(alt);
        prefix_len += alt.len();
    }

    let min_digits = if flags.zero_pad && !flags.left_justify {
        width.saturating_sub(prefix_len)
    } else {
        precision.unwrap_or(0)
    };
    let zeros = min_digits.saturating_sub(digit_count);
    let content_len = prefix_len + zeros + digit_count;
    let pad_total = width.saturating_sub(content_len);

    if !flags.left_justify {
        sink.put_repeat(b' ', pad_total);
    }
    sink.put_bytes(&prefix[..prefix_len]);
    sink.put_repeat(b'0', zeros);
    sink.put_bytes(&digits[DIGIT_BUF - digit_count..]);
    if flags.left_justify {
        sink.put_repeat(b' ', pad_total);
    }
}

/// Render a string argument. Stops at the first NUL; precision caps the length.
pub fn format_str(sink: &mut OutputSink<'_>, s: &[u8], spec: &FormatSpec) {
    let s = until_nul(s);
    let effective = match spec.precision() {
        Some(p) => &s[..s.len().min(p)],
        None => s,
    };
    pad_field(sink, effective, spec);
}

/// Render one byte.
pub fn format_char(sink: &mut OutputSink<'_>, c: u8, spec: &FormatSpec) {
    pad_field(sink, &[c], spec);
}

/// Render an address as zero-padded upper-case hex, `2 * size_of::<usize>()`
/// digits wide. `#` adds a `0X` prefix.
pub fn format_pointer(sink: &mut OutputSink<'_>, addr: usize, spec: &FormatSpec) {
    let mut fixed = *spec;
    fixed.flags.uppercase = true;
    fixed.flags.zero_pad = true;
    fixed.flags.left_justify = false;
    fixed.flags.force_sign = false;
    fixed.flags.space_sign = false;
    let digits = 2 * core::mem::size_of::<usize>();
    let prefix = if spec.flags.alt_form { 2 } else { 0 };
    fixed = fixed.with_width(digits + prefix);
    fixed.precision = Precision::None;
    format_integer(sink, addr as u64, false, Base::Hex, &fixed);
}

/// The C-string view of `s`: everything before the first NUL.
pub(crate) fn until_nul(s: &[u8]) -> &[u8] {
    match s.iter().position(|&b| b == 0) {
        Some(end) => &s[..end],
        None => s,
    }
}

fn pad_field(sink: &mut OutputSink<'_>, body: &[u8], spec: &FormatSpec) {
    let pad_total = spec.width().saturating_sub(body.len());
    if !spec.flags.left_justify {
        sink.put_repeat(b' ', pad_total);
    }
    sink.put_bytes(body);
    if spec.flags.left_justify {
        sink.put_repeat(b' ', pad_total);
    }
}

/// Render `value` in the given `base` into the END of `buf`.
/// Returns the number of digits written. Digits are placed right-aligned.
fn render_digits(mut value: u64, base: u64, uppercase: bool, buf: &mut [u8; DIGIT_BUF]) -> usize {
    if value == 0 {
        buf[DIGIT_BUF - 1] = b'0';
        return 1;
    }
    let alpha = if uppercase { b'A' } else { b'a' };
    let mut pos = DIGIT_BUF;
    while value > 0 {
        pos -= 1;
        let digit = (value % base) as u8;
        buf[pos] = if digit < 10 {
            b'0' + digit
        } else {
            alpha + (digit - 10)
        };
        value /= base;
    }
    DIGIT_BUF - pos
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
