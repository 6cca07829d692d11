//! printf driver.
//!
//! Walks a format string, passes literal runs to the sink, parses each
//! directive, fetches its arguments from the cursor and routes it to the
//! integer or float formatter. `%r` re-enters the driver with a nested
//! format string and a cursor snapshot, writing through the same sink.
//!
//! Reference: POSIX.1-2024 snprintf, ISO C11 7.21.6.5.
//!
//! Design invariant: the first fatal directive ends the whole call chain.
//! Bytes already emitted stay in the buffer and the buffer is terminated.

use crate::config::Mode;
use crate::error::{ERROR_MARKER, FormatError, INVALID_MARKER};
use crate::stdio::args::{Arg, ArgCursor};
use crate::stdio::float::format_float;
use crate::stdio::integer::{
    Base, format_char, format_integer, format_pointer, format_str, until_nul,
};
use crate::stdio::sink::OutputSink;
use crate::stdio::spec::{
    Conversion, DirectiveError, FormatSpec, MAX_FIELD, Precision, Width, parse_directive,
};

/// Largest logical length a call can report.
pub const MAX_OUTPUT_LEN: u64 = i32::MAX as u64;

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Format into `buf` in [`Mode::Strict`].
///
/// Writes at most `buf.len() - 1` bytes plus a terminator (nothing at all for
/// an empty buffer) and returns the length the output would have had with
/// unlimited room.
pub fn format_to(buf: &mut [u8], fmt: &[u8], args: &[Arg<'_>]) -> Result<usize, FormatError> {
    format_to_mode(Mode::Strict, buf, fmt, args)
}

/// [`format_to`] with an explicit mode.
pub fn format_to_mode(
    mode: Mode,
    buf: &mut [u8],
    fmt: &[u8],
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    let mut cursor = ArgCursor::new(args);
    vformat_to(mode, buf, fmt, &mut cursor)
}

/// Format from an argument cursor. The cursor is left after the last
/// argument consumed.
pub fn vformat_to(
    mode: Mode,
    buf: &mut [u8],
    fmt: &[u8],
    args: &mut ArgCursor<'_>,
) -> Result<usize, FormatError> {
    let mut sink = OutputSink::new(buf);
    let result = run(&mut sink, mode, fmt, args);
    sink.finish();
    result?;
    if sink.overflowed() || sink.logical_len() > MAX_OUTPUT_LEN {
        return Err(FormatError::LengthOverflow);
    }
    Ok(sink.logical_len() as usize)
}

/// C-shaped wrapper: the logical length, or `-1` on any error.
pub fn snprintf(buf: &mut [u8], fmt: &[u8], args: &[Arg<'_>]) -> i32 {
    match format_to(buf, fmt, args) {
        Ok(len) => len as i32,
        Err(_) => -1,
    }
}

/// Format with inline arguments: `format_to!(buf, "%d-%s", 7, "x")`.
///
/// Each argument goes through [`Arg::from`](crate::stdio::Arg).
#[macro_export]
macro_rules! format_to {
    ($buf:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::stdio::format_to(
            $buf,
            ::core::convert::AsRef::<[u8]>::as_ref(&$fmt),
            &[$($crate::stdio::Arg::from($arg)),*],
        )
    };
}

/// Inline-argument form of [`snprintf`](crate::stdio::snprintf).
#[macro_export]
macro_rules! snprintf {
    ($buf:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::stdio::snprintf(
            $buf,
            ::core::convert::AsRef::<[u8]>::as_ref(&$fmt),
            &[$($crate::stdio::Arg::from($arg)),*],
        )
    };
}

// ---------------------------------------------------------------------------
// Driver loop
// ---------------------------------------------------------------------------

fn run(
    sink: &mut OutputSink<'_>,
    mode: Mode,
    fmt: &[u8],
    args: &mut ArgCursor<'_>,
) -> Result<(), FormatError> {
    let fmt = until_nul(fmt);
    let len = fmt.len();
    let mut pos = 0;

    while pos < len {
        let start = pos;
        while pos < len && fmt[pos] != b'%' {
            pos += 1;
        }
        sink.put_bytes(&fmt[start..pos]);
        if pos >= len {
            break;
        }

        let offset = pos;
        pos += 1;
        if fmt.get(pos) == Some(&b'%') {
            sink.put(b'%');
            pos += 1;
            continue;
        }

        match parse_directive(&fmt[pos..]) {
            Ok((spec, consumed)) => {
                pos += consumed;
                dispatch(sink, mode, spec, args, offset)?;
            }
            Err(DirectiveError::UnknownConversion {
                byte,
                len: consumed,
                star_args,
            }) if mode.echoes_unknown_conversions() => {
                // '*' fields are fetched before the conversion is looked at.
                for _ in 0..star_args {
                    if args.next_c_int().is_none() {
                        sink.put_bytes(ERROR_MARKER);
                        return Err(FormatError::MissingArgument { offset });
                    }
                }
                sink.put(byte);
                pos += consumed;
            }
            Err(DirectiveError::UnknownConversion { len: consumed, .. }) => {
                sink.put_bytes(&fmt[offset..pos + consumed]);
                sink.put_bytes(INVALID_MARKER);
                return Err(FormatError::InvalidConversion { offset });
            }
            Err(DirectiveError::Incomplete) => {
                sink.put_bytes(&fmt[offset..]);
                sink.put_bytes(INVALID_MARKER);
                return Err(FormatError::InvalidConversion { offset });
            }
            Err(DirectiveError::Overflow) => {
                sink.put_bytes(ERROR_MARKER);
                return Err(FormatError::NumericOverflow { offset });
            }
        }
    }
    Ok(())
}

fn dispatch(
    sink: &mut OutputSink<'_>,
    mode: Mode,
    mut spec: FormatSpec,
    args: &mut ArgCursor<'_>,
    offset: usize,
) -> Result<(), FormatError> {
    let missing = |sink: &mut OutputSink<'_>| {
        sink.put_bytes(ERROR_MARKER);
        FormatError::MissingArgument { offset }
    };

    // '*' arguments come before the value, width first.
    if spec.width == Width::FromArg {
        let Some(w) = args.next_c_int() else {
            return Err(missing(sink));
        };
        let magnitude = w.unsigned_abs() as usize;
        if magnitude > MAX_FIELD {
            sink.put_bytes(ERROR_MARKER);
            return Err(FormatError::NumericOverflow { offset });
        }
        if w < 0 {
            spec.flags.left_justify = true;
            spec.flags.zero_pad = false;
        }
        spec.width = Width::Fixed(magnitude);
    }
    if spec.precision == Precision::FromArg {
        let Some(p) = args.next_c_int() else {
            return Err(missing(sink));
        };
        spec.precision = if p < 0 {
            Precision::None
        } else {
            Precision::Fixed(p as usize)
        };
    }

    if spec.conversion.is_integer() {
        if spec.precision().is_some() {
            spec.flags.zero_pad = false;
        }
        if spec.conversion != Conversion::Signed {
            spec.flags.force_sign = false;
            spec.flags.space_sign = false;
        }
        if matches!(spec.conversion, Conversion::Signed | Conversion::Unsigned) {
            spec.flags.alt_form = false;
        }
    }

    let bits = spec.length.int_bits();
    match spec.conversion {
        Conversion::Percent => sink.put(b'%'),
        Conversion::Signed => {
            let Some(v) = args.next_int() else {
                return Err(missing(sink));
            };
            let v = narrow_signed(v, bits);
            format_integer(sink, v.unsigned_abs(), v < 0, Base::Decimal, &spec);
        }
        Conversion::Unsigned | Conversion::Octal | Conversion::Hex | Conversion::Binary => {
            let Some(v) = args.next_uint() else {
                return Err(missing(sink));
            };
            let base = match spec.conversion {
                Conversion::Octal => Base::Octal,
                Conversion::Hex => Base::Hex,
                Conversion::Binary => Base::Binary,
                _ => Base::Decimal,
            };
            format_integer(sink, narrow_unsigned(v, bits), false, base, &spec);
        }
        Conversion::Fixed | Conversion::Exponent | Conversion::General | Conversion::HexFloat => {
            let Some(v) = args.next_float() else {
                return Err(missing(sink));
            };
            if format_float(sink, v, &spec).is_err() {
                sink.put_bytes(ERROR_MARKER);
                return Err(FormatError::NumericOverflow { offset });
            }
        }
        Conversion::Char => {
            let Some(c) = args.next_c_int() else {
                return Err(missing(sink));
            };
            format_char(sink, c as u8, &spec);
        }
        Conversion::Str => {
            let Some(s) = args.next_str() else {
                return Err(missing(sink));
            };
            format_str(sink, s, &spec);
        }
        Conversion::Pointer => {
            let Some(p) = args.next_ptr() else {
                return Err(missing(sink));
            };
            format_pointer(sink, p, &spec);
        }
        Conversion::Nested => {
            let (Some(nested_fmt), Some(mut nested)) = (args.next_str(), args.next_cursor()) else {
                return Err(missing(sink));
            };
            run(sink, mode, nested_fmt, &mut nested)?;
        }
    }
    Ok(())
}

/// Sign-extend the low `bits` of `v`.
fn narrow_signed(v: i64, bits: u32) -> i64 {
    if bits >= i64::BITS {
        v
    } else {
        let shift = i64::BITS - bits;
        (v << shift) >> shift
    }
}

/// Keep the low `bits` of `v`.
fn narrow_unsigned(v: u64, bits: u32) -> u64 {
    if bits >= u64::BITS {
        v
    } else {
        v & ((1 << bits) - 1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
