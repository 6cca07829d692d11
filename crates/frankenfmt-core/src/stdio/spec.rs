//! Format directive parser.
//!
//! Parses the bytes that follow an unescaped `%` into a [`FormatSpec`]:
//!
//! ```text
//! %[flags][width|*][.precision|.*][length]conversion
//! ```
//!
//! Reference: POSIX.1-2024 fprintf, ISO C11 7.21.6.1, plus the Microsoft
//! `I8 I16 I32 I64 I` length modifiers and the `%b` / `%r` extensions.
//!
//! Design invariant: a successfully parsed width or precision literal never
//! exceeds `i32::MAX`, so every later length computation fits in `i64`.

use thiserror::Error;

/// Largest width or precision a directive may carry.
pub const MAX_FIELD: usize = i32::MAX as usize;

// ---------------------------------------------------------------------------
// Format spec types
// ---------------------------------------------------------------------------

/// Flags parsed from a printf format directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatFlags {
    pub left_justify: bool, // '-'
    pub force_sign: bool,   // '+'
    pub space_sign: bool,   // ' '
    pub alt_form: bool,     // '#'
    pub zero_pad: bool,     // '0'
    pub uppercase: bool,    // X F E G A
}

/// Width specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    None,
    Fixed(usize),
    FromArg, // '*'
}

/// Precision specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    None,
    Fixed(usize),
    FromArg, // '.*'
}

/// Length modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMod {
    None,
    Hh,   // 'hh'
    H,    // 'h'
    L,    // 'l'
    Ll,   // 'll'
    Z,    // 'z'
    T,    // 't'
    J,    // 'j'
    BigL, // 'L'
    I8,   // 'I8'
    I16,  // 'I16'
    I32,  // 'I32'
    I64,  // 'I64'
    I,    // 'I' (pointer sized)
}

impl LengthMod {
    /// Width in bits of the integer argument this modifier selects.
    #[must_use]
    pub const fn int_bits(self) -> u32 {
        match self {
            Self::Hh | Self::I8 => 8,
            Self::H | Self::I16 => 16,
            Self::None | Self::I32 => 32,
            Self::L => core::ffi::c_long::BITS,
            Self::Ll | Self::J | Self::I64 | Self::BigL => 64,
            Self::Z | Self::T | Self::I => usize::BITS,
        }
    }
}

/// Conversion kind. Letter case lives in [`FormatFlags::uppercase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Signed,   // d i
    Unsigned, // u
    Octal,    // o
    Hex,      // x X
    Binary,   // b
    Fixed,    // f F
    Exponent, // e E
    General,  // g G
    HexFloat, // a A
    Char,     // c
    Str,      // s
    Pointer,  // p
    Percent,  // %
    Nested,   // r
}

impl Conversion {
    /// Map a conversion byte to its kind and letter case.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<(Self, bool)> {
        let kind = match byte {
            b'd' | b'i' => Self::Signed,
            b'u' => Self::Unsigned,
            b'o' => Self::Octal,
            b'x' | b'X' => Self::Hex,
            b'b' => Self::Binary,
            b'f' | b'F' => Self::Fixed,
            b'e' | b'E' => Self::Exponent,
            b'g' | b'G' => Self::General,
            b'a' | b'A' => Self::HexFloat,
            b'c' => Self::Char,
            b's' => Self::Str,
            b'p' => Self::Pointer,
            b'%' => Self::Percent,
            b'r' => Self::Nested,
            _ => return None,
        };
        Some((kind, byte.is_ascii_uppercase()))
    }

    /// True for the conversions that render through the integer formatter.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Signed | Self::Unsigned | Self::Octal | Self::Hex | Self::Binary
        )
    }

}

/// A parsed printf format directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    pub flags: FormatFlags,
    pub width: Width,
    pub precision: Precision,
    pub length: LengthMod,
    pub conversion: Conversion,
}

impl FormatSpec {
    /// A bare directive of the given kind: no flags, width, precision or length.
    #[must_use]
    pub const fn new(conversion: Conversion) -> Self {
        Self {
            flags: FormatFlags {
                left_justify: false,
                force_sign: false,
                space_sign: false,
                alt_form: false,
                zero_pad: false,
                uppercase: false,
            },
            width: Width::None,
            precision: Precision::None,
            length: LengthMod::None,
            conversion,
        }
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: FormatFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub const fn with_width(mut self, width: usize) -> Self {
        self.width = Width::Fixed(width);
        self
    }

    #[must_use]
    pub const fn with_precision(mut self, precision: usize) -> Self {
        self.precision = Precision::Fixed(precision);
        self
    }

    /// Resolved field width; `0` when absent or still pending a `*` argument.
    #[must_use]
    pub const fn width(&self) -> usize {
        match self.width {
            Width::Fixed(w) => w,
            _ => 0,
        }
    }

    /// Resolved precision, if one was given.
    #[must_use]
    pub const fn precision(&self) -> Option<usize> {
        match self.precision {
            Precision::Fixed(p) => Some(p),
            _ => None,
        }
    }
}

/// Why a directive could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DirectiveError {
    /// The format string ended inside the directive.
    #[error("format string ends inside a directive")]
    Incomplete,
    /// The conversion byte is not recognized. `len` counts through that byte;
    /// `star_args` is how many `*` fields the directive named.
    #[error("unknown conversion character {byte:#04x}")]
    UnknownConversion { byte: u8, len: usize, star_args: usize },
    /// A width or precision literal exceeds `i32::MAX`.
    #[error("width or precision literal exceeds i32::MAX")]
    Overflow,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse a single directive starting after the '%' character.
///
/// `fmt` points to the first byte AFTER '%'. Returns `(spec, bytes_consumed)`
/// where `bytes_consumed` counts from `fmt[0]`. `%%` is handled by the driver
/// before this is called, but a `%` conversion after flags parses as
/// [`Conversion::Percent`].
pub fn parse_directive(fmt: &[u8]) -> Result<(FormatSpec, usize), DirectiveError> {
    let mut pos = 0;
    let len = fmt.len();

    // --- flags ---
    let mut flags = FormatFlags::default();
    while pos < len {
        match fmt[pos] {
            b'-' => flags.left_justify = true,
            b'+' => flags.force_sign = true,
            b' ' => flags.space_sign = true,
            b'#' => flags.alt_form = true,
            b'0' => flags.zero_pad = true,
            _ => break,
        }
        pos += 1;
    }
    // POSIX: '+' overrides ' '; '-' overrides '0'.
    if flags.force_sign {
        flags.space_sign = false;
    }
    if flags.left_justify {
        flags.zero_pad = false;
    }

    // --- width ---
    let width = if pos < len && fmt[pos] == b'*' {
        pos += 1;
        Width::FromArg
    } else {
        let start = pos;
        let value = parse_decimal(fmt, &mut pos)?;
        if pos > start {
            Width::Fixed(value)
        } else {
            Width::None
        }
    };

    // --- precision ---
    let precision = if pos < len && fmt[pos] == b'.' {
        pos += 1;
        if pos < len && fmt[pos] == b'*' {
            pos += 1;
            Precision::FromArg
        } else {
            // A bare '.' means precision zero.
            Precision::Fixed(parse_decimal(fmt, &mut pos)?)
        }
    } else {
        Precision::None
    };

    // --- length modifier ---
    let length = parse_length(fmt, &mut pos);

    // --- conversion ---
    let Some(&byte) = fmt.get(pos) else {
        return Err(DirectiveError::Incomplete);
    };
    pos += 1;
    let Some((conversion, uppercase)) = Conversion::from_byte(byte) else {
        let star_args =
            usize::from(width == Width::FromArg) + usize::from(precision == Precision::FromArg);
        return Err(DirectiveError::UnknownConversion { byte, len: pos, star_args });
    };
    flags.uppercase = uppercase;

    Ok((
        FormatSpec {
            flags,
            width,
            precision,
            length,
            conversion,
        },
        pos,
    ))
}

fn parse_decimal(fmt: &[u8], pos: &mut usize) -> Result<usize, DirectiveError> {
    let mut value = 0_usize;
    while let Some(&d) = fmt.get(*pos) {
        if !d.is_ascii_digit() {
            break;
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(usize::from(d - b'0')))
            .filter(|&v| v <= MAX_FIELD)
            .ok_or(DirectiveError::Overflow)?;
        *pos += 1;
    }
    Ok(value)
}

fn parse_length(fmt: &[u8], pos: &mut usize) -> LengthMod {
    let rest = &fmt[*pos..];
    let (length, consumed) = match rest {
        [b'h', b'h', ..] => (LengthMod::Hh, 2),
        [b'h', ..] => (LengthMod::H, 1),
        [b'l', b'l', ..] => (LengthMod::Ll, 2),
        [b'l', ..] => (LengthMod::L, 1),
        [b'z', ..] => (LengthMod::Z, 1),
        [b't', ..] => (LengthMod::T, 1),
        [b'j', ..] => (LengthMod::J, 1),
        [b'L', ..] => (LengthMod::BigL, 1),
        [b'I', b'8', ..] => (LengthMod::I8, 2),
        [b'I', b'1', b'6', ..] => (LengthMod::I16, 3),
        [b'I', b'3', b'2', ..] => (LengthMod::I32, 3),
        [b'I', b'6', b'4', ..] => (LengthMod::I64, 3),
        [b'I', ..] => (LengthMod::I, 1),
        _ => (LengthMod::None, 0),
    };
    *pos += consumed;
    length
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
