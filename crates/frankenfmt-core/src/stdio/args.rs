//! Typed argument stream.
//!
//! C passes printf arguments through a variadic list whose element types are
//! implied by the directives. Here the caller builds the list up front as a
//! slice of [`Arg`] values and the driver walks it with an [`ArgCursor`].
//!
//! Type mismatches between directive and argument are coerced, never
//! rejected: integers are reinterpreted bit-for-bit, floats convert
//! numerically and non-string arguments read as the empty string. Running
//! out of arguments is the only failure.

use core::ffi::CStr;

/// One formatting argument.
#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(&'a [u8]),
    Ptr(usize),
    /// A cursor snapshot consumed by `%r` together with its format string.
    Cursor(ArgCursor<'a>),
}

impl Arg<'_> {
    fn to_bits(self) -> u64 {
        match self {
            Arg::Int(v) => v as u64,
            Arg::Uint(v) => v,
            Arg::Float(v) => v as i64 as u64,
            Arg::Str(s) => s.as_ptr() as usize as u64,
            Arg::Ptr(p) => p as u64,
            Arg::Cursor(_) => 0,
        }
    }
}

macro_rules! arg_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Arg<'_> {
                fn from(value: $source) -> Self {
                    Arg::$variant(value as $target)
                }
            }
        )+
    };
}

arg_from!(Int as i64: i8, i16, i32, i64, isize);
arg_from!(Uint as u64: u8, u16, u32, u64, usize);
arg_from!(Float as f64: f32, f64);

impl From<char> for Arg<'_> {
    fn from(value: char) -> Self {
        Arg::Uint(u64::from(u32::from(value)))
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Str(value.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(value: &'a [u8]) -> Self {
        Arg::Str(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Arg<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Arg::Str(value)
    }
}

impl<'a> From<&'a CStr> for Arg<'a> {
    fn from(value: &'a CStr) -> Self {
        Arg::Str(value.to_bytes())
    }
}

impl<T> From<*const T> for Arg<'_> {
    fn from(value: *const T) -> Self {
        Arg::Ptr(value as usize)
    }
}

impl<T> From<*mut T> for Arg<'_> {
    fn from(value: *mut T) -> Self {
        Arg::Ptr(value as usize)
    }
}

impl<'a> From<ArgCursor<'a>> for Arg<'a> {
    fn from(value: ArgCursor<'a>) -> Self {
        Arg::Cursor(value)
    }
}

/// Position-advancing view over an argument slice.
///
/// The cursor is `Copy`: copying it is the snapshot a `%r` directive takes,
/// so a nested call never moves its caller's position.
#[derive(Debug, Clone, Copy)]
pub struct ArgCursor<'a> {
    args: &'a [Arg<'a>],
    pos: usize,
}

impl<'a> ArgCursor<'a> {
    #[must_use]
    pub const fn new(args: &'a [Arg<'a>]) -> Self {
        Self { args, pos: 0 }
    }

    /// A cursor over no arguments.
    #[must_use]
    pub const fn empty() -> Self {
        Self { args: &[], pos: 0 }
    }

    /// Index of the next argument to be fetched.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Arguments not yet fetched.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.args.len() - self.pos
    }

    /// An independent copy of the current state.
    #[must_use]
    pub const fn snapshot(&self) -> Self {
        *self
    }

    fn next_arg(&mut self) -> Option<Arg<'a>> {
        let arg = *self.args.get(self.pos)?;
        self.pos += 1;
        Some(arg)
    }

    /// Fetch a signed integer (bit-reinterpreting unsigned arguments).
    pub fn next_int(&mut self) -> Option<i64> {
        self.next_arg().map(|a| a.to_bits() as i64)
    }

    /// Fetch an unsigned integer (bit-reinterpreting signed arguments).
    pub fn next_uint(&mut self) -> Option<u64> {
        self.next_arg().map(Arg::to_bits)
    }

    /// Fetch a C `int`, as used by `*` fields and `%c`.
    pub fn next_c_int(&mut self) -> Option<i32> {
        self.next_int().map(|v| v as i32)
    }

    pub fn next_float(&mut self) -> Option<f64> {
        self.next_arg().map(|arg| match arg {
            Arg::Float(v) => v,
            Arg::Int(v) => v as f64,
            Arg::Uint(v) => v as f64,
            _ => 0.0,
        })
    }

    /// Fetch a string. A null pointer reads as `(null)`.
    pub fn next_str(&mut self) -> Option<&'a [u8]> {
        self.next_arg().map(|arg| match arg {
            Arg::Str(s) => s,
            Arg::Ptr(0) => b"(null)".as_slice(),
            _ => b"".as_slice(),
        })
    }

    pub fn next_ptr(&mut self) -> Option<usize> {
        self.next_arg().map(|a| a.to_bits() as usize)
    }

    /// Fetch a cursor snapshot for `%r`. Non-cursor arguments read as empty.
    pub fn next_cursor(&mut self) -> Option<ArgCursor<'a>> {
        self.next_arg().map(|arg| match arg {
            Arg::Cursor(c) => c.snapshot(),
            _ => ArgCursor::empty(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetches_in_order_and_reports_exhaustion() {
        let args = [Arg::from(7_i32), Arg::from("hi"), Arg::from(2.5_f64)];
        let mut cursor = ArgCursor::new(&args);
        assert_eq!(cursor.remaining(), 3);
        assert_eq!(cursor.next_int(), Some(7));
        assert_eq!(cursor.next_str(), Some(b"hi".as_slice()));
        assert_eq!(cursor.next_float(), Some(2.5));
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.next_int(), None);
    }

    #[test]
    fn test_integers_reinterpret_bits() {
        let args = [Arg::from(-1_i64), Arg::from(u64::MAX), Arg::from(0x1_0000_0005_u64)];
        let mut cursor = ArgCursor::new(&args);
        assert_eq!(cursor.next_uint(), Some(u64::MAX));
        assert_eq!(cursor.next_int(), Some(-1));
        assert_eq!(cursor.next_c_int(), Some(5));
    }

    #[test]
    fn test_mismatched_types_are_coerced() {
        let args = [Arg::from(3_u8), Arg::from(9_i16), Arg::Ptr(0), Arg::from(1.0_f64)];
        let mut cursor = ArgCursor::new(&args);
        assert_eq!(cursor.next_float(), Some(3.0));
        assert_eq!(cursor.next_str(), Some(b"".as_slice()));
        assert_eq!(cursor.next_str(), Some(b"(null)".as_slice()));
        assert_eq!(cursor.next_cursor().map(|c| c.remaining()), Some(0));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let args = [Arg::from(1_i32), Arg::from(2_i32), Arg::from(3_i32)];
        let mut cursor = ArgCursor::new(&args);
        cursor.next_int();
        let mut copy = cursor.snapshot();
        assert_eq!(copy.next_int(), Some(2));
        assert_eq!(copy.next_int(), Some(3));
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.next_int(), Some(2));
    }

    #[test]
    fn test_conversions_from_host_types() {
        let c = c"nul";
        assert!(matches!(Arg::from(c), Arg::Str(b"nul")));
        assert!(matches!(Arg::from('A'), Arg::Uint(65)));
        assert!(matches!(Arg::from(b"xy"), Arg::Str(b"xy")));
        let p = core::ptr::null::<u8>();
        assert!(matches!(Arg::from(p), Arg::Ptr(0)));
        assert!(matches!(Arg::from(1.5_f32), Arg::Float(v) if v == 1.5));
    }
}
