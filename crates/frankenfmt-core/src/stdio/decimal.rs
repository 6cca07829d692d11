//! Exact binary-to-decimal expansion for `%f %e %g`.
//!
//! A finite `f64` is a dyadic rational, so its decimal expansion terminates.
//! [`DecimalExpansion`] holds that expansion as base-10^9 groups in a fixed
//! array, grows it from both ends while shifting the binary exponent in, and
//! stops materializing fraction groups once the requested precision can no
//! longer be affected by them.
//!
//! Design invariant: after construction and after [`DecimalExpansion::round`],
//! every group lies in `[0, 1e9)`, group `low` is nonzero and group `high - 1`
//! is nonzero (unless the value is zero and the range is empty).

use crate::stdio::sink::OutputSink;

const MANT_DIG: usize = f64::MANTISSA_DIGITS as usize;
const MAX_EXP: usize = f64::MAX_EXP as usize;
const MIN_EXP: usize = f64::MIN_EXP.unsigned_abs() as usize;

/// Bits of mantissa moved above the binary point before expansion.
const WINDOW_BITS: i32 = 28;
const BILLION: u32 = 1_000_000_000;

/// Groups for the mantissa window plus groups for the widest exponent shift.
pub(crate) const GROUPS: usize = (MANT_DIG + 28) / 29 + 1 + (MAX_EXP + MANT_DIG + 28 + 8) / 9;

/// Index of the radix group for values with a nonnegative binary exponent.
/// Leaves `MANT_DIG + 1` groups of room for fraction digits to its right.
const POSITIVE_START: usize = GROUPS - MANT_DIG - 1;

const _: () = {
    assert!(f64::RADIX == 2);
    // The exact fraction of the smallest subnormal, plus the units group.
    assert!((MIN_EXP + MANT_DIG + WINDOW_BITS as usize).div_ceil(9) + 1 <= GROUPS);
    // The integer part of f64::MAX (log10(2) < 0.30103) left of the radix group.
    assert!((MAX_EXP * 30103 / 100_000 + 1).div_ceil(9) <= POSITIVE_START);
};

/// Which layout the digits are being prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notation {
    /// `%f`: precision counts digits after the radix point.
    Fixed,
    /// `%e`: precision counts digits after the leading digit.
    Exponent,
    /// `%g`: precision counts significant digits.
    General,
}

/// Rounding decision input: how the discarded tail compares to half a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tail {
    BelowHalf,
    Half,
    AboveHalf,
}

/// Exact base-10^9 digit groups of a nonnegative finite value.
pub(crate) struct DecimalExpansion {
    groups: [u32; GROUPS],
    low: usize,
    radix: usize,
    high: usize,
}

impl DecimalExpansion {
    /// Expand `value` (finite, sign already removed) far enough to decide
    /// `precision` digits in the given notation.
    pub(crate) fn new(value: f64, precision: usize, notation: Notation) -> Self {
        let (mut y, mut e2) = normalize(value);
        if y != 0.0 {
            y *= f64::from(1u32 << WINDOW_BITS);
            e2 -= WINDOW_BITS;
        }

        let start = if e2 < 0 { 0 } else { POSITIVE_START };
        let mut this = Self {
            groups: [0; GROUPS],
            low: start,
            radix: start,
            high: start,
        };

        // y < 2^29 here, and each later remainder is below 1e9.
        loop {
            let group = y as u32;
            this.groups[this.high] = group;
            this.high += 1;
            y = f64::from(BILLION) * (y - f64::from(group));
            if y == 0.0 {
                break;
            }
        }

        while e2 > 0 {
            let sh = e2.min(29);
            this.shift_left(sh as u32);
            e2 -= sh;
        }

        let need = 1 + (precision + MANT_DIG / 3 + 8) / 9;
        while e2 < 0 {
            let sh = (-e2).min(9);
            this.shift_right(sh as u32);
            let anchor = if notation == Notation::Fixed {
                this.radix
            } else {
                this.low
            };
            if this.high - anchor > need {
                this.high = anchor + need;
            }
            e2 += sh;
        }
        this
    }

    /// Multiply by `2^sh`, growing toward the most significant end.
    fn shift_left(&mut self, sh: u32) {
        let mut carry = 0u32;
        for d in (self.low..self.high).rev() {
            let x = (u64::from(self.groups[d]) << sh) + u64::from(carry);
            self.groups[d] = (x % u64::from(BILLION)) as u32;
            carry = (x / u64::from(BILLION)) as u32;
        }
        if carry != 0 {
            self.low -= 1;
            self.groups[self.low] = carry;
        }
        self.trim_high();
    }

    /// Divide by `2^sh` (at most 9), growing toward the least significant end.
    fn shift_right(&mut self, sh: u32) {
        let mask = (1u32 << sh) - 1;
        let mut carry = 0u32;
        for d in self.low..self.high {
            let rem = self.groups[d] & mask;
            self.groups[d] = (self.groups[d] >> sh) + carry;
            carry = (BILLION >> sh) * rem;
        }
        if self.groups[self.low] == 0 {
            self.low += 1;
        }
        if carry != 0 {
            self.groups[self.high] = carry;
            self.high += 1;
        }
    }

    fn trim_high(&mut self) {
        while self.high > self.low && self.groups[self.high - 1] == 0 {
            self.high -= 1;
        }
    }

    /// Decimal exponent of the leading digit (`0` for zero).
    pub(crate) fn exponent(&self) -> i32 {
        if self.low >= self.high {
            return 0;
        }
        let mut e = 9 * (self.radix as i32 - self.low as i32);
        let mut i = 10;
        while self.groups[self.low] >= i {
            i *= 10;
            e += 1;
        }
        e
    }

    /// Round half-to-even at the last digit `precision` keeps, then drop the tail.
    pub(crate) fn round(&mut self, precision: usize, notation: Notation) {
        let p = precision as i64;
        let mut j = p;
        if notation != Notation::Fixed {
            j -= i64::from(self.exponent());
        }
        if notation == Notation::General && p != 0 {
            j -= 1;
        }
        if j >= 9 * (self.high as i64 - self.radix as i64 - 1) {
            self.trim_high();
            return;
        }

        // Group holding the last kept digit, and the place value below it.
        let d = (self.radix as i64 + 1 + j.div_euclid(9)) as usize;
        let i = 10u32.pow(9 - j.rem_euclid(9) as u32);
        let x = self.groups[d] % i;

        if x != 0 || d + 1 != self.high {
            let kept_odd = (self.groups[d] / i) & 1 == 1
                || (i == BILLION && d > self.low && self.groups[d - 1] & 1 == 1);
            let tail = if x < i / 2 {
                Tail::BelowHalf
            } else if x == i / 2 && d + 1 == self.high {
                Tail::Half
            } else {
                Tail::AboveHalf
            };

            self.groups[d] -= x;
            if rounds_up(kept_odd, tail) {
                self.groups[d] += i;
                let mut k = d;
                while self.groups[k] > BILLION - 1 {
                    self.groups[k] = 0;
                    k -= 1;
                    if k < self.low {
                        self.low = k;
                        self.groups[k] = 0;
                    }
                    self.groups[k] += 1;
                }
            }
        }
        if self.high > d + 1 {
            self.high = d + 1;
        }
        self.trim_high();
    }

    /// Fraction digits `%g` keeps once trailing zeros are stripped.
    pub(crate) fn significant_fraction_digits(&self, notation: Notation, exponent: i32) -> usize {
        let mut last = if self.high > self.low {
            self.groups[self.high - 1]
        } else {
            0
        };
        let j = if last == 0 {
            9
        } else {
            let mut zeros = 0;
            while last % 10 == 0 {
                last /= 10;
                zeros += 1;
            }
            zeros
        };
        let span = 9 * (self.high as i64 - self.radix as i64 - 1);
        let digits = match notation {
            Notation::Exponent => span + i64::from(exponent) - j,
            _ => span - j,
        };
        digits.max(0) as usize
    }

    /// Emit `ddd.fff` with exactly `precision` fraction digits.
    pub(crate) fn write_fixed(&self, sink: &mut OutputSink<'_>, precision: usize, alt: bool) {
        let first = self.low.min(self.radix);
        for d in first..=self.radix {
            let text = group_text(self.groups[d]);
            if d == first {
                let n = digit_count(self.groups[d]);
                if n == 0 {
                    sink.put(b'0');
                } else {
                    sink.put_bytes(&text[9 - n..]);
                }
            } else {
                sink.put_bytes(&text);
            }
        }
        if precision > 0 || alt {
            sink.put(b'.');
        }
        let mut remaining = precision;
        let mut d = self.radix + 1;
        while d < self.high && remaining > 0 {
            let text = group_text(self.groups[d]);
            let take = remaining.min(9);
            sink.put_bytes(&text[..take]);
            remaining -= take;
            d += 1;
        }
        sink.put_repeat(b'0', remaining);
    }

    /// Emit `d.ddd` with exactly `precision` digits after the leading one.
    /// The caller appends the exponent.
    pub(crate) fn write_mantissa(&self, sink: &mut OutputSink<'_>, precision: usize, alt: bool) {
        let high = self.high.max(self.low + 1);
        let mut remaining = precision;
        for d in self.low..high {
            let text = group_text(self.groups[d]);
            let mut digits: &[u8] = if d == self.low {
                &text[9 - digit_count(self.groups[d]).max(1)..]
            } else {
                &text
            };
            if d == self.low {
                sink.put(digits[0]);
                digits = &digits[1..];
                if precision > 0 || alt {
                    sink.put(b'.');
                }
            }
            let take = digits.len().min(remaining);
            sink.put_bytes(&digits[..take]);
            remaining -= take;
            if remaining == 0 {
                break;
            }
        }
        sink.put_repeat(b'0', remaining);
    }
}

/// Split a nonnegative finite `x` into `y * 2^e2` with `y` in `[1, 2)`.
/// Zero maps to `(0.0, 0)`.
fn normalize(x: f64) -> (f64, i32) {
    const EXP_MASK: u64 = 0x7ff << 52;
    const ONE_BITS: u64 = 1023 << 52;
    let bits = x.to_bits();
    let biased = ((bits & EXP_MASK) >> 52) as i32;
    if biased == 0 {
        if x == 0.0 {
            return (0.0, 0);
        }
        // Subnormal: scale into the normal range first (2^64 is exact).
        let (y, e2) = normalize(x * 18_446_744_073_709_551_616.0);
        return (y, e2 - 64);
    }
    (f64::from_bits((bits & !EXP_MASK) | ONE_BITS), biased - 1023)
}

/// Decide a rounding direction with the FPU's own round-half-even: add the
/// tail to a number whose unit in the last place is 2 and see if it moves.
fn rounds_up(kept_odd: bool, tail: Tail) -> bool {
    let mut round = 2.0 / f64::EPSILON;
    if kept_odd {
        round += 2.0;
    }
    let small = match tail {
        Tail::BelowHalf => 0.5,
        Tail::Half => 1.0,
        Tail::AboveHalf => 1.5,
    };
    round + small != round
}

/// Nine ASCII digits of a group, zero-filled on the left.
fn group_text(group: u32) -> [u8; 9] {
    let mut text = [b'0'; 9];
    let mut g = group;
    let mut pos = 9;
    while g > 0 {
        pos -= 1;
        text[pos] = b'0' + (g % 10) as u8;
        g /= 10;
    }
    text
}

/// Significant digits in a group; zero has none.
fn digit_count(group: u32) -> usize {
    let mut n = 0;
    let mut g = group;
    while g > 0 {
        n += 1;
        g /= 10;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(value: f64, precision: usize) -> String {
        let mut digits = DecimalExpansion::new(value, precision, Notation::Fixed);
        digits.round(precision, Notation::Fixed);
        let mut buf = [0u8; 1200];
        let mut sink = OutputSink::new(&mut buf);
        digits.write_fixed(&mut sink, precision, false);
        String::from_utf8(sink.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_group_count_covers_f64_range() {
        // Every fraction digit of the smallest subnormal, plus the units group.
        let subnormal_fraction = (MIN_EXP + MANT_DIG + WINDOW_BITS as usize).div_ceil(9);
        assert!(subnormal_fraction + 1 <= GROUPS);
        // f64::MAX has 309 integer digits, all left of the radix group.
        let max_integer_digits = format!("{}", f64::MAX).len();
        assert_eq!(max_integer_digits, 309);
        assert!(max_integer_digits.div_ceil(9) <= POSITIVE_START);
        assert!(POSITIVE_START + MANT_DIG + 1 == GROUPS);
    }

    #[test]
    fn test_normalize_splits_exactly() {
        assert_eq!(normalize(1.0), (1.0, 0));
        assert_eq!(normalize(6.0), (1.5, 2));
        assert_eq!(normalize(0.0), (0.0, 0));
        assert_eq!(normalize(f64::from_bits(1)), (1.0, -1074));
        assert_eq!(normalize(f64::MAX).1, 1023);
    }

    #[test]
    fn test_expansion_of_small_integers() {
        let digits = DecimalExpansion::new(1234.0, 0, Notation::Fixed);
        assert_eq!(digits.exponent(), 3);
        assert_eq!(digits.groups[digits.low], 1234);
    }

    #[test]
    fn test_exact_fraction_digits() {
        assert_eq!(fixed(0.5, 3), "0.500");
        assert_eq!(fixed(0.1, 20), "0.10000000000000000555");
        assert_eq!(fixed(1e21, 0), "1000000000000000000000");
    }

    #[test]
    fn test_ties_round_to_even() {
        assert_eq!(fixed(0.5, 0), "0");
        assert_eq!(fixed(1.5, 0), "2");
        assert_eq!(fixed(2.5, 0), "2");
        assert_eq!(fixed(0.125, 2), "0.12");
        assert_eq!(fixed(0.375, 2), "0.38");
    }

    #[test]
    fn test_carry_propagates_across_groups() {
        assert_eq!(fixed(999_999_999.5, 0), "1000000000");
        assert_eq!(fixed(0.999_999_999_9, 3), "1.000");
    }

    #[test]
    fn test_exponent_tracks_rounding_carry() {
        let mut digits = DecimalExpansion::new(9.96, 1, Notation::Exponent);
        digits.round(1, Notation::Exponent);
        assert_eq!(digits.exponent(), 1);
    }

    #[test]
    fn test_tie_probe_is_half_even() {
        assert!(!rounds_up(false, Tail::Half));
        assert!(rounds_up(true, Tail::Half));
        assert!(!rounds_up(true, Tail::BelowHalf));
        assert!(rounds_up(false, Tail::AboveHalf));
    }

    #[test]
    fn test_group_helpers() {
        assert_eq!(&group_text(42), b"000000042");
        assert_eq!(digit_count(0), 0);
        assert_eq!(digit_count(100_000_000), 9);
    }
}
