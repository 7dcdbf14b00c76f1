//! Fixed-point numbers: an exact [Decimal] carried on the wire as an integer
//! scaled by `2^fraction_bits`.
//!
//! Decoding never goes through binary floating point. A raw integer `r` with
//! `f` fraction bits is exactly `r * 5^f / 10^f`, so the decoded decimal has
//! at most `f` fractional digits and compares equal across platforms.

use std::fmt;
use std::str::FromStr;

use crate::{
    bytes,
    wire::{Endianness, Primitive},
};

/// An exact decimal number `mantissa / 10^scale`, kept normalized
/// (no trailing zero digits in the fraction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

impl Decimal {
    /// Largest number of fractional digits kept. Covers the shortest decimal
    /// form of every finite `f64`.
    pub const MAX_SCALE: u32 = 400;

    /// Builds `mantissa / 10^scale`. Scales above [Decimal::MAX_SCALE] are
    /// rounded half to even onto `10^-MAX_SCALE`.
    pub fn new(mut mantissa: i128, mut scale: u32) -> Self {
        if scale > Self::MAX_SCALE {
            // |mantissa| < 10^39, so 39 or more dropped digits always round to zero.
            mantissa = 10i128
                .checked_pow(scale - Self::MAX_SCALE)
                .map_or(0, |d| div_round_half_even(mantissa, d));
            scale = Self::MAX_SCALE;
        }

        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }

        Decimal { mantissa, scale }
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Converts through the shortest decimal representation of `value`.
    pub fn from_f64(value: f64) -> Result<Self, ParseDecimalError> {
        if !value.is_finite() {
            return Err(ParseDecimalError::Invalid(value.to_string()));
        }

        format!("{value}").parse()
    }

    /// Nearest binary float; lossy.
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal::new(value as i128, 0)
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal::new(value as i128, 0)
    }
}

/// Errors from parsing a [Decimal] out of text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseDecimalError {
    #[error("`{0}` is not a decimal number")]
    Invalid(String),
    #[error("`{0}` has too many digits")]
    Overflow(String),
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseDecimalError::Invalid(s.to_string());

        let (negative, unsigned) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (unsigned, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        // Trailing fractional zeros carry no value and must not overflow.
        let frac_part = frac_part.trim_end_matches('0');

        let overflow = || ParseDecimalError::Overflow(s.to_string());
        let mut mantissa = 0i128;
        let mut scale = 0u32;

        for (i, c) in int_part.chars().chain(frac_part.chars()).enumerate() {
            let digit = c.to_digit(10).ok_or_else(invalid)? as i128;

            match mantissa.checked_mul(10).and_then(|m| m.checked_add(digit)) {
                Some(m) => {
                    mantissa = m;
                    if i >= int_part.len() {
                        scale += 1;
                    }
                }
                // Fraction digits beyond i128 precision are rounded off.
                None if i >= int_part.len() => {
                    let dropped = &frac_part[i - int_part.len()..];
                    if !dropped.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(invalid());
                    }

                    let first = dropped.as_bytes()[0];
                    let tail = dropped[1..].bytes().any(|b| b != b'0');
                    if first > b'5' || (first == b'5' && (tail || mantissa % 2 == 1)) {
                        mantissa = mantissa.checked_add(1).ok_or_else(overflow)?;
                    }
                    break;
                }
                None => return Err(overflow()),
            }
        }

        if negative {
            mantissa = -mantissa;
        }

        Ok(Decimal::new(mantissa, scale))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.unsigned_abs().to_string();
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let scale = self.scale as usize;

        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }

        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

/// Errors produced by the fixed-point codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixedPointError {
    /// The base is not an integer primitive.
    #[error("fixed-point base must be an integer primitive, got `{0}`")]
    InvalidBase(char),
    /// Decoded values would not fit an exact decimal.
    #[error("{fraction_bits} fraction bits cannot be decoded exactly from a {bits}-bit base")]
    PrecisionTooLarge { fraction_bits: u32, bits: u32 },
    /// The scaled value overflows the base integer.
    #[error("{0} does not fit the fixed-point range")]
    OutOfRange(String),
}

/// A fixed-point wire format: integer base plus fraction bit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPoint {
    base: Primitive,
    fraction_bits: u32,
}

impl FixedPoint {
    pub fn new(base: Primitive, fraction_bits: u32) -> Result<Self, FixedPointError> {
        let Some((min, max)) = base.int_range() else {
            return Err(FixedPointError::InvalidBase(base.code()));
        };

        // Every raw value times 5^f must fit the decimal mantissa, and 2^f
        // must be representable for encoding.
        let magnitude = max.max(-min);
        let exact = 5i128
            .checked_pow(fraction_bits)
            .and_then(|p| magnitude.checked_mul(p))
            .and_then(|_| 2i128.checked_pow(fraction_bits));

        if exact.is_none() {
            return Err(FixedPointError::PrecisionTooLarge {
                fraction_bits,
                bits: base.bits(),
            });
        }

        Ok(FixedPoint {
            base,
            fraction_bits,
        })
    }

    pub fn base(&self) -> Primitive {
        self.base
    }

    pub fn fraction_bits(&self) -> u32 {
        self.fraction_bits
    }

    pub fn width(&self) -> usize {
        self.base.width()
    }

    /// `round(value * 2^fraction_bits)`, rounding half to even, range-checked.
    pub fn to_raw(&self, value: &Decimal) -> Result<i128, FixedPointError> {
        let out_of_range = || FixedPointError::OutOfRange(value.to_string());

        let magnitude = value.mantissa.unsigned_abs();
        let bits = self.fraction_bits;
        let scale = value.scale;

        // 10^scale = 5^scale * 2^scale, which keeps every divisor in a u128.
        let raw = match 10u128.checked_pow(scale) {
            Some(divisor) => scaled_round_half_even(magnitude, divisor, bits),
            None if scale >= bits => {
                let divisor = 5u128
                    .checked_pow(scale)
                    .zip(2u128.checked_pow(scale - bits))
                    .and_then(|(five, two)| five.checked_mul(two));
                match divisor {
                    Some(divisor) => scaled_round_half_even(magnitude, divisor, 0),
                    // The divisor exceeds twice any i128 magnitude.
                    None => Some(0),
                }
            }
            None => 5u128
                .checked_pow(scale)
                .and_then(|five| scaled_round_half_even(magnitude, five, bits - scale)),
        }
        .ok_or_else(out_of_range)?;

        let raw = i128::try_from(raw).map_err(|_| out_of_range())?;
        let raw = if value.mantissa < 0 { -raw } else { raw };

        if !self.base.fits(raw) {
            return Err(out_of_range());
        }

        Ok(raw)
    }

    /// The exact decimal `raw / 2^fraction_bits`.
    pub fn from_raw(&self, raw: i128) -> Decimal {
        // Bounded by the check in `new` for any raw value within the base range.
        let five_pow = 5i128.pow(self.fraction_bits);
        Decimal::new(raw * five_pow, self.fraction_bits)
    }

    /// The value a pack/unpack round trip of `value` produces.
    pub fn quantize(&self, value: &Decimal) -> Result<Decimal, FixedPointError> {
        Ok(self.from_raw(self.to_raw(value)?))
    }

    pub fn encode(&self, value: &Decimal, endianness: Endianness) -> Result<Vec<u8>, FixedPointError> {
        let raw = self.to_raw(value)?;
        let mut out = Vec::with_capacity(self.width());
        bytes::write_integer(&mut out, raw, self.base, endianness);
        Ok(out)
    }

    /// Decodes exactly [FixedPoint::width] bytes.
    pub fn decode(&self, raw: &[u8], endianness: Endianness) -> Decimal {
        self.from_raw(bytes::read_integer(raw, self.base, endianness))
    }
}

/// `round(n * 2^shift / d)` on magnitudes, half to even, by binary long
/// division. `None` if the quotient overflows.
fn scaled_round_half_even(n: u128, d: u128, shift: u32) -> Option<u128> {
    let mut q = n / d;
    let mut r = n % d;

    for _ in 0..shift {
        q = q.checked_mul(2)?;
        if r >= d - r {
            r -= d - r;
            q += 1;
        } else {
            r *= 2;
        }
    }

    if r > d - r || (r == d - r && q % 2 != 0) {
        q = q.checked_add(1)?;
    }

    Some(q)
}

fn div_round_half_even(n: i128, d: i128) -> i128 {
    let q = n / d;
    let r = n % d;

    if r == 0 {
        return q;
    }

    let twice = r.unsigned_abs() * 2;
    let d = d.unsigned_abs();

    if twice > d || (twice == d && q % 2 != 0) {
        q + n.signum()
    } else {
        q
    }
}
