use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use crate::error::TimeError;

/// Fixed precision used when a float has to be turned into a fraction
pub const FLOAT_PRECISION: i64 = 1_000_000;

/// Rational number representation for precise timing
///
/// Always stored in lowest terms with a positive denominator, so the derived
/// `PartialEq`/`Hash` agree with numeric equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fraction {
    pub numerator: i64,
    pub denominator: i64,
}

impl Fraction {
    /// Create a new fraction and simplify it
    ///
    /// Panics on a zero denominator, like integer division does. Use
    /// [`Fraction::checked_new`] where the denominator comes from user input.
    pub fn new(numerator: i64, denominator: i64) -> Self {
        match Self::checked_new(numerator, denominator) {
            Ok(f) => f,
            Err(e) => panic!("{}", e),
        }
    }

    /// Create a new fraction, failing on a zero denominator
    pub fn checked_new(numerator: i64, denominator: i64) -> Result<Self, TimeError> {
        if denominator == 0 {
            return Err(TimeError::ZeroDenominator);
        }
        Ok(Self::reduce(numerator as i128, denominator as i128))
    }

    /// Create a fraction from a whole number
    pub fn from_int(n: i64) -> Self {
        Fraction {
            numerator: n,
            denominator: 1,
        }
    }

    /// Create a fraction from a float (approximation at [`FLOAT_PRECISION`])
    ///
    /// Integral floats convert exactly. Non-finite input maps to zero.
    pub fn from_float(f: f64) -> Self {
        if !f.is_finite() {
            return Fraction::from_int(0);
        }
        if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
            return Fraction::from_int(f as i64);
        }
        let n = (f * FLOAT_PRECISION as f64).round() as i64;
        Fraction::new(n, FLOAT_PRECISION)
    }

    /// Exact conversion from decimal text: `"3"`, `"-0.25"`, `"3/4"`
    pub fn from_decimal_str(s: &str) -> Result<Self, TimeError> {
        let text = s.trim();
        let invalid = || TimeError::InvalidNumber(s.to_string());

        if let Some((num, den)) = text.split_once('/') {
            let n: i64 = num.trim().parse().map_err(|_| invalid())?;
            let d: i64 = den.trim().parse().map_err(|_| invalid())?;
            return Self::checked_new(n, d);
        }

        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.len() > 18 {
            return Err(invalid());
        }
        let scale = 10i128.pow(frac_part.len() as u32);
        let whole: i128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let frac: i128 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| invalid())?
        };

        let mut numerator = whole * scale + frac;
        if negative {
            numerator = -numerator;
        }
        Self::try_reduce(numerator, scale).ok_or_else(invalid)
    }

    /// Convert to float
    pub fn to_float(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    fn try_reduce(numerator: i128, denominator: i128) -> Option<Self> {
        let gcd = Self::gcd(numerator.abs(), denominator.abs()).max(1);
        let mut n = numerator / gcd;
        let mut d = denominator / gcd;

        // Keep denominator positive
        if d < 0 {
            n = -n;
            d = -d;
        }

        Some(Fraction {
            numerator: i64::try_from(n).ok()?,
            denominator: i64::try_from(d).ok()?,
        })
    }

    fn reduce(numerator: i128, denominator: i128) -> Self {
        match Self::try_reduce(numerator, denominator) {
            Some(f) => f,
            None => panic!("fraction overflow: {}/{}", numerator, denominator),
        }
    }

    /// Greatest common divisor
    fn gcd(mut a: i128, mut b: i128) -> i128 {
        while b != 0 {
            let temp = b;
            b = a % b;
            a = temp;
        }
        a
    }

    /// Get the reciprocal
    pub fn reciprocal(self) -> Self {
        Fraction::new(self.denominator, self.numerator)
    }

    /// Division that reports a zero divisor instead of panicking
    pub fn checked_div(self, other: Self) -> Result<Self, TimeError> {
        if other.is_zero() {
            return Err(TimeError::ZeroDenominator);
        }
        Ok(self / other)
    }

    /// Addition that reports overflow instead of panicking
    pub fn checked_add(self, other: Self) -> Result<Self, TimeError> {
        let n = self.numerator as i128 * other.denominator as i128
            + other.numerator as i128 * self.denominator as i128;
        let d = self.denominator as i128 * other.denominator as i128;
        Self::try_reduce(n, d).ok_or(TimeError::Overflow)
    }

    pub fn checked_mul(self, other: Self) -> Result<Self, TimeError> {
        Self::try_reduce(
            self.numerator as i128 * other.numerator as i128,
            self.denominator as i128 * other.denominator as i128,
        )
        .ok_or(TimeError::Overflow)
    }

    /// Check if fraction is zero
    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    /// Check if fraction is negative
    pub fn is_negative(&self) -> bool {
        self.numerator < 0
    }

    /// Absolute value
    pub fn abs(self) -> Self {
        Fraction::new(self.numerator.abs(), self.denominator)
    }

    /// Floor as a plain integer (rounds toward negative infinity)
    pub fn floor_int(self) -> i64 {
        self.numerator.div_euclid(self.denominator)
    }

    /// Floor - round down to nearest integer
    pub fn floor(self) -> Self {
        Fraction::from_int(self.floor_int())
    }

    /// Ceiling - round up to nearest integer
    pub fn ceil(self) -> Self {
        let floor = self.floor_int();
        if self.denominator == 1 {
            Fraction::from_int(floor)
        } else {
            Fraction::from_int(floor + 1)
        }
    }

    /// Fractional part, always in `[0, 1)`
    pub fn fract(self) -> Self {
        self - self.floor()
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Fraction::from_int(0)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl FromStr for Fraction {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fraction::from_decimal_str(s)
    }
}

impl From<i64> for Fraction {
    fn from(n: i64) -> Self {
        Fraction::from_int(n)
    }
}

impl From<f64> for Fraction {
    fn from(f: f64) -> Self {
        Fraction::from_float(f)
    }
}

impl From<(i64, i64)> for Fraction {
    fn from((num, den): (i64, i64)) -> Self {
        Fraction::new(num, den)
    }
}

impl Add for Fraction {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let n = self.numerator as i128 * other.denominator as i128
            + other.numerator as i128 * self.denominator as i128;
        let d = self.denominator as i128 * other.denominator as i128;
        Fraction::reduce(n, d)
    }
}

impl Sub for Fraction {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self + (-other)
    }
}

impl Mul for Fraction {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Fraction::reduce(
            self.numerator as i128 * other.numerator as i128,
            self.denominator as i128 * other.denominator as i128,
        )
    }
}

impl Div for Fraction {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn div(self, other: Self) -> Self {
        // Division is multiplication by the reciprocal
        self * other.reciprocal()
    }
}

impl Neg for Fraction {
    type Output = Self;

    fn neg(self) -> Self {
        Fraction {
            numerator: -self.numerator,
            denominator: self.denominator,
        }
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.numerator as i128 * other.denominator as i128;
        let rhs = other.numerator as i128 * self.denominator as i128;
        lhs.cmp(&rhs)
    }
}
