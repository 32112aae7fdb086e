//! The value of a generic `Number64` node.
//!
//! JSON has one number kind. [`Number64`] keeps integers exact up to the full
//! `i64` range and stores everything else as `f64`. Equality is numeric, so
//! `Number64::from(1)` equals `Number64::from(1.0)`: the binary encoder is free
//! to store an integral double in an integer slot and still round-trip.

use std::cmp::Ordering;
use std::fmt;

/// A JSON number: an exact 64-bit integer or a double.
///
/// # Examples
///
/// ```rust
/// use dual_json::Number64;
///
/// let integer = Number64::from(42);
/// let float = Number64::from(3.5);
///
/// assert!(integer.is_integer());
/// assert_eq!(integer.as_i64(), Some(42));
/// assert_eq!(float.as_f64(), 3.5);
/// assert_eq!(Number64::from(2), Number64::from(2.0));
/// ```
#[derive(Clone, Copy, Debug)]
pub enum Number64 {
    Int(i64),
    Double(f64),
}

impl Number64 {
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number64::Int(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_double(&self) -> bool {
        matches!(self, Number64::Double(_))
    }

    /// Returns the value as `i64` when it is integral and in range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dual_json::Number64;
    ///
    /// assert_eq!(Number64::from(42.0).as_i64(), Some(42));
    /// assert_eq!(Number64::from(42.5).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number64::Int(i) => Some(i),
            Number64::Double(f) => double_as_i64(f),
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number64::Int(i) => i as f64,
            Number64::Double(f) => f,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match *self {
            Number64::Int(_) => true,
            Number64::Double(f) => f.is_finite(),
        }
    }
}

/// Converts an integral double that round-trips through `i64`. Negative zero
/// is not integral for this purpose since `i64` would drop its sign.
pub(crate) fn double_as_i64(f: f64) -> Option<i64> {
    if f.fract() != 0.0 || !f.is_finite() || (f == 0.0 && f.is_sign_negative()) {
        return None;
    }
    // i64::MAX as f64 rounds up to 2^63, which is out of range.
    if f >= -9_223_372_036_854_775_808.0 && f < 9_223_372_036_854_775_808.0 {
        Some(f as i64)
    } else {
        None
    }
}

impl PartialEq for Number64 {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Number64::Int(a), Number64::Int(b)) => a == b,
            (Number64::Int(i), Number64::Double(f)) | (Number64::Double(f), Number64::Int(i)) => {
                double_as_i64(f) == Some(i) || (f == 0.0 && i == 0)
            }
            (Number64::Double(a), Number64::Double(b)) => a == b,
        }
    }
}

impl PartialOrd for Number64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (*self, *other) {
            (Number64::Int(a), Number64::Int(b)) => Some(a.cmp(&b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number64::Int(i) => write!(f, "{}", i),
            // `{:?}` keeps a fraction or exponent, so the text re-parses as a double.
            Number64::Double(d) => write!(f, "{:?}", d),
        }
    }
}

macro_rules! number_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Number64 {
                fn from(value: $t) -> Self {
                    Number64::Int(i64::from(value))
                }
            }
        )*
    };
}

number_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Number64 {
    fn from(value: f32) -> Self {
        Number64::Double(f64::from(value))
    }
}

impl From<f64> for Number64 {
    fn from(value: f64) -> Self {
        Number64::Double(value)
    }
}
