//! Compact arbitrary precision integers.
//!
//! [`CompactInteger`] stores magnitudes of up to two 64-bit limbs inline and
//! only reaches for the heap (a `dashu::IBig`) once a result no longer fits.
//! Inline/inline arithmetic is done limb-wise with explicit overflow
//! detection; every other storage combination defers to `dashu`.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::iter::{Product, Sum};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use dashu::base::{BitTest, Signed as DashuSigned, UnsignedAbs};
use dashu::integer::{IBig, UBig};
use num_traits::{One, Zero};

/// Width of a single limb in bits.
pub const LIMB_BITS: u32 = 64;
/// Number of limbs stored inline.
pub const INLINE_LIMBS: usize = 2;
/// Largest magnitude width (in bits) that is stored inline.
pub const INLINE_BITS: usize = LIMB_BITS as usize * INLINE_LIMBS;

/// A signed arbitrary precision integer with a small-value fast path.
///
/// Values whose magnitude fits in two limbs live inline; larger values are
/// promoted to heap storage. The representation is canonical: a heap value
/// never holds a magnitude that fits inline, and zero is never negative.
/// Equality and hashing are therefore structural.
#[derive(PartialEq, Eq, Hash)]
pub struct CompactInteger(Repr);

impl Clone for CompactInteger {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }

    fn clone_from(&mut self, source: &Self) {
        self.0.clone_from(&source.0);
    }
}

#[derive(PartialEq, Eq, Hash)]
enum Repr {
    /// Sign and a double-word magnitude (limbs `lo`, `hi`).
    Inline { negative: bool, magnitude: u128 },
    /// Owned multiprecision value, always wider than [`INLINE_BITS`].
    Heap(IBig),
}

impl Clone for Repr {
    fn clone(&self) -> Self {
        match self {
            Self::Inline {
                negative,
                magnitude,
            } => Self::Inline {
                negative: *negative,
                magnitude: *magnitude,
            },
            Self::Heap(big) => Self::Heap(big.clone()),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        match (self, source) {
            (Self::Heap(dst), Self::Heap(src)) => dst.clone_from(src),
            (dst, src) => *dst = src.clone(),
        }
    }
}

#[inline]
fn split_limbs(value: u128) -> (u64, u64) {
    #[allow(clippy::cast_possible_truncation)]
    let lo = value as u64;
    #[allow(clippy::cast_possible_truncation)]
    let hi = (value >> LIMB_BITS) as u64;
    (lo, hi)
}

/// Adds two signed double-word magnitudes.
///
/// Returns `None` when the sum needs a third limb.
#[inline]
fn add_signed(an: bool, am: u128, bn: bool, bm: u128) -> Option<(bool, u128)> {
    let (negative, magnitude) = if an == bn {
        (an, am.checked_add(bm)?)
    } else if am >= bm {
        (an, am - bm)
    } else {
        (bn, bm - am)
    };
    Some((negative && magnitude != 0, magnitude))
}

/// Schoolbook product of two double-word magnitudes.
///
/// Returns `None` when the product needs more than two limbs.
#[inline]
fn mul_magnitudes(a: u128, b: u128) -> Option<u128> {
    let (a_lo, a_hi) = split_limbs(a);
    let (b_lo, b_hi) = split_limbs(b);

    // hi * hi lands entirely in limbs 2 and 3.
    if a_hi != 0 && b_hi != 0 {
        return None;
    }

    let low = u128::from(a_lo) * u128::from(b_lo);
    // At most one of the cross products is non-zero here.
    let cross = u128::from(a_hi) * u128::from(b_lo) + u128::from(a_lo) * u128::from(b_hi);
    if cross >> LIMB_BITS != 0 {
        return None;
    }
    low.checked_add(cross << LIMB_BITS)
}

impl CompactInteger {
    /// Creates a new integer from an i64.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self::from_i128(i128::from(value))
    }

    #[inline]
    const fn inline(negative: bool, magnitude: u128) -> Self {
        Self(Repr::Inline {
            negative: negative && magnitude != 0,
            magnitude,
        })
    }

    fn from_i128(value: i128) -> Self {
        Self::inline(value < 0, value.unsigned_abs())
    }

    /// Builds a canonical integer from a backend value, demoting to inline
    /// storage when the magnitude fits.
    #[must_use]
    pub fn from_ibig(value: IBig) -> Self {
        let negative = DashuSigned::is_negative(&value);
        let magnitude: UBig = value.unsigned_abs();
        if magnitude.bit_len() <= INLINE_BITS {
            if let Ok(small) = u128::try_from(&magnitude) {
                return Self::inline(negative, small);
            }
        }
        let big = IBig::from(magnitude);
        Self(Repr::Heap(if negative { -big } else { big }))
    }

    /// Creates an integer from a string in the given base.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid integer.
    pub fn from_str_radix(s: &str, radix: u32) -> Result<Self, dashu::base::error::ParseError> {
        IBig::from_str_radix(s, radix).map(Self::from_ibig)
    }

    /// Returns true if the value is stored inline.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        matches!(self.0, Repr::Inline { .. })
    }

    /// Returns the sign: -1, 0, or 1.
    #[must_use]
    pub fn signum(&self) -> i8 {
        match &self.0 {
            Repr::Inline { magnitude: 0, .. } => 0,
            Repr::Inline { negative: true, .. } => -1,
            Repr::Inline { .. } => 1,
            Repr::Heap(big) if DashuSigned::is_negative(big) => -1,
            Repr::Heap(_) => 1,
        }
    }

    /// Returns true if this integer is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.signum() < 0
    }

    /// Returns the absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        if self.is_negative() {
            -self
        } else {
            self.clone()
        }
    }

    /// Returns the number of bits needed to represent the magnitude.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        match &self.0 {
            Repr::Inline { magnitude, .. } => (u128::BITS - magnitude.leading_zeros()) as usize,
            Repr::Heap(big) => big.bit_len(),
        }
    }

    /// Attempts to convert to an i64.
    ///
    /// Returns `None` if the value doesn't fit in an i64.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        self.to_i128().and_then(|v| i64::try_from(v).ok())
    }

    /// Attempts to convert to an i128.
    #[must_use]
    pub fn to_i128(&self) -> Option<i128> {
        match self.0 {
            Repr::Inline {
                negative: false,
                magnitude,
            } => i128::try_from(magnitude).ok(),
            Repr::Inline {
                negative: true,
                magnitude,
            } => 0i128.checked_sub_unsigned(magnitude),
            Repr::Heap(_) => None,
        }
    }

    /// Returns the value as a backend integer.
    #[must_use]
    pub fn to_ibig(&self) -> IBig {
        self.as_ibig().into_owned()
    }

    /// Consumes the value, returning a backend integer.
    #[must_use]
    pub fn into_ibig(self) -> IBig {
        match self.0 {
            Repr::Inline {
                negative,
                magnitude,
            } => {
                let big = IBig::from(magnitude);
                if negative {
                    -big
                } else {
                    big
                }
            }
            Repr::Heap(big) => big,
        }
    }

    fn as_ibig(&self) -> Cow<'_, IBig> {
        match &self.0 {
            Repr::Inline { .. } => Cow::Owned(self.clone().into_ibig()),
            Repr::Heap(big) => Cow::Borrowed(big),
        }
    }

    /// Restores the canonical form after a heap operation.
    fn normalize(&mut self) {
        if let Repr::Heap(big) = &mut self.0 {
            if big.bit_len() <= INLINE_BITS {
                *self = Self::from_ibig(std::mem::take(big));
            }
        }
    }

    fn add_assign_signed(&mut self, rhs: &Self, negate: bool) {
        if let (
            Repr::Inline {
                negative: an,
                magnitude: am,
            },
            Repr::Inline {
                negative: bn,
                magnitude: bm,
            },
        ) = (&mut self.0, &rhs.0)
        {
            if let Some((negative, magnitude)) = add_signed(*an, *am, *bn ^ negate, *bm) {
                *an = negative;
                *am = magnitude;
                return;
            }
        }

        let rhs = rhs.as_ibig();
        if let Repr::Heap(big) = &mut self.0 {
            if negate {
                *big -= &*rhs;
            } else {
                *big += &*rhs;
            }
        } else {
            let lhs = self.to_ibig();
            let sum = if negate { lhs - &*rhs } else { lhs + &*rhs };
            self.0 = Repr::Heap(sum);
        }
        self.normalize();
    }

    fn mul_ref(lhs: &Self, rhs: &Self) -> Self {
        if let (
            Repr::Inline {
                negative: an,
                magnitude: am,
            },
            Repr::Inline {
                negative: bn,
                magnitude: bm,
            },
        ) = (&lhs.0, &rhs.0)
        {
            if let Some(magnitude) = mul_magnitudes(*am, *bm) {
                return Self::inline(an ^ bn, magnitude);
            }
        }
        Self::from_ibig(&*lhs.as_ibig() * &*rhs.as_ibig())
    }

    /// Computes `self += a * b` without materialising a heap temporary when
    /// the product fits inline.
    pub fn add_mul(&mut self, a: &Self, b: &Self) {
        if let (
            Repr::Inline {
                negative: an,
                magnitude: am,
            },
            Repr::Inline {
                negative: bn,
                magnitude: bm,
            },
        ) = (&a.0, &b.0)
        {
            if let Some(magnitude) = mul_magnitudes(*am, *bm) {
                self.add_assign_signed(&Self::inline(an ^ bn, magnitude), false);
                return;
            }
        }

        let product = &*a.as_ibig() * &*b.as_ibig();
        if let Repr::Heap(big) = &mut self.0 {
            *big += &product;
        } else {
            let sum = self.to_ibig() + product;
            self.0 = Repr::Heap(sum);
        }
        self.normalize();
    }

    /// Computes self^exp for non-negative exp.
    #[must_use]
    pub fn pow(&self, exp: u32) -> Self {
        let mut result = Self::one();
        let mut base = self.clone();
        let mut exp = exp;

        while exp > 0 {
            if exp & 1 == 1 {
                result *= &base;
            }
            exp >>= 1;
            if exp > 0 {
                base = &base * &base;
            }
        }

        result
    }
}

impl Default for CompactInteger {
    fn default() -> Self {
        Self::inline(false, 0)
    }
}

impl Zero for CompactInteger {
    fn zero() -> Self {
        Self::default()
    }

    fn is_zero(&self) -> bool {
        matches!(self.0, Repr::Inline { magnitude: 0, .. })
    }
}

impl One for CompactInteger {
    fn one() -> Self {
        Self::inline(false, 1)
    }

    fn is_one(&self) -> bool {
        matches!(
            self.0,
            Repr::Inline {
                negative: false,
                magnitude: 1
            }
        )
    }
}

impl PartialOrd for CompactInteger {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CompactInteger {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (
                Repr::Inline {
                    negative: an,
                    magnitude: am,
                },
                Repr::Inline {
                    negative: bn,
                    magnitude: bm,
                },
            ) => match (an, bn) {
                (false, false) => am.cmp(bm),
                (true, true) => bm.cmp(am),
                (false, true) => Ordering::Greater,
                (true, false) => Ordering::Less,
            },
            (Repr::Heap(a), Repr::Heap(b)) => a.cmp(b),
            // A heap magnitude always exceeds every inline magnitude.
            (Repr::Heap(a), Repr::Inline { .. }) => {
                if DashuSigned::is_negative(a) {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (Repr::Inline { .. }, Repr::Heap(b)) => {
                if DashuSigned::is_negative(b) {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
        }
    }
}

impl fmt::Debug for CompactInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Inline { .. } => write!(f, "CompactInteger({self})"),
            Repr::Heap(big) => write!(f, "CompactInteger(heap: {big})"),
        }
    }
}

impl fmt::Display for CompactInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Inline {
                negative,
                magnitude,
            } => {
                if *negative {
                    write!(f, "-{magnitude}")
                } else {
                    write!(f, "{magnitude}")
                }
            }
            Repr::Heap(big) => write!(f, "{big}"),
        }
    }
}

impl FromStr for CompactInteger {
    type Err = dashu::base::error::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_radix(s, 10)
    }
}

// Arithmetic operations

impl Neg for CompactInteger {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self.0 {
            Repr::Inline {
                negative,
                magnitude,
            } => Self::inline(!negative, magnitude),
            Repr::Heap(big) => Self(Repr::Heap(-big)),
        }
    }
}

impl Neg for &CompactInteger {
    type Output = CompactInteger;

    fn neg(self) -> Self::Output {
        -self.clone()
    }
}

impl AddAssign<&CompactInteger> for CompactInteger {
    fn add_assign(&mut self, rhs: &CompactInteger) {
        self.add_assign_signed(rhs, false);
    }
}

impl AddAssign for CompactInteger {
    fn add_assign(&mut self, rhs: CompactInteger) {
        self.add_assign_signed(&rhs, false);
    }
}

impl SubAssign<&CompactInteger> for CompactInteger {
    fn sub_assign(&mut self, rhs: &CompactInteger) {
        self.add_assign_signed(rhs, true);
    }
}

impl SubAssign for CompactInteger {
    fn sub_assign(&mut self, rhs: CompactInteger) {
        self.add_assign_signed(&rhs, true);
    }
}

impl MulAssign<&CompactInteger> for CompactInteger {
    fn mul_assign(&mut self, rhs: &CompactInteger) {
        *self = CompactInteger::mul_ref(self, rhs);
    }
}

impl MulAssign for CompactInteger {
    fn mul_assign(&mut self, rhs: CompactInteger) {
        *self = CompactInteger::mul_ref(self, &rhs);
    }
}

macro_rules! forward_binop {
    ($Op:ident, $op:ident, $OpAssign:ident, $op_assign:ident) => {
        impl $Op for CompactInteger {
            type Output = CompactInteger;

            fn $op(mut self, rhs: CompactInteger) -> Self::Output {
                $OpAssign::$op_assign(&mut self, &rhs);
                self
            }
        }

        impl $Op<&CompactInteger> for CompactInteger {
            type Output = CompactInteger;

            fn $op(mut self, rhs: &CompactInteger) -> Self::Output {
                $OpAssign::$op_assign(&mut self, rhs);
                self
            }
        }

        impl $Op<CompactInteger> for &CompactInteger {
            type Output = CompactInteger;

            fn $op(self, rhs: CompactInteger) -> Self::Output {
                let mut result = self.clone();
                $OpAssign::$op_assign(&mut result, &rhs);
                result
            }
        }

        impl $Op for &CompactInteger {
            type Output = CompactInteger;

            fn $op(self, rhs: &CompactInteger) -> Self::Output {
                let mut result = self.clone();
                $OpAssign::$op_assign(&mut result, rhs);
                result
            }
        }
    };
}

forward_binop!(Add, add, AddAssign, add_assign);
forward_binop!(Sub, sub, SubAssign, sub_assign);
forward_binop!(Mul, mul, MulAssign, mul_assign);

impl Sum for CompactInteger {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |mut acc, x| {
            acc += &x;
            acc
        })
    }
}

impl<'a> Sum<&'a CompactInteger> for CompactInteger {
    fn sum<I: Iterator<Item = &'a CompactInteger>>(iter: I) -> Self {
        iter.fold(Self::zero(), |mut acc, x| {
            acc += x;
            acc
        })
    }
}

impl Product for CompactInteger {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::one(), |acc, x| acc * x)
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {
        $(
            impl From<$t> for CompactInteger {
                fn from(value: $t) -> Self {
                    Self::from_i128(i128::from(value))
                }
            }
        )*
    };
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {
        $(
            impl From<$t> for CompactInteger {
                fn from(value: $t) -> Self {
                    Self::inline(false, u128::from(value))
                }
            }
        )*
    };
}

from_signed!(i8, i16, i32, i64, i128);
from_unsigned!(u8, u16, u32, u64, u128);

impl From<isize> for CompactInteger {
    fn from(value: isize) -> Self {
        Self::from_i128(value as i128)
    }
}

impl From<usize> for CompactInteger {
    fn from(value: usize) -> Self {
        Self::inline(false, value as u128)
    }
}

impl From<IBig> for CompactInteger {
    fn from(value: IBig) -> Self {
        Self::from_ibig(value)
    }
}

impl From<CompactInteger> for IBig {
    fn from(value: CompactInteger) -> Self {
        value.into_ibig()
    }
}
