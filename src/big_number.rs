//! Arbitrary-width non-negative integer arithmetic used by the SRP-6a math
//! in [`crate::srp`]: modular exponentiation, modular subtraction, and
//! uniformly-distributed random scalars bounded by a modulus.

use derive_more::{Display, Error};
use num_bigint::{BigUint, RandBigInt};
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt::{Debug, Formatter};

pub use num_traits::Zero;
pub use std::ops::{Add, Mul, Rem, Sub};

/// Wraps [`BigUint`] behind a type that speaks hex, big-endian bytes, and
/// fixed-width padding the way the SRP wire format needs.
#[derive(PartialEq, Eq, Clone, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BigNumber(BigUint);

#[derive(Error, Display, Debug)]
pub enum BigNumberError {
    #[display("invalid hex string")]
    InvalidHexStr,
}

impl Default for BigNumber {
    fn default() -> Self {
        Self(BigUint::new(vec![]))
    }
}

impl BigNumber {
    /// A uniformly random value with `n_bytes` of entropy before any
    /// reduction — callers needing a value in `[1, modulus)` should use
    /// [`BigNumber::random_in_range`] instead.
    pub fn new_rand(n_bytes: usize) -> Self {
        let mut rng = thread_rng();
        Self(rng.gen_biguint((n_bytes * 8) as u64))
    }

    /// Draws a value in `[1, modulus)`. `paranoia` (0..=10) scales the
    /// byte-width of the candidate drawn before reduction: higher paranoia
    /// spends more raw entropy on the private exponent before it is folded
    /// into range, at the cost of a slightly biased (but cryptographically
    /// negligible) distribution from the modular reduction. Resamples on
    /// the vanishingly rare `candidate == 0` draw.
    pub fn random_in_range(modulus: &Self, paranoia: u8) -> Self {
        let candidate_bytes = 128 + (paranoia as usize) * 8;
        loop {
            let candidate = Self::new_rand(candidate_bytes);
            if candidate.is_zero() {
                continue;
            }
            let reduced = &candidate % modulus;
            if !reduced.is_zero() {
                return reduced;
            }
        }
    }

    /// `raw` is expected to be big-endian.
    pub fn from_bytes_be(raw: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(raw))
    }

    /// `raw` is expected to be little-endian.
    pub fn from_bytes_le(raw: &[u8]) -> Self {
        Self(BigUint::from_bytes_le(raw))
    }

    pub fn from_hex_str_be(str: &str) -> Result<Self, BigNumberError> {
        let str = if str.len() % 2 != 0 {
            format!("{:0>len$}", str, len = (str.len() / 2 + 1) * 2)
        } else {
            str.to_owned()
        };

        Ok(Self::from_bytes_be(
            hex::decode(str).map_err(|_| BigNumberError::InvalidHexStr)?.as_slice(),
        ))
    }

    pub fn modpow(&self, exponent: &Self, modulus: &Self) -> Self {
        self.0.modpow(&exponent.0, &modulus.0).into()
    }

    /// `(self - other) mod modulus`, always returning a value in
    /// `[0, modulus)` regardless of whether `self < other`.
    pub fn mod_sub(&self, other: &Self, modulus: &Self) -> Self {
        let a = self % modulus;
        let b = other % modulus;
        if a < b {
            &(modulus - &b) + &a
        } else {
            &a - &b
        }
    }

    pub fn num_bytes(&self) -> usize {
        (self.0.bits() as usize).div_ceil(8).max(1)
    }

    /// Big-endian byte vector (no padding).
    pub fn to_bytes_be(&self) -> Vec<u8> {
        self.0.to_bytes_be()
    }

    /// Little-endian byte vector (no padding) — some of the device-SRP
    /// scratch values are easiest expressed this way.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_bytes_le()
    }

    /// Big-endian bytes, left-zero-padded to exactly `len` bytes. Panics if
    /// the value doesn't fit (callers choose `len` from the modulus width).
    pub fn to_bytes_be_padded(&self, len: usize) -> Vec<u8> {
        let raw = self.to_bytes_be();
        assert!(raw.len() <= len, "value does not fit in {len} bytes");
        let mut out = vec![0_u8; len - raw.len()];
        out.extend_from_slice(&raw);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_exp() {
        let a = BigNumber::from_hex_str_be("6").unwrap();
        let p = BigNumber::from_hex_str_be("3").unwrap();
        let m = BigNumber::from_hex_str_be("7").unwrap();
        assert_eq!(a.modpow(&p, &m), BigNumber::from(6));
    }

    #[test]
    fn should_try_from_string() {
        use std::convert::TryInto;
        let s = "ab11cd".to_string();
        let x: BigNumber = s.try_into().unwrap();
        assert_eq!(x.to_bytes_be(), &[0xab, 0x11, 0xcd]);
    }

    #[test]
    fn should_pad_big_endian() {
        let x = BigNumber::from_bytes_be(&[0x11, 0xcd]);
        assert_eq!(x.to_bytes_be_padded(4), vec![0, 0, 0x11, 0xcd]);
    }

    #[test]
    fn mod_sub_wraps_when_negative() {
        let n = BigNumber::from(7_u32);
        let a = BigNumber::from(2_u32);
        let b = BigNumber::from(5_u32);
        // (2 - 5) mod 7 == 4
        assert_eq!(a.mod_sub(&b, &n), BigNumber::from(4_u32));
    }

    #[test]
    fn mod_sub_no_wrap() {
        let n = BigNumber::from(7_u32);
        let a = BigNumber::from(5_u32);
        let b = BigNumber::from(2_u32);
        assert_eq!(a.mod_sub(&b, &n), BigNumber::from(3_u32));
    }

    #[test]
    fn random_in_range_is_nonzero_and_bounded() {
        let modulus = BigNumber::from(1_000_003_u32);
        for _ in 0..50 {
            let r = BigNumber::random_in_range(&modulus, 7);
            assert!(!r.is_zero());
            assert!(r < modulus);
        }
    }
}

impl Debug for BigNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BigNumber(\"{}\")", self)
    }
}

impl From<u32> for BigNumber {
    fn from(n: u32) -> Self {
        Self(BigUint::from(n))
    }
}

impl From<BigUint> for BigNumber {
    fn from(a: BigUint) -> Self {
        Self(a)
    }
}

impl From<&[u8]> for BigNumber {
    fn from(somewhere: &[u8]) -> Self {
        Self::from_bytes_be(somewhere)
    }
}

impl From<&BigNumber> for String {
    fn from(x: &BigNumber) -> Self {
        x.0.to_str_radix(16).to_uppercase()
    }
}

impl From<BigNumber> for String {
    fn from(x: BigNumber) -> Self {
        (&x).into()
    }
}

impl TryFrom<&str> for BigNumber {
    type Error = BigNumberError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_hex_str_be(value)
    }
}

impl TryFrom<String> for BigNumber {
    type Error = BigNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex_str_be(value.as_str())
    }
}

impl Rem for &BigNumber {
    type Output = BigNumber;

    fn rem(self, rhs: &BigNumber) -> Self::Output {
        (&self.0).rem(&rhs.0).into()
    }
}

impl Rem for BigNumber {
    type Output = Self;

    fn rem(self, rhs: Self) -> Self::Output {
        (&self).rem(&rhs)
    }
}

impl Mul for BigNumber {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        (self.0 * rhs.0).into()
    }
}

impl Mul for &BigNumber {
    type Output = BigNumber;

    fn mul(self, rhs: Self) -> Self::Output {
        (&self.0 * &rhs.0).into()
    }
}

impl Add for BigNumber {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.0.add(rhs.0).into()
    }
}

impl<'b> Add<&'b BigNumber> for &BigNumber {
    type Output = BigNumber;

    fn add(self, rhs: &'b BigNumber) -> Self::Output {
        (&self.0).add(&rhs.0).into()
    }
}

impl Sub for BigNumber {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self.0.sub(rhs.0).into()
    }
}

impl<'b> Sub<&'b BigNumber> for &BigNumber {
    type Output = BigNumber;

    fn sub(self, rhs: &'b BigNumber) -> Self::Output {
        (&self.0).sub(&rhs.0).into()
    }
}

impl std::fmt::Display for BigNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let x: String = self.into();
        write!(f, "{}", x)
    }
}

impl Zero for BigNumber {
    fn zero() -> Self {
        BigUint::zero().into()
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}
