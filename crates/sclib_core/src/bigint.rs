//! Arbitrary precision unsigned integers for token amounts.
//!
//! [ScBigInt] stores base-256 digits little-endian, normalized so that the
//! most significant stored digit is never zero. Zero is the empty digit list.
//! Every operation returns a new value.
//!
//! The external byte form ([WireType::to_bytes]) is big-endian, matching
//! the big integer type used by the node. The nested encoding keeps the
//! internal little-endian digits.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::codec::{ByteViewer, ByteWriter};
use crate::err::{Error, ScResult};
use crate::types::WireType;

/// 10^18, the largest power of ten handled natively per conversion step
const QUINTILLION: u64 = 1_000_000_000_000_000_000;
const QUINTILLION_DIGITS: usize = 18;

const U64_LENGTH: usize = std::mem::size_of::<u64>();

#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ScBigInt {
    bytes: Vec<u8>,
}

impl ScBigInt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_u64(value: u64) -> Self {
        Self::normalize(value.to_le_bytes().to_vec())
    }

    fn from_u128(value: u128) -> Self {
        Self::normalize(value.to_le_bytes().to_vec())
    }

    /// Drop the non-significant high digits
    fn normalize(mut bytes: Vec<u8>) -> Self {
        while bytes.last() == Some(&0) {
            bytes.pop();
        }
        Self { bytes }
    }

    pub fn is_zero(&self) -> bool {
        self.bytes.is_empty()
    }

    fn is_one(&self) -> bool {
        self.bytes == [1]
    }

    /// Whether the value fits in a u64
    pub fn is_u64(&self) -> bool {
        self.bytes.len() <= U64_LENGTH
    }

    pub fn to_u64(&self) -> ScResult<u64> {
        match self.is_u64() {
            true => Ok(self.low_u64()),
            false => Err(Error::Overflow { bits: 64 }),
        }
    }

    /// The lowest 64 bits of the value
    fn low_u64(&self) -> u64 {
        let len = self.bytes.len().min(U64_LENGTH);
        let mut arr = [0_u8; U64_LENGTH];
        arr[..len].copy_from_slice(&self.bytes[..len]);
        u64::from_le_bytes(arr)
    }

    /// Returns -1, 0 or 1 when `self` is smaller, equal or larger than `rhs`.
    pub fn compare(&self, rhs: &Self) -> i8 {
        let lhs_len = self.bytes.len();
        let rhs_len = rhs.bytes.len();
        if lhs_len != rhs_len {
            return match lhs_len > rhs_len {
                true => 1,
                false => -1,
            };
        }

        for (lhs_byte, rhs_byte) in self.bytes.iter().rev().zip(rhs.bytes.iter().rev()) {
            if lhs_byte != rhs_byte {
                return match lhs_byte > rhs_byte {
                    true => 1,
                    false => -1,
                };
            }
        }
        0
    }

    pub fn add(&self, rhs: &Self) -> Self {
        // always add the shorter value to the longer one
        let (long, short) = match self.bytes.len() >= rhs.bytes.len() {
            true => (self, rhs),
            false => (rhs, self),
        };

        let mut buf = Vec::with_capacity(long.bytes.len() + 1);
        let mut carry = 0_u16;
        for (i, digit) in long.bytes.iter().enumerate() {
            carry += *digit as u16 + short.bytes.get(i).copied().unwrap_or(0) as u16;
            buf.push(carry as u8);
            carry >>= 8;
        }
        if carry != 0 {
            buf.push(carry as u8);
        }

        Self::normalize(buf)
    }

    pub fn sub(&self, rhs: &Self) -> ScResult<Self> {
        match self.cmp(rhs) {
            Ordering::Less => Err(Error::SubtractionUnderflow),
            Ordering::Equal => Ok(Self::new()),
            Ordering::Greater => Ok(self.sub_digits(rhs)),
        }
    }

    /// Digit-wise subtraction. `self` must not be smaller than `rhs`.
    fn sub_digits(&self, rhs: &Self) -> Self {
        let mut buf = Vec::with_capacity(self.bytes.len());
        let mut borrow = 0_i16;
        for (i, digit) in self.bytes.iter().enumerate() {
            let mut diff = *digit as i16 - rhs.bytes.get(i).copied().unwrap_or(0) as i16 - borrow;
            borrow = 0;
            if diff < 0 {
                diff += 0x100;
                borrow = 1;
            }
            buf.push(diff as u8);
        }

        Self::normalize(buf)
    }

    pub fn mul(&self, rhs: &Self) -> Self {
        if self.is_zero() || rhs.is_zero() {
            return Self::new();
        }
        if rhs.is_one() {
            return self.clone();
        }
        if self.is_one() {
            return rhs.clone();
        }
        if self.is_u64() && rhs.is_u64() {
            return Self::from_u128(self.low_u64() as u128 * rhs.low_u64() as u128);
        }

        let lhs_len = self.bytes.len();
        let mut buf = vec![0_u8; lhs_len + rhs.bytes.len()];
        for (r, rhs_digit) in rhs.bytes.iter().enumerate() {
            if *rhs_digit == 0 {
                continue;
            }

            let mut carry = 0_u32;
            for (l, lhs_digit) in self.bytes.iter().enumerate() {
                carry += buf[l + r] as u32 + (*lhs_digit as u32) * (*rhs_digit as u32);
                buf[l + r] = carry as u8;
                carry >>= 8;
            }
            buf[r + lhs_len] = carry as u8;
        }

        Self::normalize(buf)
    }

    pub fn div(&self, rhs: &Self) -> ScResult<Self> {
        Ok(self.div_mod(rhs)?.0)
    }

    pub fn modulo(&self, rhs: &Self) -> ScResult<Self> {
        Ok(self.div_mod(rhs)?.1)
    }

    /// Quotient and remainder of `self / rhs`
    pub fn div_mod(&self, rhs: &Self) -> ScResult<(Self, Self)> {
        if rhs.is_zero() {
            return Err(Error::DivideByZero);
        }
        Ok(self.div_mod_nonzero(rhs))
    }

    fn div_mod_nonzero(&self, rhs: &Self) -> (Self, Self) {
        match self.cmp(rhs) {
            Ordering::Less => return (Self::new(), self.clone()),
            Ordering::Equal => return (Self::from_u64(1), Self::new()),
            Ordering::Greater => (),
        }

        // rhs is smaller, so both fit
        if self.is_u64() {
            let lhs = self.low_u64();
            let rhs = rhs.low_u64();
            return (Self::from_u64(lhs / rhs), Self::from_u64(lhs % rhs));
        }

        if rhs.bytes.len() == 1 {
            return self.div_mod_simple(rhs.bytes[0]);
        }

        self.div_mod_estimate(rhs)
    }

    /// Long division by a single digit
    fn div_mod_simple(&self, divisor: u8) -> (Self, Self) {
        let divisor = divisor as u16;
        let mut buf = vec![0_u8; self.bytes.len()];
        let mut remain = 0_u16;
        for i in (0..self.bytes.len()).rev() {
            remain = (remain << 8) | self.bytes[i] as u16;
            buf[i] = (remain / divisor) as u8;
            remain %= divisor;
        }

        (Self::normalize(buf), Self::from_u64(remain as u64))
    }

    /// Long division by a multi-digit divisor.
    ///
    /// Both operands are shifted until the top bit of the divisor is set.
    /// Each quotient digit is then guessed from the top two remainder digits
    /// over the top divisor digit. That guess is never more than 2 too high,
    /// and [Self::correct_estimate] settles it.
    fn div_mod_estimate(&self, rhs: &Self) -> (Self, Self) {
        let shift = rhs.bytes[rhs.bytes.len() - 1].leading_zeros();
        let divisor = rhs.shl(shift);
        let dividend = self.shl(shift);

        let n = divisor.bytes.len();
        let top = divisor.bytes[n - 1] as u16;

        let mut quotient = vec![0_u8; dividend.bytes.len()];
        let mut remainder = Self::new();
        for i in (0..dividend.bytes.len()).rev() {
            remainder = remainder.push_low_digit(dividend.bytes[i]);
            if remainder < divisor {
                continue;
            }

            // remainder holds n or n + 1 digits here
            let len = remainder.bytes.len();
            let head = match len > n {
                true => (remainder.bytes[len - 1] as u16) << 8 | remainder.bytes[len - 2] as u16,
                false => remainder.bytes[len - 1] as u16,
            };
            let guess = (head / top).min(0xff);

            let (digit, rest) = Self::correct_estimate(&remainder, &divisor, guess);
            quotient[i] = digit;
            remainder = rest;
        }

        (Self::normalize(quotient), remainder.shr(shift))
    }

    /// Adjusts a quotient digit guess until `remainder - guess * divisor`
    /// lies in `[0, divisor)`. Returns the digit and that residual.
    fn correct_estimate(remainder: &Self, divisor: &Self, mut guess: u16) -> (u8, Self) {
        let mut product = divisor.mul(&Self::from_u64(guess as u64));

        // overestimated
        while product > *remainder {
            guess -= 1;
            product = product.sub_digits(divisor);
        }

        // underestimated
        let mut residual = remainder.sub_digits(&product);
        while residual >= *divisor {
            guess += 1;
            residual = residual.sub_digits(divisor);
        }

        (guess as u8, residual)
    }

    /// Shift left by one digit and insert `digit` as the least significant digit
    fn push_low_digit(&self, digit: u8) -> Self {
        let mut buf = Vec::with_capacity(self.bytes.len() + 1);
        buf.push(digit);
        buf.extend_from_slice(&self.bytes);
        Self::normalize(buf)
    }

    pub fn shl(&self, shift: u32) -> Self {
        if shift == 0 || self.is_zero() {
            return self.clone();
        }

        let whole_bytes = (shift >> 3) as usize;
        let shift = shift & 0x07;

        let mut buf = vec![0_u8; whole_bytes];
        buf.reserve(self.bytes.len() + 1);

        let mut carry = 0_u16;
        for digit in self.bytes.iter() {
            let word = (*digit as u16) << shift | carry;
            buf.push(word as u8);
            carry = word >> 8;
        }
        buf.push(carry as u8);

        Self::normalize(buf)
    }

    pub fn shr(&self, shift: u32) -> Self {
        if shift == 0 {
            return self.clone();
        }

        let whole_bytes = (shift >> 3) as usize;
        let shift = shift & 0x07;
        if whole_bytes >= self.bytes.len() {
            return Self::new();
        }

        let digits = &self.bytes[whole_bytes..];
        let mut buf = Vec::with_capacity(digits.len());
        for i in 0..digits.len() {
            let word = (digits.get(i + 1).copied().unwrap_or(0) as u16) << 8 | digits[i] as u16;
            buf.push((word >> shift) as u8);
        }

        Self::normalize(buf)
    }

    fn to_decimal(&self) -> String {
        if self.is_u64() {
            return self.low_u64().to_string();
        }

        let (div, modulo) = self.div_mod_nonzero(&Self::from_u64(QUINTILLION));
        format!(
            "{}{:0width$}",
            div.to_decimal(),
            modulo.low_u64(),
            width = QUINTILLION_DIGITS
        )
    }

    fn from_decimal(value: &str) -> ScResult<Self> {
        if value.is_empty() || !value.bytes().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidValue(format!("big int {:?}", value)));
        }

        if value.len() <= QUINTILLION_DIGITS {
            let parsed = value
                .parse::<u64>()
                .map_err(|e| Error::InvalidValue(format!("big int {:?}: {}", value, e)))?;
            return Ok(Self::from_u64(parsed));
        }

        // build the value 18 digits at a time
        let split = value.len() - QUINTILLION_DIGITS;
        let high = Self::from_decimal(&value[..split])?;
        let low = Self::from_decimal(&value[split..])?;

        Ok(high.mul(&Self::from_u64(QUINTILLION)).add(&low))
    }
}

impl Ord for ScBigInt {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other).cmp(&0)
    }
}

impl PartialOrd for ScBigInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<u64> for ScBigInt {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl fmt::Display for ScBigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl fmt::Debug for ScBigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScBigInt({})", self.to_decimal())
    }
}

impl FromStr for ScBigInt {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal(s)
    }
}

impl WireType for ScBigInt {
    const TYPE_NAME: &'static str = "big int";

    fn encode(&self, enc: &mut ByteWriter) {
        enc.bytes(&self.bytes);
    }

    fn decode(dec: &mut ByteViewer) -> ScResult<Self> {
        Ok(Self::normalize(dec.bytes()?.to_vec()))
    }

    // byte order is only reversed here and in from_bytes
    fn to_bytes(&self) -> Vec<u8> {
        self.bytes.iter().rev().copied().collect()
    }

    fn from_bytes(buf: &[u8]) -> ScResult<Self> {
        Ok(Self::normalize(buf.iter().rev().copied().collect()))
    }

    fn to_text(&self) -> String {
        self.to_decimal()
    }

    fn from_text(s: &str) -> ScResult<Self> {
        Self::from_decimal(s)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, RngCore, SeedableRng};

    use super::*;

    /// Random value with up to `max_len` digits
    fn random_big(rng: &mut StdRng, max_len: usize) -> ScBigInt {
        let len = (rng.next_u32() as usize) % (max_len + 1);
        let mut bytes = vec![0_u8; len];
        rng.fill_bytes(&mut bytes);
        ScBigInt::normalize(bytes)
    }

    fn big(s: &str) -> ScBigInt {
        s.parse().unwrap()
    }

    #[test]
    fn test_normalized_representation() {
        assert!(ScBigInt::from_u64(0).is_zero());
        assert_eq!(ScBigInt::from_u64(0x0102).bytes, vec![2, 1]);
        assert_eq!(ScBigInt::from_bytes(&[0, 0, 1, 2]).unwrap(), ScBigInt::from_u64(0x0102));
        assert_eq!(ScBigInt::from_u64(0x0102).to_bytes(), vec![1, 2]);
        assert!(ScBigInt::from_bytes(&[]).unwrap().is_zero());

        let mut enc = ByteWriter::new();
        ScBigInt::from_u64(0x0102).encode(&mut enc);
        assert_eq!(enc.buf(), &[2, 2, 1]);
    }

    #[test]
    fn test_compare() {
        let small = ScBigInt::from_u64(255);
        let large = ScBigInt::from_u64(256);

        assert_eq!(small.compare(&large), -1);
        assert_eq!(large.compare(&small), 1);
        assert_eq!(large.compare(&large.clone()), 0);
        assert!(big("18446744073709551616") > ScBigInt::from_u64(u64::MAX));
        assert!(ScBigInt::new() < small);
    }

    #[test]
    fn test_sub_underflow_and_divide_by_zero() {
        let one = ScBigInt::from_u64(1);
        let two = ScBigInt::from_u64(2);

        assert_eq!(one.sub(&two), Err(Error::SubtractionUnderflow));
        assert!(one.sub(&one).unwrap().is_zero());
        assert_eq!(two.div(&ScBigInt::new()), Err(Error::DivideByZero));
        assert_eq!(two.modulo(&ScBigInt::new()), Err(Error::DivideByZero));
    }

    #[test]
    fn test_against_native_u128() {
        let mut rng = StdRng::seed_from_u64(128);
        for _ in 0..5_000 {
            let a = (rng.next_u64() as u128) << 64 | rng.next_u64() as u128;
            let a = a >> (rng.next_u32() % 128);
            let b = (rng.next_u64() as u128) << 64 | rng.next_u64() as u128;
            let b = (b >> (rng.next_u32() % 128)).max(1);

            let (big_a, big_b) = (ScBigInt::from_u128(a), ScBigInt::from_u128(b));
            let (q, r) = big_a.div_mod(&big_b).unwrap();
            assert_eq!(q, ScBigInt::from_u128(a / b), "{} / {}", a, b);
            assert_eq!(r, ScBigInt::from_u128(a % b), "{} % {}", a, b);

            if let Some(sum) = a.checked_add(b) {
                assert_eq!(big_a.add(&big_b), ScBigInt::from_u128(sum));
            }
            if let Some(product) = a.checked_mul(b) {
                assert_eq!(big_a.mul(&big_b), ScBigInt::from_u128(product));
            }
            assert_eq!(big_a.cmp(&big_b), a.cmp(&b));
            assert_eq!(big_a.to_string(), a.to_string());
        }
    }

    #[test]
    fn test_arithmetic_laws() {
        let mut rng = StdRng::seed_from_u64(0xb16);
        for round in 0..2_000 {
            // spread lengths around the 64-bit fast path boundary and beyond
            let max_len = [4, 8, 9, 16, 40][round % 5];
            let a = random_big(&mut rng, max_len);
            let b = random_big(&mut rng, 24);
            let c = random_big(&mut rng, 12);

            if !b.is_zero() {
                let (q, r) = a.div_mod(&b).unwrap();
                assert!(r < b);
                assert_eq!(q.mul(&b).add(&r), a, "{} / {}", a, b);
            }

            if a >= b {
                assert_eq!(a.sub(&b).unwrap().add(&b), a);
            }

            assert_eq!(a.mul(&b), b.mul(&a));
            assert_eq!(a.mul(&b).mul(&c), a.mul(&b.mul(&c)));
            assert_eq!(a.add(&b), b.add(&a));
        }
    }

    #[test]
    fn test_division_fast_paths() {
        let x = big("123456789012345678901234567890");

        assert_eq!(x.div_mod(&x).unwrap(), (ScBigInt::from_u64(1), ScBigInt::new()));

        let larger = x.add(&ScBigInt::from_u64(1));
        assert_eq!(x.div_mod(&larger).unwrap(), (ScBigInt::new(), x.clone()));

        assert_eq!(x.div(&ScBigInt::from_u64(1)).unwrap(), x);

        let seven = ScBigInt::from_u64(7);
        let (q, r) = x.div_mod(&seven).unwrap();
        assert!(r < seven);
        assert_eq!(q.mul(&seven).add(&r), x);

        let (q, r) = x.div_mod(&ScBigInt::from_u64(10)).unwrap();
        assert_eq!(q, big("12345678901234567890123456789"));
        assert_eq!(r, ScBigInt::from_u64(0));
    }

    #[test]
    fn test_shifts() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let a = random_big(&mut rng, 20);
            let shift = rng.next_u32() % 80;

            let mut doubled = a.clone();
            for _ in 0..shift {
                doubled = doubled.add(&doubled);
            }
            assert_eq!(a.shl(shift), doubled);
            assert_eq!(a.shl(shift).shr(shift), a);
            assert_eq!(a.shr(shift), a.div(&ScBigInt::from_u64(1).shl(shift)).unwrap());
        }

        assert!(ScBigInt::from_u64(0xff).shr(8).is_zero());
        assert!(ScBigInt::from_u64(0xff).shr(200).is_zero());
    }

    #[test]
    fn test_decimal_strings() {
        let nines = "9".repeat(45);
        let ten_45 = format!("1{}", "0".repeat(45));

        assert_eq!(big(&nines).add(&ScBigInt::from_u64(1)), big(&ten_45));
        assert_eq!(big(&ten_45).to_string(), ten_45);
        assert_eq!(big(&nines).to_string(), nines);

        // the low chunk is zero padded
        let padded = "1000000000000000000000000000000000000007";
        assert_eq!(big(padded).to_string(), padded);

        assert_eq!(ScBigInt::from_u128(u128::MAX).to_string(), u128::MAX.to_string());
        assert_eq!(big("000123").to_string(), "123");
        assert_eq!(ScBigInt::new().to_string(), "0");

        assert!(ScBigInt::from_text("").is_err());
        assert!(ScBigInt::from_text("-5").is_err());
        assert!(ScBigInt::from_text("12a").is_err());
    }
}
