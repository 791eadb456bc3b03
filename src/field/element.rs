//! Prime field implementation backing every tree node and hash state slot.
//!
//! The field is the 254-bit BN254 scalar field
//! `p = 0x30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001`.
//!
//! # Representation
//!
//! * Elements are stored as 4 little-endian `u64` limbs in Montgomery form
//!   (`a * R mod p` with `R = 2^256`), so multiplication reduces with a
//!   single interleaved Montgomery pass.
//! * Canonical serialization is the 32-byte little-endian encoding of the
//!   non-Montgomery value. Deserialization rejects encodings at or above the
//!   modulus and inputs longer than [`FIELD_SIZE`]; shorter inputs are
//!   zero-padded on the right and accepted.

use core::fmt;
use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Canonical serialized width of a field element in bytes.
pub const FIELD_SIZE: usize = 32;

/// `-p^{-1} mod 2^64`, the Montgomery reduction parameter.
const INV: u64 = 0xc2e1_f593_efff_ffff;

/// Compute `a + b + carry`, returning the result and the new carry over.
#[inline(always)]
const fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
    let ret = (a as u128) + (b as u128) + (carry as u128);
    (ret as u64, (ret >> 64) as u64)
}

/// Compute `a - (b + borrow)`, returning the result and the new borrow as an
/// all-ones mask.
#[inline(always)]
const fn sbb(a: u64, b: u64, borrow: u64) -> (u64, u64) {
    let ret = (a as u128).wrapping_sub((b as u128) + ((borrow >> 63) as u128));
    (ret as u64, (ret >> 64) as u64)
}

/// Compute `a + (b * c) + carry`, returning the result and the new carry over.
#[inline(always)]
const fn mac(a: u64, b: u64, c: u64, carry: u64) -> (u64, u64) {
    let ret = (a as u128) + (b as u128) * (c as u128) + (carry as u128);
    (ret as u64, (ret >> 64) as u64)
}

/// Field element of the BN254 scalar field in Montgomery form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldElement([u64; 4]);

impl FieldElement {
    /// Prime modulus limbs in little-endian order.
    pub const MODULUS: [u64; 4] = [
        0x43e1_f593_f000_0001,
        0x2833_e848_79b9_7091,
        0xb850_45b6_8181_585d,
        0x3064_4e72_e131_a029,
    ];

    /// Montgomery radix `R = 2^256 mod p`.
    const R: FieldElement = FieldElement([
        0xac96_341c_4fff_fffb,
        0x36fc_7695_9f60_cd29,
        0x666e_a36f_7879_462e,
        0x0e0a_77c1_9a07_df2f,
    ]);

    /// Precomputed `R^2 mod p` used for Montgomery conversions.
    const R2: FieldElement = FieldElement([
        0x1bb8_e645_ae21_6da7,
        0x53fe_3ab1_e35c_59e3,
        0x8c49_833d_53bb_8085,
        0x0216_d0b1_7f4e_44a5,
    ]);

    /// `p - 2`, the Fermat inversion exponent.
    const MODULUS_MINUS_TWO: [u64; 4] = [
        0x43e1_f593_efff_ffff,
        0x2833_e848_79b9_7091,
        0xb850_45b6_8181_585d,
        0x3064_4e72_e131_a029,
    ];

    /// Additive identity.
    pub const ZERO: FieldElement = FieldElement([0, 0, 0, 0]);
    /// Multiplicative identity.
    pub const ONE: FieldElement = FieldElement::R;
    /// Smallest generator of the multiplicative group.
    pub const GENERATOR: FieldElement = FieldElement::from_raw([5, 0, 0, 0]);

    /// Converts an integer given as little-endian limbs into the field,
    /// reducing modulo `p`.
    pub const fn from_raw(value: [u64; 4]) -> Self {
        (&FieldElement(value)).mul(&FieldElement::R2)
    }

    /// Converts a `u128` into the field, reducing modulo `p`.
    pub const fn from_u128(value: u128) -> Self {
        Self::from_raw([value as u64, (value >> 64) as u64, 0, 0])
    }

    /// Returns `true` for the additive identity.
    pub const fn is_zero(&self) -> bool {
        self.0[0] == 0 && self.0[1] == 0 && self.0[2] == 0 && self.0[3] == 0
    }

    /// Adds two field elements.
    #[inline(always)]
    pub const fn add(&self, rhs: &Self) -> Self {
        let (d0, carry) = adc(self.0[0], rhs.0[0], 0);
        let (d1, carry) = adc(self.0[1], rhs.0[1], carry);
        let (d2, carry) = adc(self.0[2], rhs.0[2], carry);
        let (d3, carry) = adc(self.0[3], rhs.0[3], carry);
        let (d0, borrow) = sbb(d0, Self::MODULUS[0], 0);
        let (d1, borrow) = sbb(d1, Self::MODULUS[1], borrow);
        let (d2, borrow) = sbb(d2, Self::MODULUS[2], borrow);
        let (d3, borrow) = sbb(d3, Self::MODULUS[3], borrow);
        let (_, borrow) = sbb(carry, 0, borrow);
        let (d0, carry) = adc(d0, Self::MODULUS[0] & borrow, 0);
        let (d1, carry) = adc(d1, Self::MODULUS[1] & borrow, carry);
        let (d2, carry) = adc(d2, Self::MODULUS[2] & borrow, carry);
        let (d3, _) = adc(d3, Self::MODULUS[3] & borrow, carry);
        FieldElement([d0, d1, d2, d3])
    }

    /// Doubles the field element.
    #[inline]
    pub const fn double(&self) -> Self {
        self.add(self)
    }

    /// Subtracts `rhs` from `self`.
    #[inline(always)]
    pub const fn sub(&self, rhs: &Self) -> Self {
        let (d0, borrow) = sbb(self.0[0], rhs.0[0], 0);
        let (d1, borrow) = sbb(self.0[1], rhs.0[1], borrow);
        let (d2, borrow) = sbb(self.0[2], rhs.0[2], borrow);
        let (d3, borrow) = sbb(self.0[3], rhs.0[3], borrow);
        let (d0, carry) = adc(d0, Self::MODULUS[0] & borrow, 0);
        let (d1, carry) = adc(d1, Self::MODULUS[1] & borrow, carry);
        let (d2, carry) = adc(d2, Self::MODULUS[2] & borrow, carry);
        let (d3, _) = adc(d3, Self::MODULUS[3] & borrow, carry);
        FieldElement([d0, d1, d2, d3])
    }

    /// Computes the additive inverse.
    #[inline(always)]
    pub const fn neg(&self) -> Self {
        let (d0, borrow) = sbb(Self::MODULUS[0], self.0[0], 0);
        let (d1, borrow) = sbb(Self::MODULUS[1], self.0[1], borrow);
        let (d2, borrow) = sbb(Self::MODULUS[2], self.0[2], borrow);
        let (d3, _) = sbb(Self::MODULUS[3], self.0[3], borrow);
        let mask = (((self.0[0] | self.0[1] | self.0[2] | self.0[3]) == 0) as u64).wrapping_sub(1);
        FieldElement([d0 & mask, d1 & mask, d2 & mask, d3 & mask])
    }

    /// Multiplies two field elements.
    #[inline(always)]
    pub const fn mul(&self, rhs: &Self) -> Self {
        let (r0, carry) = mac(0, self.0[0], rhs.0[0], 0);
        let (r1, carry) = mac(0, self.0[0], rhs.0[1], carry);
        let (r2, carry) = mac(0, self.0[0], rhs.0[2], carry);
        let (r3, r4) = mac(0, self.0[0], rhs.0[3], carry);
        let (r1, carry) = mac(r1, self.0[1], rhs.0[0], 0);
        let (r2, carry) = mac(r2, self.0[1], rhs.0[1], carry);
        let (r3, carry) = mac(r3, self.0[1], rhs.0[2], carry);
        let (r4, r5) = mac(r4, self.0[1], rhs.0[3], carry);
        let (r2, carry) = mac(r2, self.0[2], rhs.0[0], 0);
        let (r3, carry) = mac(r3, self.0[2], rhs.0[1], carry);
        let (r4, carry) = mac(r4, self.0[2], rhs.0[2], carry);
        let (r5, r6) = mac(r5, self.0[2], rhs.0[3], carry);
        let (r3, carry) = mac(r3, self.0[3], rhs.0[0], 0);
        let (r4, carry) = mac(r4, self.0[3], rhs.0[1], carry);
        let (r5, carry) = mac(r5, self.0[3], rhs.0[2], carry);
        let (r6, r7) = mac(r6, self.0[3], rhs.0[3], carry);
        Self::montgomery_reduce(&[r0, r1, r2, r3, r4, r5, r6, r7])
    }

    /// Squares the field element.
    #[inline(always)]
    pub const fn square(&self) -> Self {
        self.mul(self)
    }

    /// Reduces a 512-bit product into a canonical Montgomery element.
    #[inline(always)]
    const fn montgomery_reduce(r: &[u64; 8]) -> Self {
        let k = r[0].wrapping_mul(INV);
        let (_, carry) = mac(r[0], k, Self::MODULUS[0], 0);
        let (r1, carry) = mac(r[1], k, Self::MODULUS[1], carry);
        let (r2, carry) = mac(r[2], k, Self::MODULUS[2], carry);
        let (r3, carry) = mac(r[3], k, Self::MODULUS[3], carry);
        let (r4, carry2) = adc(r[4], 0, carry);
        let k = r1.wrapping_mul(INV);
        let (_, carry) = mac(r1, k, Self::MODULUS[0], 0);
        let (r2, carry) = mac(r2, k, Self::MODULUS[1], carry);
        let (r3, carry) = mac(r3, k, Self::MODULUS[2], carry);
        let (r4, carry) = mac(r4, k, Self::MODULUS[3], carry);
        let (r5, carry2) = adc(r[5], carry2, carry);
        let k = r2.wrapping_mul(INV);
        let (_, carry) = mac(r2, k, Self::MODULUS[0], 0);
        let (r3, carry) = mac(r3, k, Self::MODULUS[1], carry);
        let (r4, carry) = mac(r4, k, Self::MODULUS[2], carry);
        let (r5, carry) = mac(r5, k, Self::MODULUS[3], carry);
        let (r6, carry2) = adc(r[6], carry2, carry);
        let k = r3.wrapping_mul(INV);
        let (_, carry) = mac(r3, k, Self::MODULUS[0], 0);
        let (r4, carry) = mac(r4, k, Self::MODULUS[1], carry);
        let (r5, carry) = mac(r5, k, Self::MODULUS[2], carry);
        let (r6, carry) = mac(r6, k, Self::MODULUS[3], carry);
        let (r7, carry2) = adc(r[7], carry2, carry);
        let (d0, borrow) = sbb(r4, Self::MODULUS[0], 0);
        let (d1, borrow) = sbb(r5, Self::MODULUS[1], borrow);
        let (d2, borrow) = sbb(r6, Self::MODULUS[2], borrow);
        let (d3, borrow) = sbb(r7, Self::MODULUS[3], borrow);
        let (_, borrow) = sbb(carry2, 0, borrow);
        let (d0, carry) = adc(d0, Self::MODULUS[0] & borrow, 0);
        let (d1, carry) = adc(d1, Self::MODULUS[1] & borrow, carry);
        let (d2, carry) = adc(d2, Self::MODULUS[2] & borrow, carry);
        let (d3, _) = adc(d3, Self::MODULUS[3] & borrow, carry);
        FieldElement([d0, d1, d2, d3])
    }

    /// Converts out of Montgomery form into canonical little-endian limbs.
    #[inline(always)]
    const fn from_mont(&self) -> [u64; 4] {
        Self::montgomery_reduce(&[self.0[0], self.0[1], self.0[2], self.0[3], 0, 0, 0, 0]).0
    }

    /// Raises the element to the given little-endian limb exponent.
    ///
    /// Runs in variable time with respect to the exponent; callers only pass
    /// public exponents.
    pub fn pow(&self, exp: &[u64; 4]) -> Self {
        let mut acc = FieldElement::ONE;
        for limb in exp.iter().rev() {
            for bit in (0..64).rev() {
                acc = acc.square();
                if (limb >> bit) & 1 == 1 {
                    acc = (&acc).mul(self);
                }
            }
        }
        acc
    }

    /// Computes the multiplicative inverse, returning `None` for zero.
    pub fn inv(&self) -> Option<Self> {
        if self.is_zero() {
            None
        } else {
            Some(self.pow(&Self::MODULUS_MINUS_TWO))
        }
    }

    /// Serializes the element into canonical little-endian bytes.
    pub fn to_bytes(&self) -> [u8; FIELD_SIZE] {
        let canonical = self.from_mont();
        let mut out = [0u8; FIELD_SIZE];
        let mut offset = 0;
        for limb in canonical.iter() {
            out[offset..offset + 8].copy_from_slice(&limb.to_le_bytes());
            offset += 8;
        }
        out
    }

    /// Deserializes a canonical little-endian encoding.
    ///
    /// Inputs shorter than [`FIELD_SIZE`] are zero-padded on the right;
    /// longer inputs and values at or above the modulus are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FieldDeserializeError> {
        if bytes.len() > FIELD_SIZE {
            return Err(FieldDeserializeError::FieldDeserializeInvalidLength {
                len: bytes.len(),
                max: FIELD_SIZE,
            });
        }
        let mut buf = [0u8; FIELD_SIZE];
        buf[..bytes.len()].copy_from_slice(bytes);
        let mut limbs = [0u64; 4];
        let mut chunk = [0u8; 8];
        for (i, limb) in limbs.iter_mut().enumerate() {
            chunk.copy_from_slice(&buf[i * 8..(i + 1) * 8]);
            *limb = u64::from_le_bytes(chunk);
        }
        if !is_below_modulus(&limbs) {
            return Err(FieldDeserializeError::FieldDeserializeNonCanonical);
        }
        Ok((&FieldElement(limbs)).mul(&FieldElement::R2))
    }

    /// Samples a uniform element by rejection from the given randomness source.
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        loop {
            let mut buf = [0u8; FIELD_SIZE];
            rng.fill_bytes(&mut buf);
            // keep 254 bits so the acceptance rate stays high
            buf[FIELD_SIZE - 1] &= 0x3f;
            if let Ok(element) = Self::from_bytes(&buf) {
                return element;
            }
        }
    }

    /// Samples a deterministic element from a 64-bit seed.
    pub fn random_seeded(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::random(&mut rng)
    }
}

/// Returns `true` when the canonical limbs are strictly below the modulus.
fn is_below_modulus(limbs: &[u64; 4]) -> bool {
    let mut borrow = 0;
    for (limb, modulus) in limbs.iter().zip(FieldElement::MODULUS.iter()) {
        let (_, next) = sbb(*limb, *modulus, borrow);
        borrow = next;
    }
    borrow & 1 == 1
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_raw([value, 0, 0, 0])
    }
}

impl Add for FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: FieldElement) -> FieldElement {
        (&self).add(&rhs)
    }
}

impl Sub for FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: FieldElement) -> FieldElement {
        (&self).sub(&rhs)
    }
}

impl Mul for FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: FieldElement) -> FieldElement {
        (&self).mul(&rhs)
    }
}

impl Neg for FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        (&self).neg()
    }
}

impl AddAssign for FieldElement {
    fn add_assign(&mut self, rhs: FieldElement) {
        *self = *self + rhs;
    }
}

impl SubAssign for FieldElement {
    fn sub_assign(&mut self, rhs: FieldElement) {
        *self = *self - rhs;
    }
}

impl MulAssign for FieldElement {
    fn mul_assign(&mut self, rhs: FieldElement) {
        *self = *self * rhs;
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.to_bytes();
        write!(f, "FieldElement(0x")?;
        for byte in bytes.iter().rev() {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

struct FieldElementVisitor;

impl<'de> de::Visitor<'de> for FieldElementVisitor {
    type Value = FieldElement;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a canonical little-endian field element encoding")
    }

    fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<FieldElement, E> {
        FieldElement::from_bytes(value).map_err(E::custom)
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<FieldElement, A::Error> {
        let mut bytes = Vec::with_capacity(FIELD_SIZE);
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        FieldElement::from_bytes(&bytes).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_bytes(FieldElementVisitor)
    }
}

/// Error raised when decoding a field element from bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDeserializeError {
    /// The decoded integer is not strictly below the field modulus.
    FieldDeserializeNonCanonical,
    /// The input buffer is longer than the canonical encoding.
    FieldDeserializeInvalidLength {
        /// Length of the rejected input.
        len: usize,
        /// Maximum accepted length.
        max: usize,
    },
}

impl fmt::Display for FieldDeserializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDeserializeError::FieldDeserializeNonCanonical => {
                write!(f, "field element deserialization failed: non-canonical input")
            }
            FieldDeserializeError::FieldDeserializeInvalidLength { len, max } => write!(
                f,
                "field element deserialization failed: input length {} exceeds {} bytes",
                len, max
            ),
        }
    }
}

impl std::error::Error for FieldDeserializeError {}
