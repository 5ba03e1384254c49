//! Field context: modulus descriptor, value parsing, and fallible sampling.
//!
//! The arithmetic itself is provided by `ark-ff`. This module only carries the
//! pieces the rest of the crate threads around explicitly:
//!
//! - [`FieldModulus`] identifies the prime a circuit was compiled for. It is
//!   stored in every R1CS and witness so that artifacts from different fields
//!   can never be mixed silently.
//! - [`parse_field_element`] turns user-facing strings (`"15"`, `"0x0f"`,
//!   `"-1"`) into field elements, reducing modulo `p`.
//! - [`try_sample`] draws a uniform element from an injected RNG and reports
//!   RNG failure instead of panicking.

#![forbid(unsafe_code)]

use ark_ff::{BigInteger, PrimeField};
use rand::RngCore;
use zeroize::Zeroize;

/// Big-endian encoding of a prime field modulus.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldModulus {
    bytes_be: Vec<u8>,
}

/// Errors produced while parsing or matching field context.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("empty field element literal")]
    Empty,
    #[error("invalid digit `{ch}` in field element literal `{literal}`")]
    InvalidDigit { literal: String, ch: char },
    #[error("invalid hex field element literal `{0}`")]
    InvalidHex(String),
    #[error("field modulus mismatch: expected 0x{expected}, got 0x{got}")]
    ModulusMismatch { expected: String, got: String },
}

impl FieldModulus {
    /// Modulus of the prime field `F`.
    pub fn of<F: PrimeField>() -> Self {
        Self::from_be_bytes(&F::MODULUS.to_bytes_be())
    }

    /// Build from big-endian bytes; leading zero bytes are stripped.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Self { bytes_be: bytes[first..].to_vec() }
    }

    /// Raw big-endian bytes (no leading zeros).
    pub fn as_be_bytes(&self) -> &[u8] {
        &self.bytes_be
    }

    /// Bit length of the modulus.
    pub fn bits(&self) -> u32 {
        match self.bytes_be.first() {
            None => 0,
            Some(top) => (self.bytes_be.len() as u32 - 1) * 8 + (8 - top.leading_zeros()),
        }
    }

    /// True if this is the modulus of `F`.
    pub fn matches<F: PrimeField>(&self) -> bool {
        *self == Self::of::<F>()
    }

    /// Error unless this is the modulus of `F`.
    pub fn ensure<F: PrimeField>(&self) -> Result<(), FieldError> {
        if self.matches::<F>() {
            return Ok(());
        }
        Err(FieldError::ModulusMismatch {
            expected: Self::of::<F>().to_string(),
            got: self.to_string(),
        })
    }
}

impl std::fmt::Display for FieldModulus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(&self.bytes_be))
    }
}

impl std::fmt::Debug for FieldModulus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FieldModulus(0x{self}, {} bits)", self.bits())
    }
}

/// Parse a decimal or `0x`-prefixed hex literal into `F`, reducing mod `p`.
///
/// A leading `-` negates the value. Underscores are accepted as separators.
pub fn parse_field_element<F: PrimeField>(literal: &str) -> Result<F, FieldError> {
    let s = literal.trim();
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, s),
    };
    let body: String = body.chars().filter(|c| *c != '_').collect();
    if body.is_empty() {
        return Err(FieldError::Empty);
    }

    let value = if let Some(hex_digits) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        if hex_digits.is_empty() {
            return Err(FieldError::InvalidHex(literal.to_string()));
        }
        let padded = if hex_digits.len() % 2 == 1 {
            format!("0{hex_digits}")
        } else {
            hex_digits.to_string()
        };
        let bytes = hex::decode(&padded).map_err(|_| FieldError::InvalidHex(literal.to_string()))?;
        F::from_be_bytes_mod_order(&bytes)
    } else {
        let ten = F::from(10u64);
        let mut acc = F::zero();
        for ch in body.chars() {
            let digit = ch.to_digit(10).ok_or_else(|| FieldError::InvalidDigit {
                literal: literal.to_string(),
                ch,
            })?;
            acc = acc * ten + F::from(digit as u64);
        }
        acc
    };

    Ok(if negative { -value } else { value })
}

/// Canonical decimal rendering of a field element.
pub fn to_decimal<F: PrimeField>(value: &F) -> String {
    value.into_bigint().to_string()
}

/// Draw a uniform field element from `rng` (64 bytes reduced mod `p`).
///
/// The intermediate buffer is wiped before returning.
pub fn try_sample<F: PrimeField, R: RngCore + ?Sized>(rng: &mut R) -> Result<F, rand::Error> {
    let mut buf = [0u8; 64];
    rng.try_fill_bytes(&mut buf)?;
    let out = F::from_le_bytes_mod_order(&buf);
    buf.zeroize();
    Ok(out)
}

/// Like [`try_sample`] but rejects zero (retries are bounded).
pub fn try_sample_nonzero<F: PrimeField, R: RngCore + ?Sized>(
    rng: &mut R,
) -> Result<Option<F>, rand::Error> {
    for _ in 0..8 {
        let v: F = try_sample(rng)?;
        if !v.is_zero() {
            return Ok(Some(v));
        }
    }
    Ok(None)
}
