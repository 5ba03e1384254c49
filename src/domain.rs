//! Evaluation domain for the QAP reduction.
//!
//! Multiplicative subgroup `H = {1, ω, …, ω^{N−1}}` of size `N = 2^k` with
//! vanishing polynomial `Z_H(X) = X^N − 1`, plus the coset `g·H` used to
//! divide by `Z_H` without hitting its roots. On the coset,
//! `Z_H(g·ωⁱ) = g^N − 1` is the same non-zero constant for every `i`.
//!
//! - **Transforms**: radix-2 NTT / inverse NTT (bit-reversal + Cooley–Tukey),
//!   and coset variants that pre/post-scale by powers of `g`.
//! - **Lagrange at a point**: `Lᵢ(τ) = ωⁱ·Z_H(τ) / (N·(τ − ωⁱ))` with one
//!   batch inversion, used by setup to evaluate the QAP at the secret `τ`.
//! - **Validation**: `ω^N = 1`, `ω^{N/2} ≠ 1`, and `g ∉ H`.

#![forbid(unsafe_code)]

use ark_ff::{batch_inversion, FftField, Field};

/// Radix-2 evaluation domain with a fixed coset shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain<F: FftField> {
    /// Domain size `N`, a power of two.
    pub n: usize,
    /// Generator `ω` of `H`.
    pub omega: F,
    /// Coset shift `g` (the field's multiplicative generator).
    pub coset_shift: F,
}

/// Errors produced by domain construction and transforms.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("domain size must be positive")]
    NZero,
    #[error("domain of size {0} exceeds the field's two-adicity")]
    TooLarge(usize),
    #[error("omega^N != 1")]
    OmegaNPowNotOne,
    #[error("omega is not primitive: omega^(N/2) == 1")]
    OmegaNotPrimitive,
    #[error("coset shift lies in H")]
    ShiftInDomain,
    #[error("vector length {len} does not match domain size {n}")]
    BadLen { len: usize, n: usize },
    #[error("evaluation point lies in H")]
    PointInDomain,
}

impl<F: FftField> Domain<F> {
    /// Smallest domain with at least `min_size` points.
    pub fn new_r(min_size: usize) -> Result<Self, DomainError> {
        if min_size == 0 {
            return Err(DomainError::NZero);
        }
        let n = min_size.checked_next_power_of_two().ok_or(DomainError::TooLarge(min_size))?;
        let omega = F::get_root_of_unity(n as u64).ok_or(DomainError::TooLarge(n))?;
        let d = Self { n, omega, coset_shift: F::GENERATOR };
        d.validate_r()?;
        Ok(d)
    }

    /// Panicking variant of [`Domain::new_r`].
    pub fn new(min_size: usize) -> Self {
        Self::new_r(min_size).expect("invalid domain")
    }

    pub fn validate_r(&self) -> Result<(), DomainError> {
        if self.n == 0 {
            return Err(DomainError::NZero);
        }
        if !self.omega.pow([self.n as u64]).is_one() {
            return Err(DomainError::OmegaNPowNotOne);
        }
        if self.n > 1 && self.omega.pow([(self.n / 2) as u64]).is_one() {
            return Err(DomainError::OmegaNotPrimitive);
        }
        if self.is_in_domain(self.coset_shift) {
            return Err(DomainError::ShiftInDomain);
        }
        Ok(())
    }

    /// `Z_H(z) = z^N − 1`.
    #[inline]
    pub fn vanishing_at(&self, z: F) -> F {
        z.pow([self.n as u64]) - F::one()
    }

    #[inline]
    pub fn is_in_domain(&self, z: F) -> bool {
        self.vanishing_at(z).is_zero()
    }

    /// `Z_H` on the coset: `g^N − 1`.
    #[inline]
    pub fn vanishing_on_coset(&self) -> F {
        self.vanishing_at(self.coset_shift)
    }

    /// `[1, ω, …, ω^{N−1}]`.
    pub fn elements(&self) -> Vec<F> {
        powers(F::one(), self.omega, self.n)
    }

    /// `[L₀(τ), …, L_{N−1}(τ)]` for `τ ∉ H`.
    pub fn lagrange_at_r(&self, tau: F) -> Result<Vec<F>, DomainError> {
        let z_tau = self.vanishing_at(tau);
        if z_tau.is_zero() {
            return Err(DomainError::PointInDomain);
        }
        let elems = self.elements();
        let n_f = F::from(self.n as u64);
        let mut denoms: Vec<F> = elems.iter().map(|w| n_f * (tau - w)).collect();
        batch_inversion(&mut denoms);
        Ok(elems.iter().zip(denoms).map(|(w, inv)| *w * z_tau * inv).collect())
    }

    /// Coefficients → evaluations over `H`.
    pub fn ntt_r(&self, a: &mut [F]) -> Result<(), DomainError> {
        self.check_len(a.len())?;
        ntt_in_place(a, self.omega);
        Ok(())
    }

    /// Evaluations over `H` → coefficients.
    pub fn intt_r(&self, a: &mut [F]) -> Result<(), DomainError> {
        self.check_len(a.len())?;
        intt_in_place(a, self.omega);
        Ok(())
    }

    /// Coefficients → evaluations over `g·H`.
    pub fn coset_ntt_r(&self, a: &mut [F]) -> Result<(), DomainError> {
        self.check_len(a.len())?;
        scale_by_powers(a, self.coset_shift);
        ntt_in_place(a, self.omega);
        Ok(())
    }

    /// Evaluations over `g·H` → coefficients.
    pub fn coset_intt_r(&self, a: &mut [F]) -> Result<(), DomainError> {
        self.check_len(a.len())?;
        intt_in_place(a, self.omega);
        let g_inv = self.coset_shift.inverse().ok_or(DomainError::ShiftInDomain)?;
        scale_by_powers(a, g_inv);
        Ok(())
    }

    fn check_len(&self, len: usize) -> Result<(), DomainError> {
        if len != self.n {
            return Err(DomainError::BadLen { len, n: self.n });
        }
        Ok(())
    }
}

/// Stable 32-byte digest of a `Domain` used in logs.
pub fn domain_digest<F: FftField>(d: &Domain<F>) -> [u8; 32] {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(d.n as u64).to_be_bytes());
    // Writing into a Vec cannot fail.
    let _ = d.omega.serialize_compressed(&mut bytes);
    let _ = d.coset_shift.serialize_compressed(&mut bytes);
    let mut h = blake3::Hasher::new();
    h.update(b"ZKR1CS.domain.v1");
    h.update(&bytes);
    *h.finalize().as_bytes()
}

/// `[start, start·step, …]`, `len` terms.
pub(crate) fn powers<F: Field>(start: F, step: F, len: usize) -> Vec<F> {
    let mut out = Vec::with_capacity(len);
    let mut cur = start;
    for _ in 0..len {
        out.push(cur);
        cur *= step;
    }
    out
}

fn scale_by_powers<F: Field>(a: &mut [F], g: F) {
    let mut pow = F::one();
    for x in a.iter_mut() {
        *x *= pow;
        pow *= g;
    }
}

fn ntt_in_place<F: Field>(a: &mut [F], root: F) {
    let n = a.len();
    debug_assert!(n.is_power_of_two());

    // bit-reversal
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            a.swap(i, j);
        }
    }

    // Cooley–Tukey
    let mut len = 2;
    while len <= n {
        let w_len = root.pow([(n / len) as u64]);
        let half = len / 2;
        for start in (0..n).step_by(len) {
            let mut w = F::one();
            for i in 0..half {
                let u = a[start + i];
                let v = a[start + i + half] * w;
                a[start + i] = u + v;
                a[start + i + half] = u - v;
                w *= w_len;
            }
        }
        len <<= 1;
    }
}

fn intt_in_place<F: Field>(a: &mut [F], root: F) {
    let n = a.len();
    let (Some(inv_root), Some(inv_n)) = (root.inverse(), F::from(n as u64).inverse()) else {
        return;
    };
    ntt_in_place(a, inv_root);
    for x in a.iter_mut() {
        *x *= inv_n;
    }
}
