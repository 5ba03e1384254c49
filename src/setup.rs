//! Groth16 circuit-specific trusted setup.
//!
//! # Toxic waste
//!
//! Setup samples five secrets from the caller's RNG:
//!
//! - `τ`: the evaluation point of the QAP
//! - `α`, `β`: bind `A`, `B` and `C` to the same witness
//! - `γ`: separates the public-input part of the check
//! - `δ`: separates the prover-supplied part of the check
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ANYONE WHO LEARNS (τ, α, β, γ, δ) CAN FORGE PROOFS          │
//! │                                                              │
//! │  The secrets live in a `ToxicWaste` value that is zeroized    │
//! │  when setup returns. The RNG that produced them is the       │
//! │  caller's: its state must be destroyed too.                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Degenerate samples
//!
//! A zero secret, or `τ` landing on the evaluation domain, makes the keys
//! useless. Setup reports [`SetupError::DegenerateToxicWaste`] instead of
//! producing them; calling again with fresh randomness is valid.
//!
//! # Cost
//!
//! Key sizes are linear in the number of wires and constraints. All
//! fixed-base scalar multiplications go through [`crate::msm::fixed_base`],
//! which fans out over rayon workers.

#![forbid(unsafe_code)]

use std::time::Instant;

use ark_ec::{pairing::Pairing, CurveGroup, Group};
use ark_ff::{Field, PrimeField, Zero};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::domain::{domain_digest, powers, DomainError};
use crate::field::{try_sample_nonzero, FieldError};
use crate::keys::{ProvingKey, VerifyingKey};
use crate::msm::fixed_base;
use crate::qap;
use crate::r1cs::R1CS;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("randomness source failed: {0}")]
    Randomness(#[from] rand::Error),
    #[error("degenerate toxic waste ({0}); retry with fresh randomness")]
    DegenerateToxicWaste(&'static str),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// The setup secrets. Wiped on drop.
pub(crate) struct ToxicWaste<F: PrimeField> {
    pub(crate) tau: F,
    pub(crate) alpha: F,
    pub(crate) beta: F,
    pub(crate) gamma: F,
    pub(crate) delta: F,
}

impl<F: PrimeField> ToxicWaste<F> {
    pub(crate) fn sample<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Result<Self, SetupError> {
        let mut draw = || -> Result<F, SetupError> {
            try_sample_nonzero(&mut *rng)?.ok_or(SetupError::DegenerateToxicWaste("rng keeps yielding zero"))
        };
        Ok(Self { tau: draw()?, alpha: draw()?, beta: draw()?, gamma: draw()?, delta: draw()? })
    }
}

impl<F: PrimeField> Drop for ToxicWaste<F> {
    fn drop(&mut self) {
        self.tau.zeroize();
        self.alpha.zeroize();
        self.beta.zeroize();
        self.gamma.zeroize();
        self.delta.zeroize();
    }
}

/// Generate a proving/verifying key pair for `r1cs`.
///
/// The caller owns `rng` and must destroy its state afterwards.
pub fn setup<E, R>(
    r1cs: &R1CS<E::ScalarField>,
    rng: &mut R,
) -> Result<(ProvingKey<E>, VerifyingKey<E>), SetupError>
where
    E: Pairing,
    R: RngCore + CryptoRng + ?Sized,
{
    r1cs.modulus().ensure::<E::ScalarField>()?;
    let tw = ToxicWaste::sample(rng)?;
    generate_keys(r1cs, &tw)
}

pub(crate) fn generate_keys<E: Pairing>(
    r1cs: &R1CS<E::ScalarField>,
    tw: &ToxicWaste<E::ScalarField>,
) -> Result<(ProvingKey<E>, VerifyingKey<E>), SetupError> {
    if tw.alpha.is_zero() || tw.beta.is_zero() {
        return Err(SetupError::DegenerateToxicWaste("alpha or beta is zero"));
    }
    let gamma_inv = tw.gamma.inverse().ok_or(SetupError::DegenerateToxicWaste("gamma is zero"))?;
    let delta_inv = tw.delta.inverse().ok_or(SetupError::DegenerateToxicWaste("delta is zero"))?;

    let t0 = Instant::now();
    let domain = qap::domain_for(r1cs)?;
    if tw.tau.is_zero() || domain.is_in_domain(tw.tau) {
        return Err(SetupError::DegenerateToxicWaste("tau lies on the evaluation domain"));
    }
    let mut q = qap::evaluate_at(r1cs, &domain, tw.tau)?;

    let num_instance = r1cs.num_public() + 1;
    let mut abc: Vec<E::ScalarField> = q
        .u
        .iter()
        .zip(&q.v)
        .zip(&q.w)
        .map(|((u, v), w)| tw.beta * u + tw.alpha * v + w)
        .collect();
    let mut gamma_abc: Vec<_> = abc[..num_instance].iter().map(|x| *x * gamma_inv).collect();
    let mut l: Vec<_> = abc[num_instance..].iter().map(|x| *x * delta_inv).collect();
    let mut h: Vec<_> = powers(q.zt * delta_inv, tw.tau, domain.n.saturating_sub(1).max(1));

    let g1 = E::G1::generator();
    let g2 = E::G2::generator();

    let a_query = fixed_base(g1, &q.u);
    let b_g1_query = fixed_base(g1, &q.v);
    let b_g2_query = fixed_base(g2, &q.v);
    let h_query = fixed_base(g1, &h);
    let l_query = fixed_base(g1, &l);
    let gamma_abc_g1 = fixed_base(g1, &gamma_abc);

    let vk = VerifyingKey::<E> {
        alpha_g1: (g1 * tw.alpha).into_affine(),
        beta_g2: (g2 * tw.beta).into_affine(),
        gamma_g2: (g2 * tw.gamma).into_affine(),
        delta_g2: (g2 * tw.delta).into_affine(),
        gamma_abc_g1,
        r1cs_digest: *r1cs.digest(),
    };
    let pk = ProvingKey {
        vk: vk.clone(),
        beta_g1: (g1 * tw.beta).into_affine(),
        delta_g1: (g1 * tw.delta).into_affine(),
        a_query,
        b_g1_query,
        b_g2_query,
        h_query,
        l_query,
        domain_size: domain.n as u64,
    };

    for v in [&mut q.u, &mut q.v, &mut q.w, &mut abc, &mut gamma_abc, &mut l, &mut h] {
        v.zeroize();
    }
    q.zt.zeroize();

    tracing::info!(
        constraints = r1cs.num_constraints(),
        variables = r1cs.num_variables(),
        domain = domain.n,
        domain_digest = %hex::encode(domain_digest(&domain)),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "groth16 setup complete"
    );
    Ok((pk, vk))
}
