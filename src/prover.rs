//! Groth16 prover.
//!
//! Given a satisfying witness `z` and fresh blinding scalars `r, s`:
//!
//! ```text
//! A = α + Σ zᵢ·uᵢ(τ) + r·δ                                  (G1)
//! B = β + Σ zᵢ·vᵢ(τ) + s·δ                                  (G2, and G1 for C)
//! C = Σ_{private} zᵢ·Lᵢ + Σ hⱼ·τʲZ_H(τ)/δ + s·A + r·B − r·s·δ (G1)
//! ```
//!
//! `h` comes from [`crate::qap::quotient_coefficients`]. Every consistency
//! check runs before the first MSM.

#![forbid(unsafe_code)]

use std::time::Instant;

use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::domain::DomainError;
use crate::field::{try_sample, FieldError};
use crate::keys::{Proof, ProvingKey};
use crate::msm::msm;
use crate::qap;
use crate::r1cs::{UnsatisfiedConstraint, R1CS};
use crate::witness::Witness;

#[derive(Debug, thiserror::Error)]
pub enum ProvingError {
    #[error("proving key was generated for a different circuit")]
    KeyMismatch,
    #[error("witness was assigned for a different circuit")]
    WitnessMismatch,
    #[error("witness has {got} wires, circuit has {expected}")]
    WitnessSize { expected: usize, got: usize },
    #[error("malformed proving key: {0}")]
    MalformedKey(String),
    #[error("unsatisfiable witness: {0}")]
    Unsatisfied(#[from] UnsatisfiedConstraint),
    #[error("randomness source failed: {0}")]
    Randomness(#[from] rand::Error),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Field(#[from] FieldError),
}

fn check_len(what: &str, got: usize, expected: usize) -> Result<(), ProvingError> {
    if got != expected {
        return Err(ProvingError::MalformedKey(format!("{what} has {got} entries, expected {expected}")));
    }
    Ok(())
}

/// Produce a proof that `witness` satisfies `r1cs`.
pub fn prove<E, R>(
    r1cs: &R1CS<E::ScalarField>,
    pk: &ProvingKey<E>,
    witness: &Witness<E::ScalarField>,
    rng: &mut R,
) -> Result<Proof<E>, ProvingError>
where
    E: Pairing,
    R: RngCore + CryptoRng + ?Sized,
{
    r1cs.modulus().ensure::<E::ScalarField>()?;
    witness.modulus().ensure::<E::ScalarField>()?;
    if pk.r1cs_digest() != r1cs.digest() {
        return Err(ProvingError::KeyMismatch);
    }
    if witness.r1cs_digest() != r1cs.digest() {
        return Err(ProvingError::WitnessMismatch);
    }
    let nv = r1cs.num_variables();
    if witness.len() != nv {
        return Err(ProvingError::WitnessSize { expected: nv, got: witness.len() });
    }

    let domain = qap::domain_for(r1cs)?;
    let num_instance = r1cs.num_public() + 1;
    check_len("domain", pk.domain_size as usize, domain.n)?;
    check_len("a_query", pk.a_query.len(), nv)?;
    check_len("b_g1_query", pk.b_g1_query.len(), nv)?;
    check_len("b_g2_query", pk.b_g2_query.len(), nv)?;
    check_len("l_query", pk.l_query.len(), nv - num_instance)?;
    check_len("gamma_abc_g1", pk.vk.gamma_abc_g1.len(), num_instance)?;
    check_len("h_query", pk.h_query.len(), domain.n.saturating_sub(1).max(1))?;

    let z = witness.values();
    r1cs.is_satisfied(z)?;

    let t0 = Instant::now();
    let mut h = qap::quotient_coefficients(r1cs, &domain, z)?;
    let t_h = t0.elapsed();

    let mut r: E::ScalarField = try_sample(rng)?;
    let mut s: E::ScalarField = try_sample(rng)?;

    let a = pk.vk.alpha_g1.into_group() + msm::<E::G1>(&pk.a_query, z) + pk.delta_g1 * r;
    let b_g2 = pk.vk.beta_g2.into_group() + msm::<E::G2>(&pk.b_g2_query, z) + pk.vk.delta_g2 * s;
    let b_g1 = pk.beta_g1.into_group() + msm::<E::G1>(&pk.b_g1_query, z) + pk.delta_g1 * s;
    let c = msm::<E::G1>(&pk.l_query, &z[num_instance..])
        + msm::<E::G1>(&pk.h_query, &h)
        + a * s
        + b_g1 * r
        - pk.delta_g1 * (r * s);

    h.zeroize();
    r.zeroize();
    s.zeroize();

    let proof = Proof { a: a.into_affine(), b: b_g2.into_affine(), c: c.into_affine() };
    tracing::debug!(
        constraints = r1cs.num_constraints(),
        domain = domain.n,
        quotient_ms = t_h.as_millis() as u64,
        total_ms = t0.elapsed().as_millis() as u64,
        "groth16 proof generated"
    );
    Ok(proof)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::CubicCircuit;
    use crate::field::FieldModulus;
    use crate::setup::setup;
    use crate::verifier::verify;
    use crate::witness::{assign, Assignment};
    use crate::compile;
    use ark_bn254::{Bn254, Fr};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn cubic_proof_verifies_and_is_randomized() {
        let mut rng = StdRng::seed_from_u64(42);
        let r1cs = compile::<Fr, _>(&FieldModulus::of::<Fr>(), &CubicCircuit).unwrap();
        let (pk, vk) = setup::<Bn254, _>(&r1cs, &mut rng).unwrap();
        let w = assign(&r1cs, &Assignment::new().with("x", 2u64), &Assignment::new().with("y", 15u64))
            .unwrap();

        let p1 = prove(&r1cs, &pk, &w, &mut rng).unwrap();
        let p2 = prove(&r1cs, &pk, &w, &mut rng).unwrap();
        assert_ne!(p1, p2);
        assert!(verify(&p1, &vk, &w.public()).unwrap());
        assert!(verify(&p2, &vk, &w.public()).unwrap());
    }

    #[test]
    fn malformed_key_is_rejected_before_proving() {
        let mut rng = StdRng::seed_from_u64(43);
        let r1cs = compile::<Fr, _>(&FieldModulus::of::<Fr>(), &CubicCircuit).unwrap();
        let (mut pk, _) = setup::<Bn254, _>(&r1cs, &mut rng).unwrap();
        let w = assign(&r1cs, &Assignment::new().with("x", 1u64), &Assignment::new().with("y", 7u64))
            .unwrap();
        pk.h_query.pop();
        assert!(matches!(prove(&r1cs, &pk, &w, &mut rng), Err(ProvingError::MalformedKey(_))));
    }
}
