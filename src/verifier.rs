//! Groth16 verification.
//!
//! Accept iff
//!
//! ```text
//! e(A, B) = e(α, β) · e(Σ xᵢ·ICᵢ, γ) · e(C, δ)
//! ```
//!
//! evaluated as one multi-Miller loop over `(A, B), (acc, −γ), (C, −δ)`
//! followed by a single final exponentiation and a comparison with the
//! precomputed `e(α, β)`.

#![forbid(unsafe_code)]

use std::time::Instant;

use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};

use crate::field::FieldError;
use crate::keys::{PreparedVerifyingKey, Proof, VerifyingKey};
use crate::msm::msm;
use crate::witness::PublicWitness;

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("expected {expected} public inputs, got {got}")]
    PublicInputLength { expected: usize, got: usize },
    #[error("public witness was produced for a different circuit than the verifying key")]
    KeyMismatch,
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("malformed proof: {0}")]
    MalformedProof(&'static str),
}

/// Precompute `e(α, β)` and the prepared `−γ`, `−δ`.
pub fn prepare_verifying_key<E: Pairing>(vk: &VerifyingKey<E>) -> PreparedVerifyingKey<E> {
    PreparedVerifyingKey {
        vk: vk.clone(),
        alpha_g1_beta_g2: E::pairing(vk.alpha_g1, vk.beta_g2),
        gamma_g2_neg_pc: (-vk.gamma_g2.into_group()).into_affine().into(),
        delta_g2_neg_pc: (-vk.delta_g2.into_group()).into_affine().into(),
    }
}

/// Verify `proof` against `vk` and a public witness for the same circuit.
pub fn verify<E: Pairing>(
    proof: &Proof<E>,
    vk: &VerifyingKey<E>,
    public: &PublicWitness<E::ScalarField>,
) -> Result<bool, VerificationError> {
    check_public_witness(vk, public)?;
    verify_with_inputs(&prepare_verifying_key(vk), proof, public.values())
}

/// [`verify`] with a prepared key.
pub fn verify_prepared<E: Pairing>(
    pvk: &PreparedVerifyingKey<E>,
    proof: &Proof<E>,
    public: &PublicWitness<E::ScalarField>,
) -> Result<bool, VerificationError> {
    check_public_witness(&pvk.vk, public)?;
    verify_with_inputs(pvk, proof, public.values())
}

fn check_public_witness<E: Pairing>(
    vk: &VerifyingKey<E>,
    public: &PublicWitness<E::ScalarField>,
) -> Result<(), VerificationError> {
    public.modulus().ensure::<E::ScalarField>()?;
    if public.r1cs_digest() != &vk.r1cs_digest {
        return Err(VerificationError::KeyMismatch);
    }
    Ok(())
}

/// Verify against raw public inputs in wire order (no digest check).
pub fn verify_with_inputs<E: Pairing>(
    pvk: &PreparedVerifyingKey<E>,
    proof: &Proof<E>,
    inputs: &[E::ScalarField],
) -> Result<bool, VerificationError> {
    let expected = pvk.vk.num_public();
    if inputs.len() != expected || pvk.vk.gamma_abc_g1.is_empty() {
        return Err(VerificationError::PublicInputLength { expected, got: inputs.len() });
    }
    if proof.a.is_zero() || proof.b.is_zero() || proof.c.is_zero() {
        return Err(VerificationError::MalformedProof("point at infinity"));
    }

    let t0 = Instant::now();
    let acc = pvk.vk.gamma_abc_g1[0].into_group() + msm::<E::G1>(&pvk.vk.gamma_abc_g1[1..], inputs);

    let ml = E::multi_miller_loop(
        [proof.a, acc.into_affine(), proof.c],
        [
            E::G2Prepared::from(proof.b),
            pvk.gamma_g2_neg_pc.clone(),
            pvk.delta_g2_neg_pc.clone(),
        ],
    );
    let ok = match E::final_exponentiation(ml) {
        Some(out) => out == pvk.alpha_g1_beta_g2,
        None => false,
    };

    tracing::debug!(
        public_inputs = inputs.len(),
        accepted = ok,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "groth16 verify"
    );
    Ok(ok)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::{CubicCircuit, FactorCircuit};
    use crate::field::FieldModulus;
    use crate::witness::{assign, Assignment};
    use crate::{compile, prove, setup};
    use ark_bn254::{Bn254, Fr};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn one_shot_and_prepared_verification_agree() {
        let mut rng = StdRng::seed_from_u64(21);
        let r1cs = compile(&FieldModulus::of::<Fr>(), &CubicCircuit).unwrap();
        let (pk, vk) = setup::<Bn254, _>(&r1cs, &mut rng).unwrap();
        let w = assign(
            &r1cs,
            &Assignment::new().with("x", Fr::from(3u64)),
            &Assignment::new().with("y", Fr::from(35u64)),
        )
        .unwrap();
        let proof = prove(&r1cs, &pk, &w, &mut rng).unwrap();

        let pvk = prepare_verifying_key(&vk);
        assert!(verify(&proof, &vk, &w.public()).unwrap());
        assert!(verify_prepared(&pvk, &proof, &w.public()).unwrap());
        assert!(verify_with_inputs(&pvk, &proof, w.public().values()).unwrap());
        assert_eq!(pvk.alpha_g1_beta_g2, Bn254::pairing(vk.alpha_g1, vk.beta_g2));
    }

    #[test]
    fn foreign_public_witness_is_caught_before_pairing() {
        let mut rng = StdRng::seed_from_u64(22);
        let modulus = FieldModulus::of::<Fr>();
        let cubic = compile(&modulus, &CubicCircuit).unwrap();
        let factor = compile(&modulus, &FactorCircuit).unwrap();
        let (pk, vk) = setup::<Bn254, _>(&cubic, &mut rng).unwrap();
        let w = assign(
            &cubic,
            &Assignment::new().with("x", Fr::from(3u64)),
            &Assignment::new().with("y", Fr::from(35u64)),
        )
        .unwrap();
        let proof = prove(&cubic, &pk, &w, &mut rng).unwrap();

        let foreign = crate::public_witness(&factor, &Assignment::new().with("n", Fr::from(35u64))).unwrap();
        assert!(matches!(verify(&proof, &vk, &foreign), Err(VerificationError::KeyMismatch)));
        assert!(matches!(
            verify_prepared(&prepare_verifying_key(&vk), &proof, &foreign),
            Err(VerificationError::KeyMismatch)
        ));
    }
}
