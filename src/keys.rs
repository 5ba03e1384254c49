//! Groth16 key and proof types.
//!
//! All types serialize with arkworks' canonical encoding (compressed points,
//! subgroup checks on load). Keys carry the digest of the R1CS they were
//! generated for; the prover and verifier compare it before doing any work.

#![forbid(unsafe_code)]

use ark_ec::pairing::{Pairing, PairingOutput};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

/// Verifier half of the setup output.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct VerifyingKey<E: Pairing> {
    pub alpha_g1: E::G1Affine,
    pub beta_g2: E::G2Affine,
    pub gamma_g2: E::G2Affine,
    pub delta_g2: E::G2Affine,
    /// `[(β·uᵢ(τ) + α·vᵢ(τ) + wᵢ(τ)) / γ]₁` for the one-wire and each public input.
    pub gamma_abc_g1: Vec<E::G1Affine>,
    pub r1cs_digest: [u8; 32],
}

impl<E: Pairing> VerifyingKey<E> {
    /// Number of public inputs this key expects.
    pub fn num_public(&self) -> usize {
        self.gamma_abc_g1.len().saturating_sub(1)
    }

    pub fn r1cs_digest_hex(&self) -> String {
        hex::encode(self.r1cs_digest)
    }
}

/// Prover half of the setup output.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct ProvingKey<E: Pairing> {
    pub vk: VerifyingKey<E>,
    pub beta_g1: E::G1Affine,
    pub delta_g1: E::G1Affine,
    /// `[uᵢ(τ)]₁` for every wire.
    pub a_query: Vec<E::G1Affine>,
    /// `[vᵢ(τ)]₁` for every wire.
    pub b_g1_query: Vec<E::G1Affine>,
    /// `[vᵢ(τ)]₂` for every wire.
    pub b_g2_query: Vec<E::G2Affine>,
    /// `[τⁱ·Z_H(τ)/δ]₁` for `i < N − 1`.
    pub h_query: Vec<E::G1Affine>,
    /// `[(β·uᵢ(τ) + α·vᵢ(τ) + wᵢ(τ)) / δ]₁` for the private wires.
    pub l_query: Vec<E::G1Affine>,
    /// QAP domain size `N`.
    pub domain_size: u64,
}

impl<E: Pairing> ProvingKey<E> {
    pub fn r1cs_digest(&self) -> &[u8; 32] {
        &self.vk.r1cs_digest
    }
}

/// `(A, B, C)`.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Proof<E: Pairing> {
    pub a: E::G1Affine,
    pub b: E::G2Affine,
    pub c: E::G1Affine,
}

/// Verifying key with `e(α, β)` and the negated G2 points precomputed.
#[derive(Clone, Debug)]
pub struct PreparedVerifyingKey<E: Pairing> {
    pub vk: VerifyingKey<E>,
    pub alpha_g1_beta_g2: PairingOutput<E>,
    pub gamma_g2_neg_pc: E::G2Prepared,
    pub delta_g2_neg_pc: E::G2Prepared,
}

impl<E: Pairing> From<VerifyingKey<E>> for PreparedVerifyingKey<E> {
    fn from(vk: VerifyingKey<E>) -> Self {
        crate::verifier::prepare_verifying_key(&vk)
    }
}

impl<E: Pairing> From<&VerifyingKey<E>> for PreparedVerifyingKey<E> {
    fn from(vk: &VerifyingKey<E>) -> Self {
        crate::verifier::prepare_verifying_key(vk)
    }
}
