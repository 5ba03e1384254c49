//! Crate root: public surface, curve aliases, and the phase-level error type
//!
//! `zkr1cs` compiles arithmetic circuits into a Rank-1 Constraint System,
//! solves witnesses for them, and runs the Groth16 protocol (circuit-specific
//! trusted setup, prove, verify) over any arkworks pairing curve.
//!
//! ```text
//! Circuit ──compile──▶ R1CS ──assign(secret, public)──▶ Witness
//!                       │                                  │
//!                       └──setup(rng)──▶ (pk, vk)          │
//!                                         │                │
//!                    prove(R1CS, pk, Witness, rng) ──▶ Proof
//!                    verify(Proof, vk, Witness::public()) ──▶ bool
//! ```
//!
//! ## Invariants
//!
//! - **Field & curve.** The core is generic over `E: Pairing`; the binaries
//!   and HTTP service use BN254 ([`Curve`], [`F`]). Field/curve arithmetic is
//!   arkworks'; unsafe code is forbidden throughout.
//! - **Wire layout.** `z = [1, public…, secret…, internal…]`, public and
//!   secret wires in schema declaration order. The public order is part of the
//!   external contract of a compiled circuit.
//! - **Binding.** Every R1CS carries a blake3 digest. Witnesses, public
//!   witnesses and keys carry the digest of the R1CS they came from, and every
//!   phase refuses artifacts belonging to another circuit.
//! - **Randomness.** Setup and prove take the caller's `RngCore + CryptoRng`
//!   and report RNG failure. Toxic waste, witnesses and blinding scalars are
//!   zeroized after use.
//! - **Errors.** Each phase has its own error enum; [`Error`] wraps them with
//!   the phase name. Nothing is silently ignored: `verify` returns a definite
//!   boolean or an error.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

/// Field modulus descriptor, literal parsing, fallible sampling.
pub mod field;
/// Variables, linear combinations, constraints and the frozen R1CS.
pub mod r1cs;
/// Symbolic constraint builder handed to circuits.
pub mod builder;
/// `Circuit` trait, input schema, and the compiler.
pub mod circuit;
/// Named assignments, hint replay, witnesses.
pub mod witness;
/// Radix-2 evaluation domain (NTT, coset, Lagrange at a point).
pub mod domain;
/// R1CS → QAP reduction.
pub mod qap;
/// Parallel multi-scalar multiplication.
pub mod msm;
/// Groth16 keys and proof.
pub mod keys;
/// Trusted setup.
pub mod setup;
/// Prover.
pub mod prover;
/// Verifier.
pub mod verifier;
/// Built-in example circuits.
pub mod circuits;
/// Files, tuning and one-shot helpers.
pub mod api;

// ============================================================================
// Canonical aliases and root-level re-exports
// ============================================================================

/// Default pairing curve for the binaries and HTTP service.
pub type Curve = ark_bn254::Bn254;

/// Scalar field of [`Curve`].
pub type F = ark_bn254::Fr;

pub use builder::Builder;
pub use circuit::{circuit_fn, compile, Circuit, CompilationError, Inputs, Schema};
pub use field::{parse_field_element, FieldError, FieldModulus};
pub use keys::{PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
pub use prover::{prove, ProvingError};
pub use r1cs::{ConstraintTag, LinearCombination, Role, UnsatisfiedConstraint, Variable, R1CS};
pub use setup::{setup, SetupError};
pub use verifier::{prepare_verifying_key, verify, verify_prepared, verify_with_inputs, VerificationError};
pub use witness::{assign, public_witness, Assignment, PublicWitness, Witness, WitnessError};

/// Modulus of the default scalar field.
pub fn default_modulus() -> FieldModulus {
    FieldModulus::of::<F>()
}

// ============================================================================
// Errors
// ============================================================================

/// Any failure of the compile → assign → setup → prove → verify pipeline,
/// tagged with the phase it came from.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Circuit compilation failed.
    #[error("compile: {0}")]
    Compile(#[from] CompilationError),
    /// Witness generation failed (including unsatisfiable inputs).
    #[error("assign: {0}")]
    Assign(#[from] WitnessError),
    /// Trusted setup failed.
    #[error("setup: {0}")]
    Setup(#[from] SetupError),
    /// Proof generation failed.
    #[error("prove: {0}")]
    Prove(#[from] ProvingError),
    /// Verification could not be carried out.
    #[error("verify: {0}")]
    Verify(#[from] VerificationError),
    /// Reading or writing an artifact failed.
    #[error("io: {0}")]
    Io(#[from] api::io::IoError),
}

impl Error {
    /// True if the inputs do not satisfy the circuit.
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(
            self,
            Error::Assign(WitnessError::Unsatisfied(_)) | Error::Prove(ProvingError::Unsatisfied(_))
        )
    }
}
