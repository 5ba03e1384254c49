//! “Happy-path” crate API
//!
//! This module wraps the protocol core with a small, ergonomic surface area:
//! - [`CircuitKeys`]: a compiled circuit with its keys, ready to prove and verify
//! - one-shot [`prove_circuit`] / [`verify_circuit`] working on named inputs
//! - versioned artifact I/O: [`io::write_artifact`] / [`io::read_artifact`]
//! - JSON input/public files shared by the CLIs and the HTTP service
//! - [`Tuning`] from the environment, tracing initialization, and
//!   [`estimate_proving_key_bytes`]
//!
//! Everything delegates to `compile` / `assign` / `setup` / `prove` /
//! `verify`. No protocol changes.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use ark_ec::pairing::Pairing;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{
    assign, compile, prepare_verifying_key, prove, public_witness, setup, verify_prepared,
    Assignment, Circuit, Error, FieldModulus, PreparedVerifyingKey, Proof, ProvingKey,
    PublicWitness, VerifyingKey, R1CS,
};

// ===============================================================================================
// Compiled circuit + keys
// ===============================================================================================

/// A compiled circuit together with its Groth16 keys.
///
/// Immutable and `Sync`: concurrent proofs share it by reference.
pub struct CircuitKeys<E: Pairing> {
    pub name: String,
    pub r1cs: R1CS<E::ScalarField>,
    pub pk: ProvingKey<E>,
    pub pvk: PreparedVerifyingKey<E>,
}

impl<E: Pairing> CircuitKeys<E> {
    /// Compile `circuit` and run a fresh trusted setup for it.
    pub fn generate<C, R>(name: impl Into<String>, circuit: &C, rng: &mut R) -> Result<Self, Error>
    where
        C: Circuit<E::ScalarField> + ?Sized,
        R: RngCore + CryptoRng + ?Sized,
    {
        let r1cs = compile(&FieldModulus::of::<E::ScalarField>(), circuit)?;
        let (pk, vk) = setup::<E, R>(&r1cs, rng)?;
        let pvk = prepare_verifying_key(&vk);
        Ok(Self { name: name.into(), r1cs, pk, pvk })
    }

    /// Recompile `circuit` and attach an existing proving key.
    ///
    /// Fails with a key mismatch if the key was made for another circuit.
    pub fn with_proving_key<C>(name: impl Into<String>, circuit: &C, pk: ProvingKey<E>) -> Result<Self, Error>
    where
        C: Circuit<E::ScalarField> + ?Sized,
    {
        let r1cs = compile(&FieldModulus::of::<E::ScalarField>(), circuit)?;
        if pk.r1cs_digest() != r1cs.digest() {
            return Err(crate::ProvingError::KeyMismatch.into());
        }
        let pvk = prepare_verifying_key(&pk.vk);
        Ok(Self { name: name.into(), r1cs, pk, pvk })
    }

    pub fn vk(&self) -> &VerifyingKey<E> {
        &self.pk.vk
    }
}

/// compile → assign → prove, from named inputs. Returns the proof and the
/// public witness a verifier needs.
pub fn prove_circuit<E, R>(
    keys: &CircuitKeys<E>,
    secret: &Assignment<E::ScalarField>,
    public: &Assignment<E::ScalarField>,
    rng: &mut R,
) -> Result<(Proof<E>, PublicWitness<E::ScalarField>), Error>
where
    E: Pairing,
    R: RngCore + CryptoRng + ?Sized,
{
    let witness = assign(&keys.r1cs, secret, public)?;
    let proof = prove(&keys.r1cs, &keys.pk, &witness, rng)?;
    Ok((proof, witness.public()))
}

/// Verify `proof` against named public inputs.
pub fn verify_circuit<E: Pairing>(
    keys: &CircuitKeys<E>,
    proof: &Proof<E>,
    public: &Assignment<E::ScalarField>,
) -> Result<bool, Error> {
    let pw = public_witness(&keys.r1cs, public)?;
    Ok(verify_prepared(&keys.pvk, proof, &pw)?)
}

// ===============================================================================================
/* Artifact I/O (magic + version + kind + ark-compressed) */
// ===============================================================================================

pub mod io {
    //! Versioned artifact files:
    //!
    //! ```text
    //! magic(8) = "ZKR1CSv1" || version: u16 BE || kind: u8 || ark-compressed payload
    //! ```
    //!
    //! Loading validates the header, runs arkworks' curve/subgroup checks on
    //! every point, and rejects trailing bytes.

    use std::fs;
    use std::path::{Path, PathBuf};

    use ark_ec::pairing::Pairing;
    use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

    use crate::keys::{Proof, ProvingKey, VerifyingKey};

    /// 8-byte magic used by all artifact files.
    pub const FILE_MAGIC: &[u8; 8] = b"ZKR1CSv1";
    pub const FILE_VERSION: u16 = 1;
    const HEADER_LEN: usize = 8 + 2 + 1;

    /// What an artifact file holds.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[repr(u8)]
    pub enum ArtifactKind {
        ProvingKey = 1,
        VerifyingKey = 2,
        Proof = 3,
    }

    impl std::fmt::Display for ArtifactKind {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(match self {
                ArtifactKind::ProvingKey => "proving key",
                ArtifactKind::VerifyingKey => "verifying key",
                ArtifactKind::Proof => "proof",
            })
        }
    }

    #[derive(Debug, thiserror::Error)]
    pub enum IoError {
        #[error("{}: {source}", path.display())]
        File {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        #[error("bad artifact magic (expected {:?})", String::from_utf8_lossy(FILE_MAGIC))]
        BadMagic,
        #[error("unsupported artifact version {0}")]
        Version(u16),
        #[error("expected a {expected} artifact, found kind byte {found}")]
        Kind { expected: ArtifactKind, found: u8 },
        #[error("truncated artifact header")]
        Truncated,
        #[error("serialization: {0}")]
        Serialization(String),
        #[error("{0} trailing bytes after artifact payload")]
        TrailingBytes(usize),
    }

    /// Encode `value` with the artifact header.
    pub fn to_bytes<T: CanonicalSerialize>(kind: ArtifactKind, value: &T) -> Result<Vec<u8>, IoError> {
        let mut out = Vec::with_capacity(HEADER_LEN + value.compressed_size());
        out.extend_from_slice(FILE_MAGIC);
        out.extend_from_slice(&FILE_VERSION.to_be_bytes());
        out.push(kind as u8);
        value
            .serialize_compressed(&mut out)
            .map_err(|e| IoError::Serialization(e.to_string()))?;
        Ok(out)
    }

    /// Decode an artifact produced by [`to_bytes`].
    pub fn from_bytes<T: CanonicalDeserialize>(kind: ArtifactKind, bytes: &[u8]) -> Result<T, IoError> {
        if bytes.len() < HEADER_LEN {
            return Err(IoError::Truncated);
        }
        if &bytes[..8] != FILE_MAGIC {
            return Err(IoError::BadMagic);
        }
        let version = u16::from_be_bytes([bytes[8], bytes[9]]);
        if version != FILE_VERSION {
            return Err(IoError::Version(version));
        }
        if bytes[10] != kind as u8 {
            return Err(IoError::Kind { expected: kind, found: bytes[10] });
        }
        let mut slice = &bytes[HEADER_LEN..];
        let value = T::deserialize_compressed(&mut slice).map_err(|e| IoError::Serialization(e.to_string()))?;
        if !slice.is_empty() {
            return Err(IoError::TrailingBytes(slice.len()));
        }
        Ok(value)
    }

    pub fn write_artifact<T: CanonicalSerialize>(path: &Path, kind: ArtifactKind, value: &T) -> Result<(), IoError> {
        let bytes = to_bytes(kind, value)?;
        fs::write(path, bytes).map_err(|source| IoError::File { path: path.to_path_buf(), source })
    }

    pub fn read_artifact<T: CanonicalDeserialize>(path: &Path, kind: ArtifactKind) -> Result<T, IoError> {
        let bytes = fs::read(path).map_err(|source| IoError::File { path: path.to_path_buf(), source })?;
        from_bytes(kind, &bytes)
    }

    pub fn write_proving_key<E: Pairing>(path: &Path, pk: &ProvingKey<E>) -> Result<(), IoError> {
        write_artifact(path, ArtifactKind::ProvingKey, pk)
    }

    pub fn read_proving_key<E: Pairing>(path: &Path) -> Result<ProvingKey<E>, IoError> {
        read_artifact(path, ArtifactKind::ProvingKey)
    }

    pub fn write_verifying_key<E: Pairing>(path: &Path, vk: &VerifyingKey<E>) -> Result<(), IoError> {
        write_artifact(path, ArtifactKind::VerifyingKey, vk)
    }

    pub fn read_verifying_key<E: Pairing>(path: &Path) -> Result<VerifyingKey<E>, IoError> {
        read_artifact(path, ArtifactKind::VerifyingKey)
    }

    pub fn write_proof<E: Pairing>(path: &Path, proof: &Proof<E>) -> Result<(), IoError> {
        write_artifact(path, ArtifactKind::Proof, proof)
    }

    pub fn read_proof<E: Pairing>(path: &Path) -> Result<Proof<E>, IoError> {
        read_artifact(path, ArtifactKind::Proof)
    }
}

// ===============================================================================================
/* JSON input files */
// ===============================================================================================

/// Prover input file: `{"secret": {"x": "2"}, "public": {"y": "15"}}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputsFile {
    #[serde(default)]
    pub secret: BTreeMap<String, String>,
    #[serde(default)]
    pub public: BTreeMap<String, String>,
}

/// Public statement written next to a proof:
/// `{"circuit": "cubic", "r1cs_digest": "…", "public": {"y": "15"}}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicFile {
    pub circuit: String,
    pub r1cs_digest: String,
    pub public: BTreeMap<String, String>,
}

impl PublicFile {
    /// Name the values of `pw` after the public inputs of `r1cs`.
    pub fn new<Fld: ark_ff::PrimeField>(circuit: &str, r1cs: &R1CS<Fld>, pw: &PublicWitness<Fld>) -> Self {
        let public = r1cs
            .public_names()
            .iter()
            .cloned()
            .zip(pw.to_decimal_strings())
            .collect();
        Self { circuit: circuit.to_string(), r1cs_digest: hex::encode(pw.r1cs_digest()), public }
    }
}

// ===============================================================================================
/* Tuning & Introspection */
// ===============================================================================================

/// Runtime knobs, read from the environment.
#[derive(Clone, Debug)]
pub struct Tuning {
    /// `ZKR1CS_THREADS`: rayon pool size (0 = one per core).
    pub threads: usize,
    /// `ZKR1CS_ADDR`: HTTP bind address.
    pub addr: String,
    /// `ZKR1CS_MAX_BODY`: HTTP body limit in bytes.
    pub max_body: usize,
    /// `ZKR1CS_LOG_JSON`: JSON log lines.
    pub log_json: bool,
    /// `ZKR1CS_DEV_SEED`: deterministic setup RNG seed. Insecure.
    pub dev_seed: Option<u64>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            threads: 0,
            addr: "127.0.0.1:8080".to_string(),
            max_body: 2 * 1024 * 1024,
            log_json: false,
            dev_seed: None,
        }
    }
}

impl Tuning {
    pub fn from_env() -> Self {
        let d = Self::default();
        let var = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());
        Self {
            threads: var("ZKR1CS_THREADS").and_then(|v| v.trim().parse().ok()).unwrap_or(d.threads),
            addr: var("ZKR1CS_ADDR").unwrap_or(d.addr),
            max_body: var("ZKR1CS_MAX_BODY").and_then(|v| v.trim().parse().ok()).unwrap_or(d.max_body),
            log_json: var("ZKR1CS_LOG_JSON").map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false),
            dev_seed: var("ZKR1CS_DEV_SEED").and_then(|v| v.trim().parse().ok()),
        }
    }

    /// Size the global rayon pool. Only the first call in a process takes effect.
    pub fn install_thread_pool(&self) {
        #[cfg(feature = "parallel")]
        {
            if self.threads > 0 {
                if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(self.threads).build_global() {
                    tracing::warn!("thread pool already initialized: {e}");
                }
            }
        }
    }
}

/// Install the `tracing` subscriber used by the binaries.
///
/// Filter from `RUST_LOG`, falling back to `zkr1cs=info`.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("zkr1cs=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let res = if json { builder.json().try_init() } else { builder.compact().try_init() };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Rough proving key size (bytes, compressed BN254 points).
pub fn estimate_proving_key_bytes(num_variables: usize, num_public: usize, domain_size: usize) -> usize {
    const G1: usize = 32;
    const G2: usize = 64;
    let g1_points = (3 * num_variables + domain_size + 4).saturating_sub(num_public.min(num_variables) + 1);
    let g2_points = num_variables + 3;
    g1_points * G1 + g2_points * G2 + 64
}

#[cfg(test)]
mod tests {
    use super::io::*;
    use super::*;
    use crate::circuits::CubicCircuit;
    use ark_bn254::{Bn254, Fr};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn artifact_files_roundtrip_and_check_kind() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let keys = CircuitKeys::<Bn254>::generate("cubic", &CubicCircuit, &mut rng).unwrap();

        let vk_path = dir.path().join("vk.bin");
        write_verifying_key(&vk_path, keys.vk()).unwrap();
        let vk: VerifyingKey<Bn254> = read_verifying_key(&vk_path).unwrap();
        assert_eq!(&vk, keys.vk());

        assert!(matches!(read_proof::<Bn254>(&vk_path), Err(IoError::Kind { .. })));
        assert!(matches!(
            read_proof::<Bn254>(&dir.path().join("missing.bin")),
            Err(IoError::File { .. })
        ));

        let mut bytes = to_bytes(ArtifactKind::VerifyingKey, &vk).unwrap();
        bytes.push(0);
        assert!(matches!(
            from_bytes::<VerifyingKey<Bn254>>(ArtifactKind::VerifyingKey, &bytes),
            Err(IoError::TrailingBytes(1))
        ));
        bytes[0] ^= 1;
        assert!(matches!(
            from_bytes::<VerifyingKey<Bn254>>(ArtifactKind::VerifyingKey, &bytes),
            Err(IoError::BadMagic)
        ));
    }

    #[test]
    fn one_shot_helpers() {
        let mut rng = StdRng::seed_from_u64(6);
        let keys = CircuitKeys::<Bn254>::generate("cubic", &CubicCircuit, &mut rng).unwrap();
        let secret = Assignment::<Fr>::new().with("x", 3u64);
        let public = Assignment::<Fr>::new().with("y", 35u64);
        let (proof, pw) = prove_circuit(&keys, &secret, &public, &mut rng).unwrap();
        assert!(verify_circuit(&keys, &proof, &public).unwrap());
        assert!(!verify_circuit(&keys, &proof, &Assignment::new().with("y", 36u64)).unwrap());

        let file = PublicFile::new("cubic", &keys.r1cs, &pw);
        assert_eq!(file.public.get("y").map(String::as_str), Some("35"));
        assert_eq!(file.r1cs_digest, keys.r1cs.digest_hex());

        let err = prove_circuit(&keys, &secret, &Assignment::new().with("y", 36u64), &mut rng).unwrap_err();
        assert!(err.is_unsatisfiable());
    }

    #[test]
    fn tuning_defaults() {
        let t = Tuning::default();
        assert_eq!(t.addr, "127.0.0.1:8080");
        assert!(t.dev_seed.is_none());
        assert!(estimate_proving_key_bytes(5, 1, 8) > 0);
    }

    #[test]
    fn key_size_estimate_handles_empty_circuits() {
        assert_eq!(estimate_proving_key_bytes(0, 0, 0), 3 * 32 + 3 * 64 + 64);
        assert_eq!(estimate_proving_key_bytes(0, 3, 1), 4 * 32 + 3 * 64 + 64);
        assert!(estimate_proving_key_bytes(6, 1, 8) > estimate_proving_key_bytes(5, 1, 8));
    }
}
