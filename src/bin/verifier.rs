//! zkr1cs verifier CLI
//!
//! Checks a proof file against a verifying key and the public statement
//! written by the prover.
//!
//! Usage:
//!   cargo run --bin verifier -- --vk vk.bin --proof proof.bin --public public.json
//!
//! The statement names its circuit. The circuit is recompiled and its digest
//! must match both the statement and the verifying key before any pairing is
//! computed. Exit status is non-zero unless the proof is accepted.

#![forbid(unsafe_code)]

use std::{fs, path::PathBuf};

use anyhow::anyhow;

use zkr1cs::{
    api::{self, io, PublicFile},
    circuits, compile, default_modulus, public_witness, verify, Assignment, Curve, F,
};

fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
        if let Some(v) = a.strip_prefix(&format!("{key}=")) {
            return Some(v.to_string());
        }
    }
    None
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let tuning = api::Tuning::from_env();
    api::init_tracing(tuning.log_json);

    let vk_path = PathBuf::from(parse_flag(&args, "--vk").unwrap_or_else(|| "vk.bin".into()));
    let proof_path = PathBuf::from(parse_flag(&args, "--proof").unwrap_or_else(|| "proof.bin".into()));
    let public_path = PathBuf::from(parse_flag(&args, "--public").unwrap_or_else(|| "public.json".into()));

    let vk = io::read_verifying_key::<Curve>(&vk_path).map_err(|e| anyhow!("read verifying key: {e}"))?;
    let proof = io::read_proof::<Curve>(&proof_path).map_err(|e| anyhow!("read proof: {e}"))?;
    let raw = fs::read_to_string(&public_path)
        .map_err(|e| anyhow!("read {}: {e}", public_path.display()))?;
    let statement: PublicFile = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("parse {}: {e}", public_path.display()))?;
    eprintln!("✓ Loaded {} and {}", vk_path.display(), proof_path.display());

    let circuit = circuits::builtin::<F>(&statement.circuit)
        .ok_or_else(|| anyhow!("unknown circuit `{}`", statement.circuit))?;
    let r1cs = compile(&default_modulus(), circuit.as_ref())
        .map_err(|e| anyhow!("compile {}: {e}", statement.circuit))?;

    eprintln!("Cryptographic parameters:");
    eprintln!("  circuit:          {}", statement.circuit);
    eprintln!("  R1CS digest:      {}", r1cs.digest_hex());
    eprintln!("  statement digest: {}", statement.r1cs_digest);
    eprintln!("  key digest:       {}", vk.r1cs_digest_hex());
    if statement.r1cs_digest != r1cs.digest_hex() {
        return Err(anyhow!("public statement was produced for a different build of `{}`", statement.circuit));
    }
    if vk.r1cs_digest_hex() != r1cs.digest_hex() {
        return Err(anyhow!("verifying key was generated for a different circuit"));
    }

    let public = Assignment::<F>::from_strings(&statement.public).map_err(|e| anyhow!("public inputs: {e}"))?;
    let pw = public_witness(&r1cs, &public).map_err(|e| anyhow!("public inputs: {e}"))?;

    eprintln!();
    eprintln!("Running pairing check...");
    let ok = verify(&proof, &vk, &pw).map_err(|e| anyhow!("verification failed: {e}"))?;
    if !ok {
        eprintln!("✗ Proof REJECTED");
        println!("Verifier result: rejected");
        return Err(anyhow!("proof does not verify"));
    }

    eprintln!();
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    eprintln!("✓ VERIFICATION SUCCESSFUL");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Verifier result: ok");
    Ok(())
}
