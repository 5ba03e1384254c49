//! zkr1cs prover CLI
//!
//! Reads a proving key and a JSON inputs file, solves the witness for a
//! built-in circuit and writes a versioned proof file plus the public
//! statement the verifier needs.
//!
//! Usage:
//!   cargo run --bin prover -- --circuit cubic --pk pk.bin --inputs inputs.json
//!
//! `inputs.json`:
//!   {"secret": {"x": "2"}, "public": {"y": "15"}}
//!
//! Flags:
//!   --circuit <name>     built-in circuit                      [default: cubic]
//!   --pk <path>          proving key                           [default: pk.bin]
//!   --inputs <path>      inputs file                           [default: inputs.json]
//!   --out <path>         proof output                          [default: proof.bin]
//!   --public-out <path>  public statement output               [default: public.json]
//!
//! Values are decimal or `0x` hex literals, reduced modulo the BN254 scalar
//! field. An unsatisfiable assignment exits non-zero and writes nothing.

#![forbid(unsafe_code)]

use std::{fs, path::PathBuf, time::Instant};

use anyhow::anyhow;
use rand::rngs::OsRng;

use zkr1cs::{
    api::{self, io, CircuitKeys, InputsFile, PublicFile},
    assign, circuits, prove, Assignment, Curve, F,
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
    tuning.install_thread_pool();

    let name = parse_flag(&args, "--circuit").unwrap_or_else(|| "cubic".into());
    let pk_path = PathBuf::from(parse_flag(&args, "--pk").unwrap_or_else(|| "pk.bin".into()));
    let inputs_path = PathBuf::from(parse_flag(&args, "--inputs").unwrap_or_else(|| "inputs.json".into()));
    let out_path = PathBuf::from(parse_flag(&args, "--out").unwrap_or_else(|| "proof.bin".into()));
    let public_path =
        PathBuf::from(parse_flag(&args, "--public-out").unwrap_or_else(|| "public.json".into()));

    let circuit = circuits::builtin::<F>(&name)
        .ok_or_else(|| anyhow!("unknown circuit `{name}`"))?;

    eprintln!("Loading proving key from {}...", pk_path.display());
    let pk = io::read_proving_key::<Curve>(&pk_path).map_err(|e| anyhow!("read proving key: {e}"))?;
    let keys = CircuitKeys::with_proving_key(name.as_str(), circuit.as_ref(), pk)
        .map_err(|e| anyhow!("{name}: {e}"))?;
    eprintln!(
        "✓ Proving key matches `{name}` (digest {}, domain N={})",
        keys.r1cs.digest_hex(),
        keys.pk.domain_size
    );

    let raw = fs::read_to_string(&inputs_path)
        .map_err(|e| anyhow!("read {}: {e}", inputs_path.display()))?;
    let inputs: InputsFile = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("parse {}: {e}", inputs_path.display()))?;
    let secret = Assignment::<F>::from_strings(&inputs.secret).map_err(|e| anyhow!("secret inputs: {e}"))?;
    let public = Assignment::<F>::from_strings(&inputs.public).map_err(|e| anyhow!("public inputs: {e}"))?;

    let t0 = Instant::now();
    let witness = assign(&keys.r1cs, &secret, &public).map_err(|e| anyhow!("assign: {e}"))?;
    eprintln!("✓ Witness solved: {} wires in {:.2?}", witness.len(), t0.elapsed());

    let t1 = Instant::now();
    let proof = prove(&keys.r1cs, &keys.pk, &witness, &mut OsRng).map_err(|e| anyhow!("prove: {e}"))?;
    eprintln!("✓ Proof generated in {:.2?}", t1.elapsed());

    io::write_proof(&out_path, &proof).map_err(|e| anyhow!("write proof: {e}"))?;
    let statement = PublicFile::new(&name, &keys.r1cs, &witness.public());
    let json = serde_json::to_string_pretty(&statement)?;
    fs::write(&public_path, json).map_err(|e| anyhow!("write {}: {e}", public_path.display()))?;

    eprintln!();
    eprintln!("✓ Wrote {} (v{})", out_path.display(), io::FILE_VERSION);
    eprintln!("✓ Wrote {}", public_path.display());
    eprintln!();
    eprintln!("To verify this proof, run:");
    eprintln!(
        "  cargo run --bin verifier -- --vk vk.bin --proof {} --public {}",
        out_path.display(),
        public_path.display()
    );
    Ok(())
}
