//! zkr1cs setup CLI
//!
//! Compiles a built-in circuit and runs the Groth16 trusted setup for it.
//!
//! Usage:
//!   cargo run --bin setup -- --circuit cubic --out-pk pk.bin --out-vk vk.bin
//!
//! Flags:
//!   --circuit <name>   built-in circuit (see `--list`)       [default: cubic]
//!   --out-pk <path>    proving key output                     [default: pk.bin]
//!   --out-vk <path>    verifying key output                   [default: vk.bin]
//!   --list             print the built-in circuits and exit
//!
//! Environment:
//!   ZKR1CS_DEV_SEED    deterministic RNG seed (INSECURE, tests and demos only)
//!   ZKR1CS_THREADS     rayon pool size
//!   ZKR1CS_LOG_JSON    JSON log lines

#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::time::Instant;

use anyhow::anyhow;
use rand::{rngs::OsRng, rngs::StdRng, SeedableRng};

use zkr1cs::{
    api::{self, io},
    circuits, compile, default_modulus, setup, Curve, F,
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

    if args.iter().any(|a| a == "--list") {
        for (name, about) in circuits::BUILTIN {
            println!("{name:<10} {about}");
        }
        return Ok(());
    }

    let name = parse_flag(&args, "--circuit").unwrap_or_else(|| "cubic".into());
    let pk_path = PathBuf::from(parse_flag(&args, "--out-pk").unwrap_or_else(|| "pk.bin".into()));
    let vk_path = PathBuf::from(parse_flag(&args, "--out-vk").unwrap_or_else(|| "vk.bin".into()));

    let circuit = circuits::builtin::<F>(&name)
        .ok_or_else(|| anyhow!("unknown circuit `{name}` (try --list)"))?;
    let r1cs = compile(&default_modulus(), circuit.as_ref())
        .map_err(|e| anyhow!("compile {name}: {e}"))?;
    eprintln!(
        "✓ Compiled `{name}`: {} constraints, {} wires ({} public, {} secret)",
        r1cs.num_constraints(),
        r1cs.num_variables(),
        r1cs.num_public(),
        r1cs.num_secret()
    );
    eprintln!("  R1CS digest: {}", r1cs.digest_hex());

    let t0 = Instant::now();
    let (pk, vk) = match tuning.dev_seed {
        Some(seed) => {
            eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            eprintln!("⚠️  WARNING: ZKR1CS_DEV_SEED={seed} makes the toxic waste PUBLIC");
            eprintln!("⚠️  Anyone can forge proofs for these keys. Never deploy them.");
            eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            setup::<Curve, _>(&r1cs, &mut StdRng::seed_from_u64(seed))
        }
        None => setup::<Curve, _>(&r1cs, &mut OsRng),
    }
    .map_err(|e| anyhow!("setup {name}: {e}"))?;
    eprintln!("✓ Setup finished in {:.2?}", t0.elapsed());
    let estimate =
        api::estimate_proving_key_bytes(r1cs.num_variables(), r1cs.num_public(), pk.domain_size as usize);
    eprintln!("  proving key: ~{:.1} KiB", estimate as f64 / 1024.0);

    io::write_proving_key(&pk_path, &pk).map_err(|e| anyhow!("write proving key: {e}"))?;
    io::write_verifying_key(&vk_path, &vk).map_err(|e| anyhow!("write verifying key: {e}"))?;

    eprintln!("✓ Saved keys:");
    eprintln!("  {} (domain N={}, {} h-query points)", pk_path.display(), pk.domain_size, pk.h_query.len());
    eprintln!("  {} ({} public inputs)", vk_path.display(), vk.num_public());
    eprintln!();
    eprintln!("To prove, run:");
    eprintln!(
        "  cargo run --bin prover -- --circuit {name} --pk {} --inputs inputs.json",
        pk_path.display()
    );
    Ok(())
}
