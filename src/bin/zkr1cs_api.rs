//! zkr1cs HTTP API (axum)
//!
//! Endpoints:
//! - `GET  /v1/health`    liveness
//! - `GET  /v1/version`   crate, protocol and curve
//! - `GET  /v1/circuits`  built-in circuits and whether keys exist for them
//! - `POST /v1/setup`     `{"circuit": "cubic"}` → verifying key (base64 artifact)
//! - `POST /v1/prove`     `{"circuit", "secret": {..}, "public": {..}}` → proof (base64 artifact)
//! - `POST /v1/verify`    `{"circuit", "proof_b64", "public": {..}}` → `{"status": "ok" | "invalid"}`
//!
//! Keys live in process memory, one set per circuit name, until the next
//! `/v1/setup` for that circuit replaces them. Proving and setup run on the
//! blocking pool.
//!
//! Environment: `ZKR1CS_ADDR`, `ZKR1CS_MAX_BODY`, `ZKR1CS_THREADS`,
//! `ZKR1CS_LOG_JSON`, `ZKR1CS_DEV_SEED`, `RUST_LOG`.

#![forbid(unsafe_code)]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use rand::{rngs::OsRng, rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use zkr1cs::{
    api::{self, io::ArtifactKind, CircuitKeys, PublicFile},
    circuits, Assignment, Curve, Error, Proof, ProvingError, WitnessError, F,
};

type ApiError = (StatusCode, String);

// ------------------------------ Types ------------------------------

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize)]
struct Version {
    api: &'static str,
    protocol: &'static str,
    curve: &'static str,
    parallel: bool,
}

#[derive(Serialize)]
struct CircuitView {
    name: &'static str,
    description: &'static str,
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    r1cs_digest: Option<String>,
}

#[derive(Deserialize)]
struct SetupReq {
    circuit: String,
}

#[derive(Serialize)]
struct SetupRes {
    circuit: String,
    r1cs_digest: String,
    constraints: usize,
    variables: usize,
    public_inputs: Vec<String>,
    domain_size: u64,
    vk_b64: String,
}

#[derive(Deserialize)]
struct ProveReq {
    circuit: String,
    #[serde(default)]
    secret: BTreeMap<String, String>,
    #[serde(default)]
    public: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct ProveRes {
    #[serde(flatten)]
    statement: PublicFile,
    proof_b64: String,
}

#[derive(Deserialize)]
struct VerifyReq {
    circuit: String,
    proof_b64: String,
    #[serde(default)]
    public: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct VerifyRes {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Clone)]
struct AppState {
    keys: Arc<RwLock<HashMap<String, Arc<CircuitKeys<Curve>>>>>,
    dev_seed: Option<u64>,
}

impl AppState {
    fn lookup(&self, name: &str) -> Result<Arc<CircuitKeys<Curve>>, ApiError> {
        if circuits::builtin::<F>(name).is_none() {
            return Err((StatusCode::NOT_FOUND, format!("unknown circuit `{name}`")));
        }
        let map = self.keys.read().unwrap_or_else(|p| p.into_inner());
        map.get(name).cloned().ok_or_else(|| {
            (StatusCode::CONFLICT, format!("no keys for `{name}`; POST /v1/setup first"))
        })
    }
}

// ------------------------------ Helpers ------------------------------

fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::Assign(WitnessError::Unsatisfied(_)) | Error::Prove(ProvingError::Unsatisfied(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Error::Assign(_) | Error::Verify(_) | Error::Io(_) => StatusCode::BAD_REQUEST,
        Error::Compile(_) | Error::Setup(_) | Error::Prove(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_err(e: Error) -> ApiError {
    (status_for(&e), e.to_string())
}

fn assignment(values: &BTreeMap<String, String>) -> Result<Assignment<F>, ApiError> {
    Assignment::from_strings(values).map_err(|e| api_err(e.into()))
}

async fn blocking<T, Fun>(f: Fun) -> Result<T, ApiError>
where
    T: Send + 'static,
    Fun: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("worker failed: {e}")))?
}

// ------------------------------ Handlers ------------------------------

async fn health() -> impl IntoResponse {
    Json(Health { status: "ok" })
}

async fn version() -> impl IntoResponse {
    Json(Version {
        api: env!("CARGO_PKG_VERSION"),
        protocol: "groth16",
        curve: "bn254",
        parallel: cfg!(feature = "parallel"),
    })
}

async fn list_circuits(State(st): State<AppState>) -> impl IntoResponse {
    let map = st.keys.read().unwrap_or_else(|p| p.into_inner());
    let views: Vec<CircuitView> = circuits::BUILTIN
        .iter()
        .map(|&(name, description)| {
            let keys = map.get(name);
            CircuitView {
                name,
                description,
                ready: keys.is_some(),
                r1cs_digest: keys.map(|k| k.r1cs.digest_hex()),
            }
        })
        .collect();
    Json(views)
}

async fn run_setup(
    State(st): State<AppState>,
    Json(req): Json<SetupReq>,
) -> Result<Json<SetupRes>, ApiError> {
    let name = req.circuit;
    let circuit = circuits::builtin::<F>(&name)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown circuit `{name}`")))?;
    let dev_seed = st.dev_seed;

    let task_name = name.clone();
    let keys = blocking(move || {
        let res = match dev_seed {
            Some(seed) => CircuitKeys::<Curve>::generate(task_name, circuit.as_ref(), &mut StdRng::seed_from_u64(seed)),
            None => CircuitKeys::<Curve>::generate(task_name, circuit.as_ref(), &mut OsRng),
        };
        res.map_err(api_err)
    })
    .await?;

    let vk_bytes = api::io::to_bytes(ArtifactKind::VerifyingKey, keys.vk()).map_err(|e| api_err(e.into()))?;
    let res = SetupRes {
        circuit: name.clone(),
        r1cs_digest: keys.r1cs.digest_hex(),
        constraints: keys.r1cs.num_constraints(),
        variables: keys.r1cs.num_variables(),
        public_inputs: keys.r1cs.public_names().to_vec(),
        domain_size: keys.pk.domain_size,
        vk_b64: base64::engine::general_purpose::STANDARD.encode(vk_bytes),
    };
    info!(circuit = %name, digest = %res.r1cs_digest, constraints = res.constraints, "keys generated");

    let mut map = st.keys.write().unwrap_or_else(|p| p.into_inner());
    if map.insert(name.clone(), Arc::new(keys)).is_some() {
        warn!(circuit = %name, "replaced existing keys; earlier proofs no longer verify");
    }
    Ok(Json(res))
}

async fn run_prove(
    State(st): State<AppState>,
    Json(req): Json<ProveReq>,
) -> Result<Json<ProveRes>, ApiError> {
    let keys = st.lookup(&req.circuit)?;
    let secret = assignment(&req.secret)?;
    let public = assignment(&req.public)?;
    let name = req.circuit;

    blocking(move || {
        let (proof, pw) = api::prove_circuit(&keys, &secret, &public, &mut OsRng).map_err(api_err)?;
        let bytes = api::io::to_bytes(ArtifactKind::Proof, &proof).map_err(|e| api_err(e.into()))?;
        Ok(Json(ProveRes {
            statement: PublicFile::new(&name, &keys.r1cs, &pw),
            proof_b64: base64::engine::general_purpose::STANDARD.encode(bytes),
        }))
    })
    .await
}

async fn run_verify(
    State(st): State<AppState>,
    Json(req): Json<VerifyReq>,
) -> Result<Json<VerifyRes>, ApiError> {
    let keys = st.lookup(&req.circuit)?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(req.proof_b64.trim())
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("proof_b64: {e}")))?;
    let proof: Proof<Curve> =
        api::io::from_bytes(ArtifactKind::Proof, &bytes).map_err(|e| api_err(e.into()))?;
    let public = assignment(&req.public)?;

    let ok = blocking(move || api::verify_circuit(&keys, &proof, &public).map_err(api_err)).await?;
    Ok(Json(if ok {
        VerifyRes { status: "ok", reason: None }
    } else {
        VerifyRes { status: "invalid", reason: Some("pairing check failed".into()) }
    }))
}

// ------------------------------ Main ------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let tuning = api::Tuning::from_env();
    api::init_tracing(tuning.log_json);
    tuning.install_thread_pool();

    let addr: SocketAddr = tuning
        .addr
        .parse()
        .map_err(|e| anyhow::anyhow!("ZKR1CS_ADDR `{}`: {e}", tuning.addr))?;

    if tuning.dev_seed.is_some() {
        warn!("⚠️  ZKR1CS_DEV_SEED is set: setup randomness is PUBLIC, proofs can be forged");
    }

    let state = AppState { keys: Arc::new(RwLock::new(HashMap::new())), dev_seed: tuning.dev_seed };

    let app = Router::new()
        .route("/v1/health", get(health))
        .route("/v1/version", get(version))
        .route("/v1/circuits", get(list_circuits))
        .route("/v1/setup", post(run_setup))
        .route("/v1/prove", post(run_prove))
        .route("/v1/verify", post(run_verify))
        .layer(DefaultBodyLimit::max(tuning.max_body))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!(%addr, max_body = tuning.max_body, "zkr1cs API listening");
    println!("zkr1cs API listening on http://{addr}");
    println!();
    println!("Generate keys before proving:");
    println!("  curl -X POST http://{addr}/v1/setup \\");
    println!("    -H \"Content-Type: application/json\" \\");
    println!("    -d '{{\"circuit\": \"cubic\"}}'");
    println!();

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
