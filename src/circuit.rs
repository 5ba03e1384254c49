//! Circuit definition contract and the compiler driving it.
//!
//! A circuit declares its inputs explicitly through a [`Schema`] and emits
//! constraints in [`Circuit::define`]. [`compile`] seeds the wire registry
//! from the schema (public inputs first, then secret inputs, each in
//! declaration order), runs `define` exactly once and freezes the result
//! into an [`R1CS`].

#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use ark_ff::PrimeField;

use crate::builder::Builder;
use crate::field::{FieldError, FieldModulus};
use crate::r1cs::{Role, Variable, R1CS};

/// Errors raised while turning a circuit into an R1CS.
#[derive(Debug, thiserror::Error)]
pub enum CompilationError {
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("input name must not be empty")]
    EmptyName,
    #[error("invalid input name `{0}`")]
    InvalidName(String),
    #[error("duplicate input name `{0}`")]
    DuplicateName(String),
    #[error("role `{0}` cannot be used for this wire")]
    InvalidRole(Role),
    #[error("circuit referenced undeclared input `{0}`")]
    UnknownInput(String),
    #[error("wire layout violation: {0}")]
    LayoutViolation(String),
    #[error("division by constant zero")]
    DivisionByZero,
    #[error("bit width {requested} out of range (1..={max})")]
    BitWidth { requested: usize, max: usize },
    #[error("product of zero factors")]
    EmptyProduct,
    #[error("inconsistent circuit: {0}")]
    Inconsistent(String),
    #[error("circuit error: {0}")]
    Circuit(String),
}

/// One declared input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputDecl {
    pub name: String,
    pub role: Role,
}

/// Ordered input declarations of a circuit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    inputs: Vec<InputDecl>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public(self, name: impl Into<String>) -> Self {
        self.input(name, Role::Public)
    }

    pub fn secret(self, name: impl Into<String>) -> Self {
        self.input(name, Role::Secret)
    }

    pub fn input(mut self, name: impl Into<String>, role: Role) -> Self {
        self.inputs.push(InputDecl { name: name.into(), role });
        self
    }

    pub fn inputs(&self) -> &[InputDecl] {
        &self.inputs
    }

    pub fn names(&self, role: Role) -> Vec<String> {
        self.inputs.iter().filter(|d| d.role == role).map(|d| d.name.clone()).collect()
    }

    /// Names must be non-empty, unique and free of whitespace/control
    /// characters; roles must be public or secret.
    pub fn validate(&self) -> Result<(), CompilationError> {
        let mut seen = BTreeSet::new();
        for d in &self.inputs {
            if d.name.is_empty() {
                return Err(CompilationError::EmptyName);
            }
            if d.name.chars().any(|c| c.is_whitespace() || c.is_control()) {
                return Err(CompilationError::InvalidName(d.name.clone()));
            }
            if !matches!(d.role, Role::Public | Role::Secret) {
                return Err(CompilationError::InvalidRole(d.role));
            }
            if !seen.insert(d.name.as_str()) {
                return Err(CompilationError::DuplicateName(d.name.clone()));
            }
        }
        Ok(())
    }
}

/// Input wires by declared name, handed to [`Circuit::define`].
#[derive(Clone, Debug, Default)]
pub struct Inputs {
    by_name: BTreeMap<String, Variable>,
}

impl Inputs {
    pub fn get(&self, name: &str) -> Result<Variable, CompilationError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| CompilationError::UnknownInput(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// A compilable circuit.
pub trait Circuit<F: PrimeField> {
    fn schema(&self) -> Schema;

    fn define(&self, api: &mut Builder<F>, inputs: &Inputs) -> Result<(), CompilationError>;
}

/// Circuit from a schema and a closure.
pub struct FnCircuit<D> {
    schema: Schema,
    define: D,
}

/// Wrap a closure as a [`Circuit`].
pub fn circuit_fn<F, D>(schema: Schema, define: D) -> FnCircuit<D>
where
    F: PrimeField,
    D: Fn(&mut Builder<F>, &Inputs) -> Result<(), CompilationError>,
{
    FnCircuit { schema, define }
}

impl<F, D> Circuit<F> for FnCircuit<D>
where
    F: PrimeField,
    D: Fn(&mut Builder<F>, &Inputs) -> Result<(), CompilationError>,
{
    fn schema(&self) -> Schema {
        self.schema.clone()
    }

    fn define(&self, api: &mut Builder<F>, inputs: &Inputs) -> Result<(), CompilationError> {
        (self.define)(api, inputs)
    }
}

/// Compile `circuit` over `F` into an immutable [`R1CS`].
///
/// `modulus` must describe `F`. Compiling the same circuit twice yields the
/// same constraints and digest.
pub fn compile<F, C>(modulus: &FieldModulus, circuit: &C) -> Result<R1CS<F>, CompilationError>
where
    F: PrimeField,
    C: Circuit<F> + ?Sized,
{
    modulus.ensure::<F>()?;
    let schema = circuit.schema();
    schema.validate()?;

    let t0 = Instant::now();
    let mut api = Builder::<F>::new();
    let mut inputs = Inputs::default();
    let public_names = schema.names(Role::Public);
    let secret_names = schema.names(Role::Secret);
    for (names, role) in [(&public_names, Role::Public), (&secret_names, Role::Secret)] {
        for name in names.iter() {
            let v = api.allocate(role)?;
            inputs.by_name.insert(name.clone(), v);
        }
    }
    api.seal_inputs();

    circuit.define(&mut api, &inputs)?;

    let r1cs = api.finish(public_names, secret_names, modulus.clone());
    let digest = r1cs.digest_hex();
    tracing::debug!(
        constraints = r1cs.num_constraints(),
        variables = r1cs.num_variables(),
        public = r1cs.num_public(),
        secret = r1cs.num_secret(),
        digest = %&digest[..16],
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "compiled circuit"
    );
    Ok(r1cs)
}
