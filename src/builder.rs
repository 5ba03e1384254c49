//! Symbolic constraint builder handed to [`crate::Circuit::define`].
//!
//! Every operation manipulates linear combinations and, where a product is
//! needed, allocates a fresh internal wire, records a hint describing how to
//! compute it, and appends one rank-1 constraint. Nothing here evaluates
//! field values except folding expressions that only touch the one-wire.
//!
//! ## Sessions
//!
//! Each builder gets a process-unique session id. Variables carry the id of
//! the session that allocated them. Passing a variable into another builder
//! is a programming error and panics; the one-wire is shared by all sessions.
//!
//! ## Constraint shapes
//!
//! | op                  | constraint(s)                         |
//! |---------------------|---------------------------------------|
//! | `mul(a, b)`         | `a · b = v`                           |
//! | `assert_is_equal`   | `a · 1 = b`                           |
//! | `inverse(a)`        | `a · v = 1`                           |
//! | `div(a, b)`         | `b · q = a`                           |
//! | `assert_is_boolean` | `a · (1 − a) = 0`                     |
//! | `select(s, x, y)`   | `s · (x − y) = t`, result `t + y`     |
//! | `is_zero(a)`        | `a · m = 1 − o`, `a · o = 0`          |
//! | `to_binary(a, n)`   | `n` booleanity checks + recomposition |

#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use ark_ff::PrimeField;

use crate::circuit::CompilationError;
use crate::field::FieldModulus;
use crate::r1cs::{Constraint, ConstraintTag, LinearCombination, Role, Variable, R1CS};
use crate::witness::{Hint, HintOp};

type Lc<F> = LinearCombination<F>;

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Constraint builder for one compilation session.
pub struct Builder<F: PrimeField> {
    session: u64,
    num_variables: usize,
    inputs_sealed: bool,
    constraints: Vec<Constraint<F>>,
    hints: Vec<Hint<F>>,
}

impl<F: PrimeField> Builder<F> {
    pub(crate) fn new() -> Self {
        Self {
            session: NEXT_SESSION.fetch_add(1, Ordering::Relaxed),
            num_variables: 1,
            inputs_sealed: false,
            constraints: Vec::new(),
            hints: Vec::new(),
        }
    }

    /// Session id stamped into every variable this builder allocates.
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    /// The constant-one wire.
    pub fn one(&self) -> Variable {
        Variable::ONE
    }

    /// Allocate an input wire.
    ///
    /// Only public and secret wires can be allocated directly, and only
    /// while inputs are being seeded from the schema. Internal wires come out
    /// of the operations below, which also record how to compute them.
    pub fn allocate(&mut self, role: Role) -> Result<Variable, CompilationError> {
        match role {
            Role::Public | Role::Secret if !self.inputs_sealed => Ok(self.fresh(role)),
            Role::Public | Role::Secret => Err(CompilationError::LayoutViolation(format!(
                "{role} wire allocated after circuit logic started"
            ))),
            Role::Constant | Role::Internal => Err(CompilationError::InvalidRole(role)),
        }
    }

    pub(crate) fn seal_inputs(&mut self) {
        self.inputs_sealed = true;
    }

    fn fresh(&mut self, role: Role) -> Variable {
        let v = Variable { index: self.num_variables, role, session: self.session };
        self.num_variables += 1;
        v
    }

    fn fresh_hinted(&mut self, op: HintOp<F>, constraint: usize) -> Variable {
        let v = self.fresh(Role::Internal);
        self.hints.push(Hint { output: v.index, constraint, op });
        v
    }

    fn check(&self, lc: &Lc<F>) {
        for v in lc.variables() {
            if v.role == Role::Constant {
                continue;
            }
            if v.session != self.session {
                panic!(
                    "variable #{} belongs to compilation session {}, not {}",
                    v.index, v.session, self.session
                );
            }
            assert!(v.index < self.num_variables, "variable #{} was never allocated", v.index);
        }
    }

    fn lc(&self, x: impl Into<Lc<F>>) -> Lc<F> {
        let lc = x.into();
        self.check(&lc);
        lc
    }

    fn enforce(&mut self, a: Lc<F>, b: Lc<F>, c: Lc<F>, tag: ConstraintTag) -> usize {
        self.constraints.push(Constraint { a, b, c, tag });
        self.constraints.len() - 1
    }

    /* ------------------------------ linear ------------------------------ */

    pub fn constant(&self, k: impl Into<F>) -> Lc<F> {
        Lc::constant(k.into())
    }

    pub fn add(&self, a: impl Into<Lc<F>>, b: impl Into<Lc<F>>) -> Lc<F> {
        self.lc(a) + self.lc(b)
    }

    /// `Σ terms`.
    pub fn sum<I, T>(&self, terms: I) -> Lc<F>
    where
        I: IntoIterator<Item = T>,
        T: Into<Lc<F>>,
    {
        terms.into_iter().fold(Lc::zero(), |acc, t| acc + self.lc(t))
    }

    pub fn sub(&self, a: impl Into<Lc<F>>, b: impl Into<Lc<F>>) -> Lc<F> {
        self.lc(a) - self.lc(b)
    }

    pub fn neg(&self, a: impl Into<Lc<F>>) -> Lc<F> {
        -self.lc(a)
    }

    pub fn scale(&self, a: impl Into<Lc<F>>, k: impl Into<F>) -> Lc<F> {
        self.lc(a).scale(k.into())
    }

    /* ---------------------------- multiplicative ---------------------------- */

    /// `v = a · b` on a fresh internal wire.
    pub fn mul(&mut self, a: impl Into<Lc<F>>, b: impl Into<Lc<F>>) -> Variable {
        let (a, b) = (self.lc(a), self.lc(b));
        let row = self.constraints.len();
        let v = self.fresh_hinted(HintOp::Product(a.clone(), b.clone()), row);
        self.enforce(a, b, v.into(), ConstraintTag::Mul);
        v
    }

    /// Product of all factors as a chain of degree-2 multiplications.
    pub fn mul_many<I, T>(&mut self, factors: I) -> Result<Lc<F>, CompilationError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Lc<F>>,
    {
        let mut it = factors.into_iter();
        let first = it.next().ok_or(CompilationError::EmptyProduct)?;
        let mut acc = self.lc(first);
        for f in it {
            acc = self.mul(acc, f).into();
        }
        Ok(acc)
    }

    /// Enforce `a == b`.
    pub fn assert_is_equal(
        &mut self,
        a: impl Into<Lc<F>>,
        b: impl Into<Lc<F>>,
    ) -> Result<(), CompilationError> {
        let (a, b) = (self.lc(a), self.lc(b));
        if let (Some(x), Some(y)) = (a.as_constant(), b.as_constant()) {
            if x == y {
                return Ok(());
            }
            return Err(CompilationError::Inconsistent(format!(
                "constant assertion {x} == {y} can never hold"
            )));
        }
        self.enforce(a, Variable::ONE.into(), b, ConstraintTag::AssertEqual);
        Ok(())
    }

    /// `a⁻¹`. A runtime zero surfaces as an unsatisfied constraint at assign time.
    pub fn inverse(&mut self, a: impl Into<Lc<F>>) -> Result<Lc<F>, CompilationError> {
        let a = self.lc(a);
        if let Some(k) = a.as_constant() {
            let inv = k.inverse().ok_or(CompilationError::DivisionByZero)?;
            return Ok(Lc::constant(inv));
        }
        let row = self.constraints.len();
        let v = self.fresh_hinted(HintOp::Inverse(a.clone()), row);
        self.enforce(a, v.into(), Variable::ONE.into(), ConstraintTag::Inverse);
        Ok(v.into())
    }

    /// `a / b`.
    pub fn div(
        &mut self,
        a: impl Into<Lc<F>>,
        b: impl Into<Lc<F>>,
    ) -> Result<Lc<F>, CompilationError> {
        let (a, b) = (self.lc(a), self.lc(b));
        if let Some(k) = b.as_constant() {
            let inv = k.inverse().ok_or(CompilationError::DivisionByZero)?;
            return Ok(a.scale(inv));
        }
        let row = self.constraints.len();
        let q = self.fresh_hinted(HintOp::Quotient(a.clone(), b.clone()), row);
        self.enforce(b, q.into(), a, ConstraintTag::Division);
        Ok(q.into())
    }

    /// Enforce `a ∈ {0, 1}`.
    pub fn assert_is_boolean(&mut self, a: impl Into<Lc<F>>) -> Result<(), CompilationError> {
        let a = self.lc(a);
        self.enforce_boolean(a, ConstraintTag::Boolean)
    }

    fn enforce_boolean(&mut self, a: Lc<F>, tag: ConstraintTag) -> Result<(), CompilationError> {
        if let Some(k) = a.as_constant() {
            if k.is_zero() || k.is_one() {
                return Ok(());
            }
            return Err(CompilationError::Inconsistent(format!("constant {k} is not boolean")));
        }
        let one_minus = Lc::constant(F::one()) - a.clone();
        self.enforce(a, one_minus, Lc::zero(), tag);
        Ok(())
    }

    /// `bit ? x : y`. `bit` is constrained to be boolean.
    pub fn select(
        &mut self,
        bit: impl Into<Lc<F>>,
        x: impl Into<Lc<F>>,
        y: impl Into<Lc<F>>,
    ) -> Result<Lc<F>, CompilationError> {
        let (bit, x, y) = (self.lc(bit), self.lc(x), self.lc(y));
        self.enforce_boolean(bit.clone(), ConstraintTag::Select)?;
        if let Some(k) = bit.as_constant() {
            return Ok(if k.is_one() { x } else { y });
        }
        let d = x - y.clone();
        if d.is_empty() {
            return Ok(y);
        }
        let row = self.constraints.len();
        let t = self.fresh_hinted(HintOp::Product(bit.clone(), d.clone()), row);
        self.enforce(bit, d, t.into(), ConstraintTag::Select);
        Ok(Lc::from(t) + y)
    }

    /// `1` if `a == 0`, else `0`.
    pub fn is_zero(&mut self, a: impl Into<Lc<F>>) -> Lc<F> {
        let a = self.lc(a);
        if let Some(k) = a.as_constant() {
            return Lc::constant(if k.is_zero() { F::one() } else { F::zero() });
        }
        let row = self.constraints.len();
        let m = self.fresh_hinted(HintOp::IsZeroInverse(a.clone()), row);
        let out = self.fresh_hinted(HintOp::IsZero(a.clone()), row);
        let one_minus_out = Lc::constant(F::one()) - Lc::from(out);
        self.enforce(a.clone(), m.into(), one_minus_out, ConstraintTag::IsZero);
        self.enforce(a, out.into(), Lc::zero(), ConstraintTag::IsZero);
        out.into()
    }

    /// Little-endian decomposition of `a` into `n` bits.
    ///
    /// Fails to assign if `a ≥ 2ⁿ`. `n` must leave headroom below the modulus.
    pub fn to_binary(
        &mut self,
        a: impl Into<Lc<F>>,
        n: usize,
    ) -> Result<Vec<Variable>, CompilationError> {
        let a = self.lc(a);
        let max = F::MODULUS_BIT_SIZE as usize - 1;
        if n == 0 || n > max {
            return Err(CompilationError::BitWidth { requested: n, max });
        }
        let mut bits = Vec::with_capacity(n);
        let mut recomposed = Vec::with_capacity(n);
        let mut weight = F::one();
        for i in 0..n {
            let row = self.constraints.len();
            let b = self.fresh_hinted(HintOp::Bit(a.clone(), i), row);
            let lb = Lc::from(b);
            self.enforce(lb.clone(), Lc::constant(F::one()) - lb, Lc::zero(), ConstraintTag::Binary);
            recomposed.push((weight, b));
            weight.double_in_place();
            bits.push(b);
        }
        self.enforce(
            Lc::from_terms(recomposed),
            Variable::ONE.into(),
            a,
            ConstraintTag::Binary,
        );
        Ok(bits)
    }

    /// `Σ 2ⁱ · bitsᵢ`, asserting each bit is boolean.
    pub fn from_binary<I, T>(&mut self, bits: I) -> Result<Lc<F>, CompilationError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Lc<F>>,
    {
        let mut acc = Lc::zero();
        let mut weight = F::one();
        for b in bits {
            let b = self.lc(b);
            self.enforce_boolean(b.clone(), ConstraintTag::Boolean)?;
            acc = acc + b.scale(weight);
            weight.double_in_place();
        }
        Ok(acc)
    }

    pub(crate) fn finish(
        self,
        public_names: Vec<String>,
        secret_names: Vec<String>,
        modulus: FieldModulus,
    ) -> R1CS<F> {
        R1CS::new(
            self.constraints,
            self.num_variables,
            public_names,
            secret_names,
            self.hints,
            modulus,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_ff::{Field, One};

    fn sealed_with_input() -> (Builder<Fr>, Variable) {
        let mut b = Builder::<Fr>::new();
        let x = b.allocate(Role::Secret).unwrap();
        b.seal_inputs();
        (b, x)
    }

    #[test]
    fn mul_emits_one_constraint_and_fresh_wire() {
        let (mut b, x) = sealed_with_input();
        let v = b.mul(x, x);
        assert_eq!(v.index(), 2);
        assert_eq!(v.role(), Role::Internal);
        assert_eq!(b.num_constraints(), 1);
        assert_eq!(b.constraints[0].tag, ConstraintTag::Mul);
    }

    #[test]
    fn linear_ops_are_free() {
        let (b, x) = sealed_with_input();
        let lc = b.sum([b.scale(x, 3u64), b.constant(5u64), b.neg(x)]);
        assert_eq!(lc.len(), 2);
        assert_eq!(b.num_constraints(), 0);
    }

    #[test]
    fn mul_many_chains_degree_two() {
        let (mut b, x) = sealed_with_input();
        b.mul_many([x, x, x]).unwrap();
        assert_eq!(b.num_constraints(), 2);
        assert!(matches!(
            b.mul_many(Vec::<Variable>::new()),
            Err(CompilationError::EmptyProduct)
        ));
    }

    #[test]
    fn constant_division_by_zero_is_a_compile_error() {
        let (mut b, x) = sealed_with_input();
        let zero = b.constant(0u64);
        assert!(matches!(b.div(x, zero.clone()), Err(CompilationError::DivisionByZero)));
        assert!(matches!(b.inverse(zero), Err(CompilationError::DivisionByZero)));
        let half = b.div(x, b.constant(2u64)).unwrap();
        assert_eq!(b.num_constraints(), 0);
        assert_eq!(half.terms()[0].0.double(), Fr::one());
    }

    #[test]
    fn inconsistent_constants_are_rejected() {
        let (mut b, _) = sealed_with_input();
        let two = b.constant(2u64);
        let three = b.constant(3u64);
        assert!(b.assert_is_equal(two.clone(), two.clone()).is_ok());
        assert!(matches!(b.assert_is_equal(two.clone(), three), Err(CompilationError::Inconsistent(_))));
        assert!(matches!(b.assert_is_boolean(two), Err(CompilationError::Inconsistent(_))));
    }

    #[test]
    fn inputs_cannot_be_allocated_after_sealing() {
        let (mut b, _) = sealed_with_input();
        assert!(matches!(b.allocate(Role::Public), Err(CompilationError::LayoutViolation(_))));
        assert!(matches!(b.allocate(Role::Internal), Err(CompilationError::InvalidRole(_))));
    }

    #[test]
    fn bit_width_is_bounded() {
        let (mut b, x) = sealed_with_input();
        assert!(matches!(b.to_binary(x, 0), Err(CompilationError::BitWidth { .. })));
        assert!(matches!(b.to_binary(x, 254), Err(CompilationError::BitWidth { .. })));
        let bits = b.to_binary(x, 8).unwrap();
        assert_eq!(bits.len(), 8);
        assert_eq!(b.num_constraints(), 9);
    }

    #[test]
    #[should_panic(expected = "compilation session")]
    fn foreign_variables_panic() {
        let (_, x) = sealed_with_input();
        let (mut other, _) = sealed_with_input();
        other.mul(x, x);
    }
}
