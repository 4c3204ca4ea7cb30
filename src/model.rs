//! Solver-agnostic linear model.
//!
//! The builder writes binary variables and named linear constraints here; the
//! orchestrator replays them into whichever [`crate::backend::MilpBackend`] is
//! in use. Keeping the model as plain data lets constraint families be
//! generated in parallel and checked without a solver.

use std::collections::BTreeMap;
use std::fmt;

const FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// Index of a variable in a [`LinearModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A binary decision variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    pub name: String,
}

/// `Σ coef·var + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    pub fn with_term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |sum, &(var, coef)| sum + coef * values[var.index()])
    }
}

impl FromIterator<VarId> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = VarId>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Eq,
    Ge,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sense::Le => "<=",
            Sense::Eq => "==",
            Sense::Ge => ">=",
        })
    }
}

/// The constraint families the builder emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstraintFamily {
    ExactlyOneAssignment,
    Occupancy,
    MaintenanceExclusion,
    MaintenancePin,
    MaintenanceCapacity,
    MaintenanceQuota,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub name: String,
    pub family: ConstraintFamily,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn is_satisfied_by(&self, values: &[f64]) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + FEASIBILITY_TOLERANCE,
            Sense::Eq => (lhs - self.rhs).abs() <= FEASIBILITY_TOLERANCE,
            Sense::Ge => lhs >= self.rhs - FEASIBILITY_TOLERANCE,
        }
    }
}

/// Binary variables, constraints and a minimisation objective.
#[derive(Debug, Clone, Default)]
pub struct LinearModel {
    variables: Vec<VariableDef>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
}

impl LinearModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, name: impl Into<String>) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(VariableDef { name: name.into() });
        id
    }

    pub fn add_constraint(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    pub fn extend_constraints(&mut self, constraints: impl IntoIterator<Item = LinearConstraint>) {
        self.constraints.extend(constraints);
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn iter_variables(&self) -> impl Iterator<Item = (VarId, &VariableDef)> + '_ {
        self.variables.iter().enumerate().map(|(i, def)| (VarId(i), def))
    }

    pub fn variable(&self, id: VarId) -> &VariableDef {
        &self.variables[id.index()]
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn constraints_in(
        &self,
        family: ConstraintFamily,
    ) -> impl Iterator<Item = &LinearConstraint> + '_ {
        self.constraints.iter().filter(move |c| c.family == family)
    }

    pub fn family_counts(&self) -> BTreeMap<ConstraintFamily, usize> {
        self.constraints.iter().fold(BTreeMap::new(), |mut counts, c| {
            *counts.entry(c.family).or_insert(0) += 1;
            counts
        })
    }

    /// Constraints violated by a full assignment of `values` (indexed by [`VarId`]).
    pub fn violated_by<'a>(&'a self, values: &'a [f64]) -> Vec<&'a LinearConstraint> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied_by(values))
            .collect()
    }
}
