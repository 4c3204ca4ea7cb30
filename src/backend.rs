use good_lp::solvers::coin_cbc::coin_cbc;
use good_lp::solvers::{SolutionStatus, WithTimeLimit};
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, variable,
    variables,
};
use std::time::Duration;
use tracing::trace;

use crate::error::SolverFailure;
use crate::model::{LinearConstraint, LinearExpr, Sense, VarId, VariableDef};
use crate::options::SolveOptions;

/// What a backend returns from a single blocking solve.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOutcome {
    /// Raw values, indexed by [`VarId`], in the order variables were added.
    Solved {
        proven_optimal: bool,
        values: Vec<f64>,
    },
    Infeasible {
        explanation: Option<String>,
    },
    Unbounded,
    Failed(SolverFailure),
}

/// The narrow capability an external MILP engine has to offer.
///
/// Variables are added in [`VarId`] order before any constraint that uses
/// them. All variables are binary and the objective is minimised.
pub trait MilpBackend {
    fn add_variable(&mut self, id: VarId, def: &VariableDef);

    fn add_linear_constraint(&mut self, constraint: &LinearConstraint);

    fn set_objective(&mut self, objective: &LinearExpr);

    fn solve(self, time_limit: Option<Duration>) -> BackendOutcome
    where
        Self: Sized;
}

/// COIN-OR CBC through `good_lp`.
pub struct CbcBackend {
    variables: ProblemVariables,
    handles: Vec<Variable>,
    constraints: Vec<good_lp::Constraint>,
    objective: Expression,
    threads: Option<u32>,
    log: bool,
}

impl CbcBackend {
    pub fn new(options: &SolveOptions) -> Self {
        Self {
            variables: variables!(),
            handles: Vec::new(),
            constraints: Vec::new(),
            objective: Expression::from(0.0),
            threads: options.threads,
            log: options.solver_log,
        }
    }

    fn to_expression(&self, expr: &LinearExpr) -> Expression {
        expr.terms
            .iter()
            .fold(Expression::from(expr.constant), |sum, &(var, coef)| {
                sum + self.handles[var.index()] * coef
            })
    }
}

impl MilpBackend for CbcBackend {
    fn add_variable(&mut self, id: VarId, def: &VariableDef) {
        debug_assert_eq!(id.index(), self.handles.len());
        let handle = self
            .variables
            .add(variable().binary().name(def.name.clone()));
        self.handles.push(handle);
    }

    fn add_linear_constraint(&mut self, c: &LinearConstraint) {
        let lhs = self.to_expression(&c.expr);
        let rhs = c.rhs;
        trace!(name = %c.name, sense = %c.sense, rhs, "adding row");
        let row = match c.sense {
            Sense::Le => lhs.leq(rhs),
            Sense::Eq => lhs.eq(rhs),
            Sense::Ge => lhs.geq(rhs),
        };
        self.constraints.push(row);
    }

    fn set_objective(&mut self, objective: &LinearExpr) {
        self.objective = self.to_expression(objective);
    }

    fn solve(self, time_limit: Option<Duration>) -> BackendOutcome {
        let mut model = self.variables.minimise(self.objective).using(coin_cbc);
        model.set_parameter("loglevel", if self.log { "1" } else { "0" });
        if let Some(threads) = self.threads {
            model.set_parameter("threads", &threads.to_string());
        }
        let model = match time_limit {
            Some(limit) => model.with_time_limit(limit.as_secs_f64()),
            None => model,
        };

        let model = self
            .constraints
            .into_iter()
            .fold(model, |m, row| m.with(row));

        match model.solve() {
            // A stopped search may hold no incumbent at all, so its values are not trusted.
            Ok(solution) => match solution.status() {
                SolutionStatus::Optimal => BackendOutcome::Solved {
                    proven_optimal: true,
                    values: self.handles.iter().map(|&v| solution.value(v)).collect(),
                },
                SolutionStatus::TimeLimit => BackendOutcome::Failed(SolverFailure::Timeout),
                _ => BackendOutcome::Solved {
                    proven_optimal: false,
                    values: self.handles.iter().map(|&v| solution.value(v)).collect(),
                },
            },
            Err(ResolutionError::Infeasible) => BackendOutcome::Infeasible { explanation: None },
            Err(ResolutionError::Unbounded) => BackendOutcome::Unbounded,
            Err(other) => BackendOutcome::Failed(SolverFailure::Engine(other.to_string())),
        }
    }
}
