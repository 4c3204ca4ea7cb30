use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::backend::{BackendOutcome, MilpBackend};
use crate::error::SolverFailure;
use crate::model::{LinearModel, VarId};
use crate::options::SolveOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unbounded,
    SolverError,
}

impl SolveStatus {
    /// Whether the status comes with a solution to extract.
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unbounded => "UNBOUNDED",
            SolveStatus::SolverError => "SOLVER_ERROR",
        })
    }
}

/// Solver values rounded to 0/1, one per model variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValues(Vec<bool>);

impl ResolvedValues {
    pub fn new(values: Vec<bool>) -> Self {
        Self(values)
    }

    pub fn get(&self, var: VarId) -> Option<bool> {
        self.0.get(var.index()).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Present exactly when `status.has_solution()`.
    pub values: Option<ResolvedValues>,
    pub failure: Option<SolverFailure>,
    pub explanation: Option<String>,
    pub elapsed: Duration,
}

impl SolveOutcome {
    fn failed(failure: SolverFailure, elapsed: Duration) -> Self {
        warn!(%failure, "solve failed");
        Self {
            status: SolveStatus::SolverError,
            values: None,
            failure: Some(failure),
            explanation: None,
            elapsed,
        }
    }
}

/// Shared flag a caller can set to abandon a solve.
///
/// The engine call itself is not interrupted; a cancelled solve reports
/// [`SolverFailure::Cancelled`] and its solution is discarded.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Replays variables, constraints and the objective of `model` into `backend`.
pub fn load_model<B: MilpBackend>(model: &LinearModel, backend: &mut B) {
    for (id, def) in model.iter_variables() {
        backend.add_variable(id, def);
    }
    for constraint in model.constraints() {
        backend.add_linear_constraint(constraint);
    }
    backend.set_objective(model.objective());
}

/// Submits `model` to `backend` and waits for the result.
pub fn solve<B: MilpBackend>(
    model: &LinearModel,
    mut backend: B,
    options: &SolveOptions,
    cancel: Option<&CancellationToken>,
) -> SolveOutcome {
    let cancelled = || cancel.is_some_and(CancellationToken::is_cancelled);
    if cancelled() {
        return SolveOutcome::failed(SolverFailure::Cancelled, Duration::ZERO);
    }

    load_model(model, &mut backend);
    info!(
        variables = model.num_variables(),
        constraints = model.constraints().len(),
        time_limit = ?options.time_limit(),
        "solving"
    );

    let started = Instant::now();
    let outcome = backend.solve(options.time_limit());
    let elapsed = started.elapsed();

    if cancelled() {
        return SolveOutcome::failed(SolverFailure::Cancelled, elapsed);
    }

    let result = match outcome {
        BackendOutcome::Solved {
            proven_optimal,
            values,
        } => match resolve_values(model, &values, options.integrality_tolerance) {
            Ok(resolved) => SolveOutcome {
                status: if proven_optimal {
                    SolveStatus::Optimal
                } else {
                    SolveStatus::Feasible
                },
                values: Some(resolved),
                failure: None,
                explanation: None,
                elapsed,
            },
            Err(failure) => return SolveOutcome::failed(failure, elapsed),
        },
        BackendOutcome::Infeasible { explanation } => SolveOutcome {
            status: SolveStatus::Infeasible,
            values: None,
            failure: None,
            explanation,
            elapsed,
        },
        BackendOutcome::Unbounded => SolveOutcome {
            status: SolveStatus::Unbounded,
            values: None,
            failure: None,
            explanation: None,
            elapsed,
        },
        BackendOutcome::Failed(failure) => return SolveOutcome::failed(failure, elapsed),
    };

    info!(status = %result.status, ?elapsed, "solve finished");
    result
}

fn resolve_values(
    model: &LinearModel,
    values: &[f64],
    tolerance: f64,
) -> Result<ResolvedValues, SolverFailure> {
    if values.len() != model.num_variables() {
        return Err(SolverFailure::Engine(format!(
            "solver returned {} values for {} variables",
            values.len(),
            model.num_variables()
        )));
    }
    model
        .iter_variables()
        .zip(values)
        .map(|((_, def), &value)| {
            if value.abs() <= tolerance {
                Ok(false)
            } else if (value - 1.0).abs() <= tolerance {
                Ok(true)
            } else {
                Err(SolverFailure::Numerical {
                    variable: def.name.clone(),
                    value,
                })
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(ResolvedValues::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstraintFamily, LinearConstraint, LinearExpr, Sense, VariableDef};

    /// Counts what it is given and answers with a canned outcome.
    struct ScriptedBackend {
        outcome: BackendOutcome,
        variables: usize,
        constraints: usize,
        objective_terms: usize,
        solved: Arc<AtomicBool>,
        time_limit: Arc<std::sync::Mutex<Option<Duration>>>,
    }

    impl ScriptedBackend {
        fn new(outcome: BackendOutcome) -> Self {
            Self {
                outcome,
                variables: 0,
                constraints: 0,
                objective_terms: 0,
                solved: Arc::new(AtomicBool::new(false)),
                time_limit: Arc::default(),
            }
        }
    }

    impl MilpBackend for ScriptedBackend {
        fn add_variable(&mut self, id: VarId, _def: &VariableDef) {
            assert_eq!(id.index(), self.variables);
            self.variables += 1;
        }

        fn add_linear_constraint(&mut self, _constraint: &LinearConstraint) {
            self.constraints += 1;
        }

        fn set_objective(&mut self, objective: &LinearExpr) {
            self.objective_terms = objective.terms.len();
        }

        fn solve(self, time_limit: Option<Duration>) -> BackendOutcome {
            assert_eq!(self.variables, 2);
            assert_eq!(self.constraints, 1);
            assert_eq!(self.objective_terms, 2);
            self.solved.store(true, Ordering::SeqCst);
            *self.time_limit.lock().unwrap() = time_limit;
            self.outcome
        }
    }

    fn two_variable_model() -> LinearModel {
        let mut model = LinearModel::new();
        let x = model.add_variable("x");
        let y = model.add_variable("y");
        model.add_constraint(LinearConstraint {
            name: "one".into(),
            family: ConstraintFamily::ExactlyOneAssignment,
            expr: [x, y].into_iter().collect(),
            sense: Sense::Eq,
            rhs: 1.0,
        });
        model.set_objective([x, y].into_iter().collect());
        model
    }

    fn run(outcome: BackendOutcome) -> SolveOutcome {
        solve(
            &two_variable_model(),
            ScriptedBackend::new(outcome),
            &SolveOptions::default(),
            None,
        )
    }

    #[test]
    fn rounds_near_integral_values() {
        let outcome = run(BackendOutcome::Solved {
            proven_optimal: true,
            values: vec![0.9999999, 2e-8],
        });
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(
            outcome.values,
            Some(ResolvedValues::new(vec![true, false]))
        );
    }

    #[test]
    fn fractional_value_is_a_solver_error() {
        let outcome = run(BackendOutcome::Solved {
            proven_optimal: true,
            values: vec![0.5, 0.5],
        });
        assert_eq!(outcome.status, SolveStatus::SolverError);
        assert!(outcome.values.is_none());
        assert_eq!(
            outcome.failure,
            Some(SolverFailure::Numerical {
                variable: "x".into(),
                value: 0.5
            })
        );
    }

    #[test]
    fn wrong_value_count_is_a_solver_error() {
        let outcome = run(BackendOutcome::Solved {
            proven_optimal: true,
            values: vec![1.0],
        });
        assert!(matches!(outcome.failure, Some(SolverFailure::Engine(_))));
    }

    #[test]
    fn unproven_solution_is_feasible() {
        let outcome = run(BackendOutcome::Solved {
            proven_optimal: false,
            values: vec![0.0, 1.0],
        });
        assert_eq!(outcome.status, SolveStatus::Feasible);
        assert!(outcome.status.has_solution());
    }

    #[test]
    fn infeasible_is_distinct_from_solver_error() {
        let infeasible = run(BackendOutcome::Infeasible {
            explanation: Some("rows 1 and 2".into()),
        });
        assert_eq!(infeasible.status, SolveStatus::Infeasible);
        assert_eq!(infeasible.failure, None);
        assert_eq!(infeasible.explanation.as_deref(), Some("rows 1 and 2"));

        let timeout = run(BackendOutcome::Failed(SolverFailure::Timeout));
        assert_eq!(timeout.status, SolveStatus::SolverError);
        assert_eq!(timeout.failure, Some(SolverFailure::Timeout));

        assert_eq!(run(BackendOutcome::Unbounded).status, SolveStatus::Unbounded);
    }

    #[test]
    fn passes_time_limit_to_backend() {
        let backend = ScriptedBackend::new(BackendOutcome::Unbounded);
        let seen = backend.time_limit.clone();
        let options = SolveOptions {
            time_limit_seconds: Some(1.5),
            ..SolveOptions::default()
        };
        solve(&two_variable_model(), backend, &options, None);
        assert_eq!(*seen.lock().unwrap(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn cancelled_before_solve_never_reaches_backend() {
        let token = CancellationToken::new();
        token.cancel();
        let backend = ScriptedBackend::new(BackendOutcome::Unbounded);
        let solved = backend.solved.clone();

        let outcome = solve(
            &two_variable_model(),
            backend,
            &SolveOptions::default(),
            Some(&token),
        );
        assert_eq!(outcome.status, SolveStatus::SolverError);
        assert_eq!(outcome.failure, Some(SolverFailure::Cancelled));
        assert!(!solved.load(Ordering::SeqCst));
    }

    #[test]
    fn status_strings() {
        assert_eq!(SolveStatus::SolverError.to_string(), "SOLVER_ERROR");
        assert_eq!(
            serde_yaml::to_string(&SolveStatus::Optimal).unwrap().trim(),
            "OPTIMAL"
        );
    }
}
