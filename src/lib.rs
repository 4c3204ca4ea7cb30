//! Assign flights to aircraft over a discrete time horizon, around aircraft
//! maintenance, at minimum total cost.
//!
//! The problem is written as a binary program: `x[f,a,t]` starts flight `f`
//! on aircraft `a` at slot `t` and `m[a,t]` grounds aircraft `a` at slot `t`.
//! Maintenance is either fixed input or decided by the model under a
//! per-aircraft quota and a per-slot capacity. The program is handed to an
//! external MILP engine (CBC by default) and the answer is read back into a
//! [`Schedule`].

pub mod backend;
pub mod builder;
pub mod catalog;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod grid;
pub mod model;
pub mod objective;
pub mod options;
pub mod orchestrator;
pub mod report;
pub mod types;

#[cfg(test)]
mod tests;

pub use backend::{BackendOutcome, CbcBackend, MilpBackend};
pub use builder::{FleetModel, ModelBuilder};
pub use catalog::{Aircraft, Catalog, Flight, Maintenance, MaintenanceMode};
pub use error::{Error, ExtractionError, ModelConstructionError, Result, SolverFailure};
pub use extract::{MaintenanceTable, Schedule, ScheduledFlight, extract};
pub use grid::TimeGrid;
pub use options::{ModelOptions, Options, OverCapacityPolicy, QuotaComparison, SolveOptions};
pub use orchestrator::{CancellationToken, SolveOutcome, SolveStatus};
pub use report::{AssignmentRecord, Report};
pub use types::{AircraftEntry, Costs, FlightEntry, Problem};

use tracing::info_span;

impl Problem {
    /// Builds, solves with CBC and extracts, in one go.
    pub fn solve(&self) -> Result<Report> {
        self.solve_with(None)
    }

    pub fn solve_with(&self, cancel: Option<&CancellationToken>) -> Result<Report> {
        let catalog = self.catalog()?;
        let backend = CbcBackend::new(&self.options.solve);
        solve_catalog(&catalog, &self.options, backend, cancel)
    }
}

/// Runs the full pipeline for an already validated catalog on any backend.
///
/// Construction and extraction failures are errors; infeasible, unbounded and
/// failed solves are reported through [`Report::status`].
pub fn solve_catalog<B: MilpBackend>(
    catalog: &Catalog,
    options: &Options,
    backend: B,
    cancel: Option<&CancellationToken>,
) -> Result<Report> {
    let _span = info_span!(
        "solve_catalog",
        flights = catalog.flights().len(),
        aircraft = catalog.aircraft().len(),
        slots = catalog.horizon(),
        slot_hours = catalog.grid().slot_hours()
    )
    .entered();

    // Create all variables and constraints
    let model = ModelBuilder::new(catalog)
        .with_options(options.model)
        .build()?;

    // Solve
    let outcome = orchestrator::solve(model.linear(), backend, &options.solve, cancel);

    // Convert the solver's answer into flight assignments
    let schedule = extract(&model, &outcome)?;

    Ok(Report::new(&model, &outcome, schedule.as_ref()))
}
