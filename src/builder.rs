use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::catalog::{Catalog, MaintenanceMode};
use crate::diagnostics;
use crate::error::ModelConstructionError;
use crate::model::{ConstraintFamily, LinearConstraint, LinearExpr, LinearModel, Sense, VarId};
use crate::objective;
use crate::options::{ModelOptions, OverCapacityPolicy, QuotaComparison};

/// `x[f,a,t]`: flight `f` starts on aircraft `a` at slot `t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentVar {
    pub flight: usize,
    pub aircraft: usize,
    pub start: usize,
    pub var: VarId,
}

type AssignmentIndex = BTreeMap<(usize, usize, usize), VarId>;

/// The assembled model together with the lookup tables needed to read a solution back.
#[derive(Debug, Clone)]
pub struct FleetModel<'a> {
    catalog: &'a Catalog,
    options: ModelOptions,
    linear: LinearModel,
    assignments: Vec<AssignmentVar>,
    index: AssignmentIndex,
    maintenance: Vec<Vec<VarId>>,
    diagnostics: Vec<String>,
}

impl<'a> FleetModel<'a> {
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn options(&self) -> ModelOptions {
        self.options
    }

    pub fn linear(&self) -> &LinearModel {
        &self.linear
    }

    /// Every assignment variable, ordered by flight, then aircraft, then start slot.
    pub fn assignments(&self) -> &[AssignmentVar] {
        &self.assignments
    }

    pub fn assignments_of(&self, flight: usize) -> impl Iterator<Item = &AssignmentVar> + '_ {
        self.assignments.iter().filter(move |x| x.flight == flight)
    }

    /// `None` when flight `f` cannot start at `t` without running past the horizon.
    pub fn assignment_var(&self, flight: usize, aircraft: usize, start: usize) -> Option<VarId> {
        self.index.get(&(flight, aircraft, start)).copied()
    }

    pub fn maintenance_var(&self, aircraft: usize, slot: usize) -> VarId {
        self.maintenance[aircraft][slot]
    }

    /// Warnings recorded while building, e.g. over-capacity input slots.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }
}

/// Allocates the decision variables and emits every constraint family for a catalog.
pub struct ModelBuilder<'a> {
    catalog: &'a Catalog,
    options: ModelOptions,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            options: ModelOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<FleetModel<'a>, ModelConstructionError> {
        let catalog = self.catalog;
        let diagnostics = self.check_capacity()?;

        let mut linear = LinearModel::new();
        let (assignments, index) = init_assignment_variables(&mut linear, catalog);
        let maintenance = init_maintenance_variables(&mut linear, catalog);

        linear.set_objective(objective::build_objective(catalog, &assignments));

        linear.extend_constraints(constrain_exactly_one_assignment(catalog, &assignments));
        linear.extend_constraints(constrain_occupancy(catalog, &index, &maintenance));
        if catalog.mode() == MaintenanceMode::Fixed {
            linear.extend_constraints(constrain_maintenance_pins(catalog, &maintenance));
        }
        linear.extend_constraints(constrain_maintenance_capacity(catalog, &maintenance));
        if catalog.mode() == MaintenanceMode::Quota {
            linear.extend_constraints(constrain_maintenance_quotas(
                catalog,
                &maintenance,
                self.options.quota_comparison,
            ));
        }

        debug!(
            variables = linear.num_variables(),
            assignment_variables = assignments.len(),
            constraints = linear.constraints().len(),
            families = ?linear.family_counts(),
            "built fleet model"
        );

        Ok(FleetModel {
            catalog,
            options: self.options,
            linear,
            assignments,
            index,
            maintenance,
            diagnostics,
        })
    }

    fn check_capacity(&self) -> Result<Vec<String>, ModelConstructionError> {
        let overloads = diagnostics::capacity_overloads(self.catalog);
        match (overloads.first(), self.options.over_capacity) {
            (None, _) => Ok(Vec::new()),
            (Some(first), OverCapacityPolicy::Reject) => {
                Err(ModelConstructionError::MaintenanceOverCapacity {
                    slot: first.slot,
                    count: first.count,
                    capacity: first.capacity,
                })
            }
            (Some(_), OverCapacityPolicy::MarkInfeasible) => Ok(overloads
                .iter()
                .map(|o| {
                    warn!(slot = o.slot, count = o.count, capacity = o.capacity, "maintenance over capacity");
                    o.to_string()
                })
                .collect()),
        }
    }
}

/// Creates `x[f,a,t]` only for starts that finish inside the horizon.
fn init_assignment_variables(
    linear: &mut LinearModel,
    catalog: &Catalog,
) -> (Vec<AssignmentVar>, AssignmentIndex) {
    let grid = catalog.grid();
    let mut assignments = Vec::new();
    let mut index = BTreeMap::new();

    for (f, flight) in catalog.flights().iter().enumerate() {
        let Some(last_start) = grid.last_start(flight.duration) else {
            continue;
        };
        for a in 0..catalog.aircraft().len() {
            for start in 0..=last_start {
                let var = linear.add_variable(format!("x_{f}_{a}_{start}"));
                assignments.push(AssignmentVar {
                    flight: f,
                    aircraft: a,
                    start,
                    var,
                });
                index.insert((f, a, start), var);
            }
        }
    }

    (assignments, index)
}

/// Creates `m[a,t]` for every aircraft and slot, in both maintenance modes.
fn init_maintenance_variables(linear: &mut LinearModel, catalog: &Catalog) -> Vec<Vec<VarId>> {
    (0..catalog.aircraft().len())
        .map(|a| {
            catalog
                .grid()
                .slots()
                .map(|t| linear.add_variable(format!("m_{a}_{t}")))
                .collect()
        })
        .collect()
}

/// Every flight starts exactly once, on one aircraft.
fn constrain_exactly_one_assignment(
    catalog: &Catalog,
    assignments: &[AssignmentVar],
) -> Vec<LinearConstraint> {
    let mut per_flight = vec![LinearExpr::new(); catalog.flights().len()];
    for x in assignments {
        per_flight[x.flight].add_term(x.var, 1.0);
    }
    per_flight
        .into_iter()
        .enumerate()
        .map(|(f, expr)| LinearConstraint {
            name: format!("assign_{f}"),
            family: ConstraintFamily::ExactlyOneAssignment,
            expr,
            sense: Sense::Eq,
            rhs: 1.0,
        })
        .collect()
}

/// Windowed occupancy rows, one pair per aircraft and slot.
///
/// A flight of duration `d` occupies slot `t` iff it started in
/// `[max(0, t - d + 1), min(t + 1, T))`, so summing those start variables over
/// all flights gives the number of flights on the aircraft at `t`. That sum is
/// bounded by 1, and by `1 - m[a,t]` so nothing flies during maintenance.
/// Aircraft are independent, so rows are generated in parallel and collected
/// in aircraft order.
fn constrain_occupancy(
    catalog: &Catalog,
    index: &AssignmentIndex,
    maintenance: &[Vec<VarId>],
) -> Vec<LinearConstraint> {
    (0..catalog.aircraft().len())
        .into_par_iter()
        .flat_map_iter(|a| {
            catalog
                .grid()
                .slots()
                .flat_map(move |t| occupancy_rows(catalog, index, maintenance, a, t))
        })
        .collect()
}

fn occupancy_rows(
    catalog: &Catalog,
    index: &AssignmentIndex,
    maintenance: &[Vec<VarId>],
    a: usize,
    t: usize,
) -> Vec<LinearConstraint> {
    let grid = catalog.grid();
    let occupied: LinearExpr = catalog
        .flights()
        .iter()
        .enumerate()
        .flat_map(|(f, flight)| {
            grid.occupancy_window(t, flight.duration)
                .filter_map(move |start| index.get(&(f, a, start)).copied())
        })
        .collect();

    // No flight can cover this slot; both rows would be trivially satisfied.
    if occupied.is_empty() {
        return Vec::new();
    }

    let grounded = occupied.clone().with_term(maintenance[a][t], 1.0);
    vec![
        LinearConstraint {
            name: format!("occupancy_{a}_{t}"),
            family: ConstraintFamily::Occupancy,
            expr: occupied,
            sense: Sense::Le,
            rhs: 1.0,
        },
        LinearConstraint {
            name: format!("grounded_{a}_{t}"),
            family: ConstraintFamily::MaintenanceExclusion,
            expr: grounded,
            sense: Sense::Le,
            rhs: 1.0,
        },
    ]
}

/// Fixed mode: `m[a,t]` equals the input schedule.
fn constrain_maintenance_pins(catalog: &Catalog, maintenance: &[Vec<VarId>]) -> Vec<LinearConstraint> {
    maintenance
        .iter()
        .enumerate()
        .flat_map(|(a, row)| {
            row.iter().enumerate().map(move |(t, &m)| {
                let flag = catalog.fixed_maintenance(a, t).unwrap_or(false);
                LinearConstraint {
                    name: format!("pin_{a}_{t}"),
                    family: ConstraintFamily::MaintenancePin,
                    expr: LinearExpr::new().with_term(m, 1.0),
                    sense: Sense::Eq,
                    rhs: if flag { 1.0 } else { 0.0 },
                }
            })
        })
        .collect()
}

/// At most `maintenance_capacity` aircraft in maintenance per slot.
fn constrain_maintenance_capacity(
    catalog: &Catalog,
    maintenance: &[Vec<VarId>],
) -> Vec<LinearConstraint> {
    let capacity = catalog.maintenance_capacity() as f64;
    catalog
        .grid()
        .slots()
        .map(|t| LinearConstraint {
            name: format!("capacity_{t}"),
            family: ConstraintFamily::MaintenanceCapacity,
            expr: maintenance.iter().map(|row| row[t]).collect(),
            sense: Sense::Le,
            rhs: capacity,
        })
        .collect()
}

/// Quota mode: each aircraft spends exactly (or at least) its quota in maintenance.
fn constrain_maintenance_quotas(
    catalog: &Catalog,
    maintenance: &[Vec<VarId>],
    comparison: QuotaComparison,
) -> Vec<LinearConstraint> {
    let sense = match comparison {
        QuotaComparison::Exact => Sense::Eq,
        QuotaComparison::AtLeast => Sense::Ge,
    };
    maintenance
        .iter()
        .enumerate()
        .map(|(a, row)| LinearConstraint {
            name: format!("quota_{a}"),
            family: ConstraintFamily::MaintenanceQuota,
            expr: row.iter().copied().collect(),
            sense,
            rhs: catalog.quota(a).unwrap_or(0) as f64,
        })
        .collect()
}
