use std::collections::BTreeMap;

use crate::builder::{AssignmentVar, FleetModel};
use crate::catalog::{Catalog, MaintenanceMode};
use crate::error::ExtractionError;
use crate::options::{ModelOptions, QuotaComparison};
use crate::orchestrator::{ResolvedValues, SolveOutcome};

/// One flight placed on one aircraft over `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledFlight {
    pub flight: usize,
    pub aircraft: usize,
    pub start: usize,
    pub end: usize,
}

/// Which aircraft is in maintenance at which slot, as decided by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceTable {
    rows: Vec<Vec<bool>>,
}

impl MaintenanceTable {
    pub fn new(rows: Vec<Vec<bool>>) -> Self {
        Self { rows }
    }

    pub fn is_grounded(&self, aircraft: usize, slot: usize) -> bool {
        self.rows[aircraft][slot]
    }

    /// Slots in which `aircraft` is in maintenance, ascending.
    pub fn slots_of(&self, aircraft: usize) -> Vec<usize> {
        self.rows[aircraft]
            .iter()
            .enumerate()
            .filter_map(|(t, &grounded)| grounded.then_some(t))
            .collect()
    }

    pub fn grounded_at(&self, slot: usize) -> usize {
        self.rows.iter().filter(|row| row[slot]).count()
    }
}

/// The extracted schedule: one entry per flight, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub assignments: Vec<ScheduledFlight>,
    pub total_cost: f64,
    /// Only in quota mode; in fixed mode maintenance is the input.
    pub maintenance: Option<MaintenanceTable>,
}

impl Schedule {
    pub fn assignment_of(&self, flight: usize) -> &ScheduledFlight {
        &self.assignments[flight]
    }

    /// Maintenance slots per aircraft id, quota mode only.
    pub fn maintenance_slots(&self, catalog: &Catalog) -> Option<BTreeMap<String, Vec<usize>>> {
        self.maintenance.as_ref().map(|table| {
            catalog
                .aircraft()
                .iter()
                .enumerate()
                .map(|(a, aircraft)| (aircraft.id.clone(), table.slots_of(a)))
                .collect()
        })
    }

    fn grounded(&self, catalog: &Catalog, aircraft: usize, slot: usize) -> bool {
        match (catalog.fixed_maintenance(aircraft, slot), &self.maintenance) {
            (Some(flag), _) => flag,
            (None, Some(table)) => table.is_grounded(aircraft, slot),
            (None, None) => false,
        }
    }

    /// Checks every schedule invariant against the catalog.
    pub fn verify(&self, catalog: &Catalog, options: &ModelOptions) -> Result<(), ExtractionError> {
        let horizon = catalog.horizon();
        let flights = catalog.flights();
        let aircraft = catalog.aircraft();
        let mut occupant: Vec<Vec<Option<usize>>> = vec![vec![None; horizon]; aircraft.len()];

        for s in &self.assignments {
            let flight = &flights[s.flight];
            if s.start + flight.duration > horizon {
                return Err(ExtractionError::PastHorizon {
                    flight: flight.id.clone(),
                    start: s.start,
                    horizon,
                });
            }
            for t in s.start..s.end {
                if let Some(other) = occupant[s.aircraft][t].replace(s.flight) {
                    return Err(ExtractionError::DoubleBooked {
                        aircraft: aircraft[s.aircraft].id.clone(),
                        slot: t,
                        first: flights[other].id.clone(),
                        second: flight.id.clone(),
                    });
                }
                if self.grounded(catalog, s.aircraft, t) {
                    return Err(ExtractionError::FlightDuringMaintenance {
                        flight: flight.id.clone(),
                        aircraft: aircraft[s.aircraft].id.clone(),
                        slot: t,
                    });
                }
            }
        }

        let capacity = catalog.maintenance_capacity();
        for t in catalog.grid().slots() {
            let count = (0..aircraft.len())
                .filter(|&a| self.grounded(catalog, a, t))
                .count();
            if count > capacity as usize {
                return Err(ExtractionError::CapacityExceeded {
                    slot: t,
                    count,
                    capacity,
                });
            }
        }

        if let Some(table) = &self.maintenance {
            for (a, craft) in aircraft.iter().enumerate() {
                let Some(quota) = catalog.quota(a) else {
                    continue;
                };
                let actual = table.slots_of(a).len();
                let ok = match options.quota_comparison {
                    QuotaComparison::Exact => actual == quota as usize,
                    QuotaComparison::AtLeast => actual >= quota as usize,
                };
                if !ok {
                    return Err(ExtractionError::QuotaViolated {
                        aircraft: craft.id.clone(),
                        actual,
                        quota,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Turns a solve outcome into a schedule.
///
/// Returns `Ok(None)` when the status carries no solution. A declared
/// solution that does not assign every flight exactly once, or that breaks any
/// schedule invariant, is an [`ExtractionError`].
pub fn extract(model: &FleetModel, outcome: &SolveOutcome) -> Result<Option<Schedule>, ExtractionError> {
    if !outcome.status.has_solution() {
        return Ok(None);
    }
    let values = outcome
        .values
        .as_ref()
        .ok_or_else(|| ExtractionError::MissingValue("*".into()))?;

    let catalog = model.catalog();
    let mut assignments = Vec::with_capacity(catalog.flights().len());
    for (f, flight) in catalog.flights().iter().enumerate() {
        let chosen = selected(model, values, f)?;
        match chosen.as_slice() {
            [] => return Err(ExtractionError::Unassigned(flight.id.clone())),
            [x] => assignments.push(ScheduledFlight {
                flight: f,
                aircraft: x.aircraft,
                start: x.start,
                end: x.start + flight.duration,
            }),
            many => {
                return Err(ExtractionError::MultiplyAssigned {
                    flight: flight.id.clone(),
                    count: many.len(),
                });
            }
        }
    }

    let maintenance = match catalog.mode() {
        MaintenanceMode::Quota => Some(read_maintenance(model, values)?),
        MaintenanceMode::Fixed => None,
    };

    let total_cost = assignments
        .iter()
        .map(|s| catalog.flights()[s.flight].cost(s.aircraft))
        .sum();

    let schedule = Schedule {
        assignments,
        total_cost,
        maintenance,
    };
    schedule.verify(catalog, &model.options())?;
    Ok(Some(schedule))
}

fn selected<'m>(
    model: &'m FleetModel,
    values: &ResolvedValues,
    flight: usize,
) -> Result<Vec<&'m AssignmentVar>, ExtractionError> {
    let mut chosen = Vec::new();
    for x in model.assignments_of(flight) {
        match values.get(x.var) {
            Some(true) => chosen.push(x),
            Some(false) => {}
            None => {
                return Err(ExtractionError::MissingValue(
                    model.linear().variable(x.var).name.clone(),
                ));
            }
        }
    }
    Ok(chosen)
}

fn read_maintenance(model: &FleetModel, values: &ResolvedValues) -> Result<MaintenanceTable, ExtractionError> {
    let catalog = model.catalog();
    let rows = (0..catalog.aircraft().len())
        .map(|a| {
            catalog
                .grid()
                .slots()
                .map(|t| {
                    let var = model.maintenance_var(a, t);
                    values.get(var).ok_or_else(|| {
                        ExtractionError::MissingValue(model.linear().variable(var).name.clone())
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MaintenanceTable::new(rows))
}
