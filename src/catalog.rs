use std::collections::BTreeSet;

use crate::error::ModelConstructionError;
use crate::grid::TimeGrid;

/// A flight to be flown by exactly one aircraft.
#[derive(Debug, Clone, PartialEq)]
pub struct Flight {
    pub id: String,
    /// Duration in whole slots.
    pub duration: usize,
    /// Cost of flying this flight with each aircraft, indexed like the catalog's aircraft.
    pub costs: Vec<f64>,
}

impl Flight {
    pub fn new(id: impl Into<String>, duration: usize, costs: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            duration,
            costs,
        }
    }

    /// Builds a flight from a duration in hours, rounded up to whole slots of `grid`.
    pub fn from_hours(
        id: impl Into<String>,
        hours: f64,
        costs: Vec<f64>,
        grid: &TimeGrid,
    ) -> Result<Self, ModelConstructionError> {
        let id = id.into();
        match grid.slots_for_hours(hours) {
            Some(duration) => Ok(Self::new(id, duration, costs)),
            None => Err(ModelConstructionError::InvalidDuration { flight: id, hours }),
        }
    }

    pub fn cost(&self, aircraft: usize) -> f64 {
        self.costs[aircraft]
    }
}

/// How an aircraft's maintenance is specified.
#[derive(Debug, Clone, PartialEq)]
pub enum Maintenance {
    /// Maintenance is input data: `true` marks a slot the aircraft is grounded.
    FixedSchedule(Vec<bool>),
    /// Maintenance is decided by the model, with at least (or exactly) this many slots.
    QuotaBased(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceMode {
    Fixed,
    Quota,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aircraft {
    pub id: String,
    pub maintenance: Maintenance,
}

impl Aircraft {
    pub fn fixed(id: impl Into<String>, schedule: Vec<bool>) -> Self {
        Self {
            id: id.into(),
            maintenance: Maintenance::FixedSchedule(schedule),
        }
    }

    pub fn quota(id: impl Into<String>, quota: u32) -> Self {
        Self {
            id: id.into(),
            maintenance: Maintenance::QuotaBased(quota),
        }
    }

    pub fn mode(&self) -> MaintenanceMode {
        match self.maintenance {
            Maintenance::FixedSchedule(_) => MaintenanceMode::Fixed,
            Maintenance::QuotaBased(_) => MaintenanceMode::Quota,
        }
    }
}

/// Validated flights and aircraft over a shared time grid.
///
/// Immutable once built; every invariant the model builder relies on is
/// checked here.
#[derive(Debug, Clone)]
pub struct Catalog {
    grid: TimeGrid,
    flights: Vec<Flight>,
    aircraft: Vec<Aircraft>,
    maintenance_capacity: u32,
    mode: MaintenanceMode,
}

impl Catalog {
    pub fn new(
        grid: TimeGrid,
        flights: Vec<Flight>,
        aircraft: Vec<Aircraft>,
        maintenance_capacity: u32,
    ) -> Result<Self, ModelConstructionError> {
        let horizon = grid.len();

        let mut seen = BTreeSet::new();
        for a in &aircraft {
            if !seen.insert(a.id.as_str()) {
                return Err(ModelConstructionError::DuplicateAircraft(a.id.clone()));
            }
        }

        let mode = aircraft
            .first()
            .map(Aircraft::mode)
            .unwrap_or(MaintenanceMode::Fixed);
        if aircraft.iter().any(|a| a.mode() != mode) {
            return Err(ModelConstructionError::MixedMaintenanceModes);
        }

        for a in &aircraft {
            match &a.maintenance {
                Maintenance::FixedSchedule(schedule) if schedule.len() != horizon => {
                    return Err(ModelConstructionError::MaintenanceLength {
                        aircraft: a.id.clone(),
                        len: schedule.len(),
                        horizon,
                    });
                }
                Maintenance::QuotaBased(quota) if *quota as usize > horizon => {
                    return Err(ModelConstructionError::QuotaExceedsHorizon {
                        aircraft: a.id.clone(),
                        quota: *quota,
                        horizon,
                    });
                }
                _ => {}
            }
        }

        if !flights.is_empty() && aircraft.is_empty() {
            return Err(ModelConstructionError::NoAircraft(flights.len()));
        }

        let mut seen = BTreeSet::new();
        for f in &flights {
            if !seen.insert(f.id.as_str()) {
                return Err(ModelConstructionError::DuplicateFlight(f.id.clone()));
            }
            validate_flight(f, &aircraft, horizon)?;
        }

        Ok(Self {
            grid,
            flights,
            aircraft,
            maintenance_capacity,
            mode,
        })
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn horizon(&self) -> usize {
        self.grid.len()
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    pub fn aircraft(&self) -> &[Aircraft] {
        &self.aircraft
    }

    pub fn maintenance_capacity(&self) -> u32 {
        self.maintenance_capacity
    }

    pub fn mode(&self) -> MaintenanceMode {
        self.mode
    }

    /// Input maintenance flag of aircraft `a` at slot `t`, in fixed mode.
    pub fn fixed_maintenance(&self, a: usize, t: usize) -> Option<bool> {
        match &self.aircraft[a].maintenance {
            Maintenance::FixedSchedule(schedule) => Some(schedule[t]),
            Maintenance::QuotaBased(_) => None,
        }
    }

    /// Maintenance quota of aircraft `a`, in quota mode.
    pub fn quota(&self, a: usize) -> Option<u32> {
        match self.aircraft[a].maintenance {
            Maintenance::FixedSchedule(_) => None,
            Maintenance::QuotaBased(quota) => Some(quota),
        }
    }

    /// Number of aircraft grounded at slot `t` by the input, in fixed mode.
    pub fn fixed_maintenance_count(&self, t: usize) -> usize {
        (0..self.aircraft.len())
            .filter(|&a| self.fixed_maintenance(a, t) == Some(true))
            .count()
    }
}

fn validate_flight(
    flight: &Flight,
    aircraft: &[Aircraft],
    horizon: usize,
) -> Result<(), ModelConstructionError> {
    if flight.duration == 0 {
        return Err(ModelConstructionError::InvalidDuration {
            flight: flight.id.clone(),
            hours: 0.0,
        });
    }
    if flight.duration > horizon {
        return Err(ModelConstructionError::FlightExceedsHorizon {
            flight: flight.id.clone(),
            duration: flight.duration,
            horizon,
        });
    }
    if flight.costs.len() > aircraft.len() {
        return Err(ModelConstructionError::UnknownAircraftIndex {
            flight: flight.id.clone(),
            index: aircraft.len(),
            aircraft: aircraft.len(),
        });
    }
    if let Some(missing) = aircraft.get(flight.costs.len()) {
        return Err(ModelConstructionError::MissingCost {
            flight: flight.id.clone(),
            aircraft: missing.id.clone(),
        });
    }
    for (a, &cost) in flight.costs.iter().enumerate() {
        if !cost.is_finite() || cost <= 0.0 {
            return Err(ModelConstructionError::InvalidCost {
                flight: flight.id.clone(),
                aircraft: aircraft[a].id.clone(),
                cost,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(slots: usize) -> TimeGrid {
        TimeGrid::new(slots).unwrap()
    }

    fn fixed(id: &str, flags: &[u8]) -> Aircraft {
        Aircraft::fixed(id, flags.iter().map(|&f| f == 1).collect())
    }

    #[test]
    fn accepts_well_formed_fixed_catalog() {
        let catalog = Catalog::new(
            grid(4),
            vec![Flight::new("F1", 2, vec![1.0, 2.0])],
            vec![fixed("A", &[0, 0, 1, 0]), fixed("B", &[1, 0, 1, 0])],
            2,
        )
        .unwrap();
        assert_eq!(catalog.mode(), MaintenanceMode::Fixed);
        assert_eq!(catalog.fixed_maintenance(0, 2), Some(true));
        assert_eq!(catalog.fixed_maintenance_count(2), 2);
        assert_eq!(catalog.fixed_maintenance_count(1), 0);
        assert_eq!(catalog.quota(0), None);
    }

    #[test]
    fn rejects_flight_longer_than_horizon() {
        let err = Catalog::new(
            grid(3),
            vec![Flight::new("F1", 4, vec![1.0])],
            vec![Aircraft::quota("A", 1)],
            1,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelConstructionError::FlightExceedsHorizon {
                flight: "F1".into(),
                duration: 4,
                horizon: 3
            }
        );
    }

    #[test]
    fn rejects_cost_for_aircraft_outside_catalog() {
        let err = Catalog::new(
            grid(3),
            vec![Flight::new("F1", 1, vec![1.0, 2.0])],
            vec![Aircraft::quota("A", 1)],
            1,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ModelConstructionError::UnknownAircraftIndex { index: 1, .. }
        ));
    }

    #[test]
    fn rejects_missing_cost() {
        let err = Catalog::new(
            grid(3),
            vec![Flight::new("F1", 1, vec![1.0])],
            vec![Aircraft::quota("A", 1), Aircraft::quota("B", 1)],
            1,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelConstructionError::MissingCost {
                flight: "F1".into(),
                aircraft: "B".into()
            }
        );
    }

    #[test]
    fn rejects_wrong_maintenance_length() {
        let err = Catalog::new(grid(4), vec![], vec![fixed("A", &[0, 1, 0])], 1).unwrap_err();
        assert!(matches!(
            err,
            ModelConstructionError::MaintenanceLength { len: 3, horizon: 4, .. }
        ));
    }

    #[test]
    fn rejects_mixed_modes() {
        let err = Catalog::new(
            grid(2),
            vec![],
            vec![fixed("A", &[0, 0]), Aircraft::quota("B", 1)],
            1,
        )
        .unwrap_err();
        assert_eq!(err, ModelConstructionError::MixedMaintenanceModes);
    }

    #[test]
    fn rejects_duplicates_and_bad_costs() {
        let dup = Catalog::new(
            grid(2),
            vec![],
            vec![Aircraft::quota("A", 1), Aircraft::quota("A", 1)],
            1,
        );
        assert_eq!(
            dup.unwrap_err(),
            ModelConstructionError::DuplicateAircraft("A".into())
        );

        let bad_cost = Catalog::new(
            grid(2),
            vec![Flight::new("F1", 1, vec![-3.0])],
            vec![Aircraft::quota("A", 1)],
            1,
        );
        assert!(matches!(
            bad_cost.unwrap_err(),
            ModelConstructionError::InvalidCost { .. }
        ));

        let quota = Catalog::new(grid(2), vec![], vec![Aircraft::quota("A", 3)], 1);
        assert!(matches!(
            quota.unwrap_err(),
            ModelConstructionError::QuotaExceedsHorizon { quota: 3, .. }
        ));
    }

    #[test]
    fn rejects_flights_without_aircraft() {
        let err = Catalog::new(grid(2), vec![Flight::new("F1", 1, vec![])], vec![], 1);
        assert_eq!(err.unwrap_err(), ModelConstructionError::NoAircraft(1));
    }

    #[test]
    fn from_hours_rounds_up() {
        let g = grid(8);
        let flight = Flight::from_hours("F", 2.5, vec![1.0], &g).unwrap();
        assert_eq!(flight.duration, 3);
        assert!(Flight::from_hours("F", -1.0, vec![1.0], &g).is_err());
    }
}
