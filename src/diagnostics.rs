//! Cheap, catalog-level checks that explain why a model cannot be satisfied.
//!
//! CBC does not report an irreducible infeasible subset, so when a solve comes
//! back infeasible these checks are used to name the obvious causes.

use std::fmt;

use crate::catalog::{Catalog, Maintenance, MaintenanceMode};

/// A fixed-schedule slot that grounds more aircraft than the capacity allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotOverload {
    pub slot: usize,
    pub count: usize,
    pub capacity: u32,
}

impl fmt::Display for SlotOverload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "slot {} has {} aircraft in maintenance, exceeding the capacity of {}",
            self.slot, self.count, self.capacity
        )
    }
}

/// Slots whose input maintenance already exceeds capacity. Always empty in quota mode.
pub fn capacity_overloads(catalog: &Catalog) -> Vec<SlotOverload> {
    if catalog.mode() != MaintenanceMode::Fixed {
        return Vec::new();
    }
    let capacity = catalog.maintenance_capacity();
    catalog
        .grid()
        .slots()
        .map(|slot| SlotOverload {
            slot,
            count: catalog.fixed_maintenance_count(slot),
            capacity,
        })
        .filter(|o| o.count > capacity as usize)
        .collect()
}

/// Longest run of consecutive maintenance-free slots in a fixed schedule.
fn longest_free_run(schedule: &[bool]) -> usize {
    schedule
        .iter()
        .fold((0, 0), |(best, run), &grounded| {
            let run = if grounded { 0 } else { run + 1 };
            (best.max(run), run)
        })
        .0
}

/// Human-readable reasons the catalog cannot be scheduled.
///
/// Only necessary conditions are checked, so an empty result does not mean
/// the instance is feasible.
pub fn explain_infeasibility(catalog: &Catalog) -> Vec<String> {
    let mut reasons: Vec<String> = capacity_overloads(catalog)
        .iter()
        .map(ToString::to_string)
        .collect();

    let horizon = catalog.horizon();
    let demand: usize = catalog.flights().iter().map(|f| f.duration).sum();

    // Slots each aircraft can fly at most, and the longest block it can offer.
    let (available, longest): (Vec<usize>, Vec<usize>) = catalog
        .aircraft()
        .iter()
        .map(|a| match &a.maintenance {
            Maintenance::FixedSchedule(schedule) => {
                let free = schedule.iter().filter(|&&grounded| !grounded).count();
                (free, longest_free_run(schedule))
            }
            Maintenance::QuotaBased(quota) => {
                let free = horizon.saturating_sub(*quota as usize);
                (free, free)
            }
        })
        .unzip();

    for flight in catalog.flights() {
        if longest.iter().all(|&run| run < flight.duration) {
            reasons.push(format!(
                "flight {:?} needs {} consecutive slots but no aircraft has that much time free of maintenance",
                flight.id, flight.duration
            ));
        }
    }

    let supply: usize = available.iter().sum();
    if demand > supply {
        reasons.push(format!(
            "flights need {demand} aircraft-slots but only {supply} are free of maintenance"
        ));
    }

    if catalog.mode() == MaintenanceMode::Quota {
        let required: usize = (0..catalog.aircraft().len())
            .filter_map(|a| catalog.quota(a))
            .map(|q| q as usize)
            .sum();
        let allowed = catalog.maintenance_capacity() as usize * horizon;
        if required > allowed {
            reasons.push(format!(
                "maintenance quotas need {required} slots but the capacity only allows {allowed}"
            ));
        }
    }

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Aircraft, Flight};
    use crate::grid::TimeGrid;

    fn fixed(id: &str, flags: &[u8]) -> Aircraft {
        Aircraft::fixed(id, flags.iter().map(|&f| f == 1).collect())
    }

    #[test]
    fn finds_overloaded_slots() {
        let catalog = Catalog::new(
            TimeGrid::new(3).unwrap(),
            vec![],
            vec![fixed("A", &[1, 1, 0]), fixed("B", &[1, 0, 0])],
            1,
        )
        .unwrap();
        assert_eq!(
            capacity_overloads(&catalog),
            vec![SlotOverload {
                slot: 0,
                count: 2,
                capacity: 1
            }]
        );
    }

    #[test]
    fn longest_run_counts_consecutive_free_slots() {
        assert_eq!(longest_free_run(&[false, false, true, false, false, false]), 3);
        assert_eq!(longest_free_run(&[true, true]), 0);
        assert_eq!(longest_free_run(&[]), 0);
    }

    #[test]
    fn explains_flight_without_a_window() {
        let catalog = Catalog::new(
            TimeGrid::new(5).unwrap(),
            vec![Flight::new("long", 3, vec![1.0, 1.0])],
            vec![fixed("A", &[0, 0, 1, 0, 0]), fixed("B", &[0, 1, 0, 0, 1])],
            2,
        )
        .unwrap();
        let reasons = explain_infeasibility(&catalog);
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("\"long\""));
    }

    #[test]
    fn explains_demand_and_quota_shortfalls() {
        let catalog = Catalog::new(
            TimeGrid::new(4).unwrap(),
            vec![
                Flight::new("F1", 2, vec![1.0, 1.0]),
                Flight::new("F2", 2, vec![1.0, 1.0]),
            ],
            vec![Aircraft::quota("A", 2), Aircraft::quota("B", 2)],
            0,
        )
        .unwrap();
        let reasons = explain_infeasibility(&catalog);
        assert!(reasons.iter().any(|r| r.contains("quotas need 4 slots")));
        assert!(!reasons.iter().any(|r| r.contains("aircraft-slots")));
    }

    #[test]
    fn feasible_catalog_has_no_reasons() {
        let catalog = Catalog::new(
            TimeGrid::new(4).unwrap(),
            vec![Flight::new("F1", 2, vec![1.0])],
            vec![fixed("A", &[1, 0, 0, 0])],
            1,
        )
        .unwrap();
        assert!(explain_infeasibility(&catalog).is_empty());
    }
}
