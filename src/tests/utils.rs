use crate::catalog::{Aircraft, Catalog, Flight};
use crate::extract::Schedule;
use crate::grid::TimeGrid;

pub fn fixed_catalog(
    schedules: &[&[u8]],
    flights: &[(usize, &[f64])],
    capacity: u32,
) -> Catalog {
    let horizon = schedules.first().map(|s| s.len()).unwrap_or(1);
    let aircraft = schedules
        .iter()
        .enumerate()
        .map(|(a, flags)| Aircraft::fixed(format!("A{}", a + 1), flags.iter().map(|&f| f == 1).collect()))
        .collect();
    let flights = flights
        .iter()
        .enumerate()
        .map(|(f, (duration, costs))| Flight::new(format!("F{}", f + 1), *duration, costs.to_vec()))
        .collect();
    Catalog::new(TimeGrid::new(horizon).unwrap(), flights, aircraft, capacity).unwrap()
}

/// Cheapest total cost over every placement of every flight, or `None` when
/// no placement satisfies the fixed maintenance schedule. Fixed mode only.
pub fn brute_force_optimum(catalog: &Catalog) -> Option<f64> {
    let horizon = catalog.horizon();
    let mut busy: Vec<Vec<bool>> = (0..catalog.aircraft().len())
        .map(|a| (0..horizon).map(|t| catalog.fixed_maintenance(a, t).unwrap_or(false)).collect())
        .collect();
    search(catalog, 0, &mut busy)
}

fn search(catalog: &Catalog, f: usize, busy: &mut [Vec<bool>]) -> Option<f64> {
    let Some(flight) = catalog.flights().get(f) else {
        return Some(0.0);
    };
    let horizon = catalog.horizon();
    let mut best: Option<f64> = None;
    for a in 0..busy.len() {
        for start in 0..=horizon.saturating_sub(flight.duration) {
            let end = start + flight.duration;
            if end > horizon || busy[a][start..end].iter().any(|&b| b) {
                continue;
            }
            busy[a][start..end].iter_mut().for_each(|b| *b = true);
            if let Some(rest) = search(catalog, f + 1, busy) {
                let total = flight.cost(a) + rest;
                best = Some(best.map_or(total, |b: f64| b.min(total)));
            }
            busy[a][start..end].iter_mut().for_each(|b| *b = false);
        }
    }
    best
}

/// Asserts coverage and duration on top of [`Schedule::verify`].
pub fn assert_valid(catalog: &Catalog, schedule: &Schedule) {
    assert_eq!(schedule.assignments.len(), catalog.flights().len());
    for (f, s) in schedule.assignments.iter().enumerate() {
        assert_eq!(s.flight, f);
        assert_eq!(s.end - s.start, catalog.flights()[f].duration);
    }
    schedule
        .verify(catalog, &Default::default())
        .unwrap_or_else(|e| panic!("invalid schedule: {e}"));
}
