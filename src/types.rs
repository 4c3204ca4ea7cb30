use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{Aircraft, Catalog, Flight};
use crate::error::ModelConstructionError;
use crate::grid::{DEFAULT_SLOT_HOURS, TimeGrid};
use crate::options::Options;

/// A problem document, as read from YAML.
///
/// Maintenance is either given per aircraft (`maintenance_schedule`, fixed
/// mode) or decided by the model from a quota (`maintenance_quota`, quota
/// mode, which also needs `schedule_length`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub flights: Vec<FlightEntry>,
    pub aircraft: Vec<AircraftEntry>,
    pub maintenance_capacity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_quota: Option<u32>,
    #[serde(default = "default_slot_hours")]
    pub slot_hours: f64,
    #[serde(default)]
    pub options: Options,
}

fn default_slot_hours() -> f64 {
    DEFAULT_SLOT_HOURS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightEntry {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub duration_hours: f64,
    pub costs: Costs,
}

/// Per-aircraft costs, either in aircraft order or keyed by aircraft id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Costs {
    Ordered(Vec<f64>),
    Keyed(#[serde(deserialize_with = "deserialize_keyed_costs")] BTreeMap<String, f64>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AircraftEntry {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_schedule: Option<Vec<u8>>,
    /// Overrides the problem-wide quota for this aircraft.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_quota: Option<u32>,
}

/// Ids may be written as strings or bare integers.
#[derive(Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(untagged)]
enum Id {
    Text(String),
    Number(i64),
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        match id {
            Id::Text(text) => text,
            Id::Number(number) => number.to_string(),
        }
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Id::deserialize(deserializer).map(String::from)
}

fn deserialize_keyed_costs<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, f64>, D::Error> {
    let costs = BTreeMap::<Id, f64>::deserialize(deserializer)?;
    Ok(costs.into_iter().map(|(id, cost)| (id.into(), cost)).collect())
}

impl Problem {
    /// Validates the document and builds the entity catalog.
    pub fn catalog(&self) -> Result<Catalog, ModelConstructionError> {
        let fixed_mode = self
            .aircraft
            .iter()
            .any(|a| a.maintenance_schedule.is_some());

        let horizon = if fixed_mode {
            self.check_fixed_mode()?;
            self.schedule_length
                .or_else(|| {
                    self.aircraft
                        .iter()
                        .find_map(|a| a.maintenance_schedule.as_ref().map(Vec::len))
                })
                .ok_or(ModelConstructionError::MissingScheduleLength)?
        } else {
            self.schedule_length
                .ok_or(ModelConstructionError::MissingScheduleLength)?
        };
        let grid = TimeGrid::with_slot_hours(horizon, self.slot_hours)?;

        let aircraft = self
            .aircraft
            .iter()
            .map(|entry| self.build_aircraft(entry))
            .collect::<Result<Vec<_>, _>>()?;

        let flights = self
            .flights
            .iter()
            .map(|entry| {
                let costs = self.resolve_costs(entry)?;
                Flight::from_hours(entry.id.clone(), entry.duration_hours, costs, &grid)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Catalog::new(grid, flights, aircraft, self.maintenance_capacity)
    }

    fn check_fixed_mode(&self) -> Result<(), ModelConstructionError> {
        let mixed = self.maintenance_quota.is_some()
            || self
                .aircraft
                .iter()
                .any(|a| a.maintenance_schedule.is_none() || a.maintenance_quota.is_some());
        if mixed {
            return Err(ModelConstructionError::MixedMaintenanceModes);
        }
        Ok(())
    }

    fn build_aircraft(&self, entry: &AircraftEntry) -> Result<Aircraft, ModelConstructionError> {
        match &entry.maintenance_schedule {
            Some(flags) => {
                let schedule = flags
                    .iter()
                    .enumerate()
                    .map(|(slot, &value)| match value {
                        0 => Ok(false),
                        1 => Ok(true),
                        _ => Err(ModelConstructionError::InvalidMaintenanceFlag {
                            aircraft: entry.id.clone(),
                            slot,
                            value,
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Aircraft::fixed(entry.id.clone(), schedule))
            }
            None => entry
                .maintenance_quota
                .or(self.maintenance_quota)
                .map(|quota| Aircraft::quota(entry.id.clone(), quota))
                .ok_or_else(|| ModelConstructionError::MissingQuota(entry.id.clone())),
        }
    }

    fn resolve_costs(&self, entry: &FlightEntry) -> Result<Vec<f64>, ModelConstructionError> {
        match &entry.costs {
            Costs::Ordered(costs) => Ok(costs.clone()),
            Costs::Keyed(costs) => {
                if let Some(unknown) = costs
                    .keys()
                    .find(|id| !self.aircraft.iter().any(|a| &a.id == *id))
                {
                    return Err(ModelConstructionError::UnknownAircraft {
                        flight: entry.id.clone(),
                        aircraft: unknown.clone(),
                    });
                }
                self.aircraft
                    .iter()
                    .map(|a| {
                        costs
                            .get(&a.id)
                            .copied()
                            .ok_or_else(|| ModelConstructionError::MissingCost {
                                flight: entry.id.clone(),
                                aircraft: a.id.clone(),
                            })
                    })
                    .collect()
            }
        }
    }
}
