use thiserror::Error;

/// Malformed input detected before any solve attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelConstructionError {
    #[error("the schedule horizon must contain at least one slot")]
    EmptyHorizon,

    #[error("slot length must be a positive number of hours, got {0}")]
    InvalidSlotLength(f64),

    #[error("duplicate flight id {0:?}")]
    DuplicateFlight(String),

    #[error("duplicate aircraft id {0:?}")]
    DuplicateAircraft(String),

    #[error("there are {0} flights but no aircraft to fly them")]
    NoAircraft(usize),

    #[error("flight {flight:?} has an invalid duration of {hours} hours")]
    InvalidDuration { flight: String, hours: f64 },

    #[error("flight {flight:?} needs {duration} slots but the horizon only has {horizon}")]
    FlightExceedsHorizon {
        flight: String,
        duration: usize,
        horizon: usize,
    },

    #[error("flight {flight:?} has a cost for aircraft index {index}, but there are only {aircraft} aircraft")]
    UnknownAircraftIndex {
        flight: String,
        index: usize,
        aircraft: usize,
    },

    #[error("flight {flight:?} has a cost for unknown aircraft {aircraft:?}")]
    UnknownAircraft { flight: String, aircraft: String },

    #[error("flight {flight:?} has no cost for aircraft {aircraft:?}")]
    MissingCost { flight: String, aircraft: String },

    #[error("flight {flight:?} has an invalid cost {cost} for aircraft {aircraft:?}")]
    InvalidCost {
        flight: String,
        aircraft: String,
        cost: f64,
    },

    #[error("aircraft {aircraft:?} has a maintenance schedule of length {len}, expected {horizon}")]
    MaintenanceLength {
        aircraft: String,
        len: usize,
        horizon: usize,
    },

    #[error("aircraft {aircraft:?} has maintenance flag {value} at slot {slot}, expected 0 or 1")]
    InvalidMaintenanceFlag {
        aircraft: String,
        slot: usize,
        value: u8,
    },

    #[error("aircraft must either all have fixed maintenance schedules or all use quotas")]
    MixedMaintenanceModes,

    #[error("quota mode requires a schedule length")]
    MissingScheduleLength,

    #[error("aircraft {0:?} has no maintenance schedule and no maintenance quota")]
    MissingQuota(String),

    #[error("aircraft {aircraft:?} needs {quota} maintenance slots but the horizon only has {horizon}")]
    QuotaExceedsHorizon {
        aircraft: String,
        quota: u32,
        horizon: usize,
    },

    #[error("slot {slot} has {count} aircraft in maintenance, exceeding the capacity of {capacity}")]
    MaintenanceOverCapacity {
        slot: usize,
        count: usize,
        capacity: u32,
    },
}

/// Why the solver did not produce a usable answer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverFailure {
    #[error("time limit reached")]
    Timeout,

    #[error("solve was cancelled")]
    Cancelled,

    #[error("variable {variable} has non-integral value {value}")]
    Numerical { variable: String, value: f64 },

    #[error("solver failed: {0}")]
    Engine(String),
}

/// An invariant violation found while turning a declared solution into a schedule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("flight {0:?} has no assignment in the solution")]
    Unassigned(String),

    #[error("flight {flight:?} is assigned {count} times in the solution")]
    MultiplyAssigned { flight: String, count: usize },

    #[error("flights {first:?} and {second:?} both occupy aircraft {aircraft:?} at slot {slot}")]
    DoubleBooked {
        aircraft: String,
        slot: usize,
        first: String,
        second: String,
    },

    #[error("flight {flight:?} occupies aircraft {aircraft:?} during maintenance at slot {slot}")]
    FlightDuringMaintenance {
        flight: String,
        aircraft: String,
        slot: usize,
    },

    #[error("flight {flight:?} starting at {start} runs past the horizon of {horizon} slots")]
    PastHorizon {
        flight: String,
        start: usize,
        horizon: usize,
    },

    #[error("slot {slot} has {count} aircraft in maintenance, exceeding the capacity of {capacity}")]
    CapacityExceeded {
        slot: usize,
        count: usize,
        capacity: u32,
    },

    #[error("aircraft {aircraft:?} has {actual} maintenance slots, violating its quota of {quota}")]
    QuotaViolated {
        aircraft: String,
        actual: usize,
        quota: u32,
    },

    #[error("solution is missing the value of variable {0}")]
    MissingValue(String),
}

/// Errors returned by the end-to-end [`crate::Problem::solve`] pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Construction(#[from] ModelConstructionError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
