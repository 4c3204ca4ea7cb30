use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the per-aircraft maintenance quota is enforced in quota mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum QuotaComparison {
    /// `Σ_t m[a,t] = M_a`
    #[default]
    Exact,
    /// `Σ_t m[a,t] ≥ M_a`
    AtLeast,
}

/// What to do when a fixed maintenance schedule already grounds more aircraft
/// in some slot than the maintenance capacity allows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OverCapacityPolicy {
    /// Fail model construction.
    #[default]
    Reject,
    /// Build the model anyway; the capacity rows make it provably infeasible.
    MarkInfeasible,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    pub quota_comparison: QuotaComparison,
    pub over_capacity: OverCapacityPolicy,
}

fn default_integrality_tolerance() -> f64 {
    1e-6
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    pub time_limit_seconds: Option<f64>,
    /// Solver values further than this from 0 or 1 are a numerical failure.
    #[serde(default = "default_integrality_tolerance")]
    pub integrality_tolerance: f64,
    pub threads: Option<u32>,
    pub solver_log: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit_seconds: None,
            integrality_tolerance: default_integrality_tolerance(),
            threads: None,
            solver_log: false,
        }
    }
}

impl SolveOptions {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_seconds
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(Duration::from_secs_f64)
    }
}

/// The `options:` section of a problem document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    #[serde(flatten)]
    pub model: ModelOptions,
    #[serde(flatten)]
    pub solve: SolveOptions,
}
