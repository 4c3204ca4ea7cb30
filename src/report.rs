use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::builder::FleetModel;
use crate::diagnostics;
use crate::extract::Schedule;
use crate::orchestrator::{SolveOutcome, SolveStatus};

/// The result document written for the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub status: SolveStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignments: Vec<AssignmentRecord>,
    /// Aircraft id to maintenance slots, quota mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<BTreeMap<String, Vec<usize>>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub flight: String,
    pub aircraft: String,
    pub start: usize,
    pub end: usize,
}

impl Report {
    pub fn new(model: &FleetModel, outcome: &SolveOutcome, schedule: Option<&Schedule>) -> Self {
        let catalog = model.catalog();
        let mut diagnostics: Vec<String> = model.diagnostics().to_vec();

        if let Some(failure) = &outcome.failure {
            diagnostics.push(format!("solver error: {failure}"));
        }
        if outcome.status == SolveStatus::Infeasible {
            match &outcome.explanation {
                Some(explanation) => diagnostics.push(explanation.clone()),
                None => {
                    let reasons = diagnostics::explain_infeasibility(catalog);
                    if reasons.is_empty() {
                        diagnostics.push("no simple cause of infeasibility identified".into());
                    }
                    for reason in reasons {
                        if !diagnostics.contains(&reason) {
                            diagnostics.push(reason);
                        }
                    }
                }
            }
        }

        let Some(schedule) = schedule else {
            return Self {
                status: outcome.status,
                objective: None,
                assignments: Vec::new(),
                maintenance: None,
                diagnostics,
            };
        };

        let assignments = schedule
            .assignments
            .iter()
            .map(|s| AssignmentRecord {
                flight: catalog.flights()[s.flight].id.clone(),
                aircraft: catalog.aircraft()[s.aircraft].id.clone(),
                start: s.start,
                end: s.end,
            })
            .collect();

        Self {
            status: outcome.status,
            objective: Some(schedule.total_cost),
            assignments,
            maintenance: schedule.maintenance_slots(catalog),
            diagnostics,
        }
    }

    pub fn assignment(&self, flight: &str) -> Option<&AssignmentRecord> {
        self.assignments.iter().find(|a| a.flight == flight)
    }
}
