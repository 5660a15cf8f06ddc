use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use vpt_challenges::viewpoint_coverage::{Solution, ValidationReport};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Objective {
    pub distance: f64,
    pub precision: f64,
    /// distance - precision
    pub value: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Metadata {
    pub num_viewpoints: usize,
    pub objective: Objective,
    #[serde(default)]
    pub termination: Option<String>,
    #[serde(default)]
    pub time_limited: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SequenceEntry {
    pub id: String,
    pub angles: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OutputData {
    pub metadata: Metadata,
    /// Visiting order, wrapping from the last entry back to the first.
    pub sequence: Vec<SequenceEntry>,
    #[serde(default)]
    pub validation: Option<ValidationReport>,
}

impl OutputData {
    pub fn new(
        solution: &Solution,
        termination: Option<&str>,
        validation: Option<ValidationReport>,
        error: Option<String>,
    ) -> Self {
        let sequence = solution
            .route
            .iter()
            .map(|id| SequenceEntry {
                id: id.clone(),
                angles: solution
                    .selected_angles
                    .get(id)
                    .map(|angles| angles.iter().cloned().collect())
                    .unwrap_or_default(),
            })
            .collect();
        Self {
            metadata: Metadata {
                num_viewpoints: solution.route.len(),
                objective: Objective {
                    distance: solution.total_distance,
                    precision: solution.total_precision,
                    value: solution.objective(),
                },
                termination: termination.map(str::to_string),
                time_limited: solution.time_limited,
                error,
            },
            sequence,
            validation,
        }
    }

    /// Rebuilds the solution as reported. Totals are taken as written; callers
    /// that need trusted values recompute them.
    pub fn to_solution(&self) -> Result<Solution> {
        let mut seen = HashSet::with_capacity(self.sequence.len());
        let mut selected_angles = BTreeMap::new();
        for entry in self.sequence.iter() {
            if !seen.insert(entry.id.as_str()) {
                return Err(anyhow!(
                    "Viewpoint '{}' appears more than once in the sequence",
                    entry.id
                ));
            }
            if !entry.angles.is_empty() {
                selected_angles.insert(entry.id.clone(), entry.angles.iter().cloned().collect());
            }
        }
        if self.metadata.num_viewpoints != self.sequence.len() {
            return Err(anyhow!(
                "metadata.num_viewpoints ({}) does not match sequence length ({})",
                self.metadata.num_viewpoints,
                self.sequence.len()
            ));
        }
        Ok(Solution {
            route: self.sequence.iter().map(|e| e.id.clone()).collect(),
            selected_angles,
            total_distance: self.metadata.objective.distance,
            total_precision: self.metadata.objective.precision,
            time_limited: self.metadata.time_limited,
        })
    }
}
