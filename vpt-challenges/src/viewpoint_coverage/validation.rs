use super::{Challenge, CoveringPair, Solution, REQUIRED_COVERAGE};
use anyhow::{anyhow, Result};
use logging_timer::time;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How many offending ids a failure reason lists before summarising.
const MAX_LISTED: usize = 10;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub reason: String,
}

impl CheckOutcome {
    fn pass(reason: String) -> Self {
        Self {
            passed: true,
            reason,
        }
    }

    fn fail(reason: String) -> Self {
        Self {
            passed: false,
            reason,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub mandatory_start: CheckOutcome,
    pub connectivity: CheckOutcome,
    pub coverage: CheckOutcome,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn failures(&self) -> Vec<&str> {
        [&self.mandatory_start, &self.connectivity, &self.coverage]
            .into_iter()
            .filter(|check| !check.passed)
            .map(|check| check.reason.as_str())
            .collect()
    }
}

impl Challenge {
    /// Runs every check against `solution` without touching it.
    #[time]
    pub fn verify_solution(&self, solution: &Solution) -> ValidationReport {
        let mandatory_start = self.check_mandatory_start(solution);
        let connectivity = self.check_connectivity(solution);
        let coverage = self.check_coverage(solution);
        ValidationReport {
            valid: mandatory_start.passed && connectivity.passed && coverage.passed,
            mandatory_start,
            connectivity,
            coverage,
        }
    }

    pub fn ensure_valid(&self, solution: &Solution) -> Result<()> {
        let report = self.verify_solution(solution);
        if report.is_valid() {
            Ok(())
        } else {
            Err(anyhow!(report.failures().join("; ")))
        }
    }

    pub fn check_mandatory_start(&self, solution: &Solution) -> CheckOutcome {
        let mandatory = match self.mandatory_index() {
            Ok(idx) => &self.viewpoints[idx].id,
            Err(e) => return CheckOutcome::fail(e.to_string()),
        };
        match solution.route.first() {
            None => CheckOutcome::fail("Tour is empty".to_string()),
            Some(first) if first == mandatory => CheckOutcome::pass(format!(
                "Tour starts at mandatory viewpoint '{}'",
                mandatory
            )),
            Some(first) => CheckOutcome::fail(format!(
                "Tour starts at '{}' instead of mandatory viewpoint '{}'",
                first, mandatory
            )),
        }
    }

    pub fn check_connectivity(&self, solution: &Solution) -> CheckOutcome {
        let route = &solution.route;
        if route.is_empty() {
            return CheckOutcome::fail("Tour is empty".to_string());
        }

        let unknown: Vec<&String> = route
            .iter()
            .filter(|id| self.viewpoint_index(id).is_none())
            .collect();
        if !unknown.is_empty() {
            return CheckOutcome::fail(format!(
                "Tour contains unknown viewpoints {}",
                list_ids(&unknown)
            ));
        }

        let mut seen = HashSet::with_capacity(route.len());
        let repeated: Vec<&String> = route.iter().filter(|id| !seen.insert(*id)).collect();
        if !repeated.is_empty() {
            return CheckOutcome::fail(format!(
                "Tour visits viewpoints more than once: {}",
                list_ids(&repeated)
            ));
        }

        if route.len() == 1 {
            let only = &route[0];
            return match self.viewpoint_index(only) {
                Some(idx) if self.viewpoints[idx].is_mandatory => CheckOutcome::pass(format!(
                    "Tour consists of mandatory viewpoint '{}' only",
                    only
                )),
                _ => CheckOutcome::fail(format!(
                    "Single-viewpoint tour '{}' is not the mandatory viewpoint",
                    only
                )),
            };
        }

        let broken: Vec<String> = (0..route.len())
            .map(|i| (&route[i], &route[(i + 1) % route.len()]))
            .filter(|(from, to)| !self.adjacency.can_connect(from, to))
            .map(|(from, to)| format!("'{}'->'{}'", from, to))
            .collect();
        if broken.is_empty() {
            CheckOutcome::pass(format!(
                "All {} edges of the tour are permitted",
                route.len()
            ))
        } else {
            CheckOutcome::fail(format!(
                "{} of {} edges are not permitted: {}",
                broken.len(),
                route.len(),
                list_ids(&broken)
            ))
        }
    }

    /// Distinct selected covering pairs per sample point, replayed from the
    /// solution's angle selection. Pairs on viewpoints outside the tour do not
    /// count, and a pair listed twice counts once.
    pub fn calc_coverage_counts(&self, solution: &Solution) -> Vec<u32> {
        let toured: HashSet<&str> = solution.route.iter().map(String::as_str).collect();
        self.sample_points
            .iter()
            .map(|sample| {
                sample
                    .covering_pairs
                    .iter()
                    .collect::<HashSet<&CoveringPair>>()
                    .into_iter()
                    .filter(|pair| {
                        toured.contains(pair.viewpoint_id.as_str())
                            && solution
                                .selected_angles
                                .get(&pair.viewpoint_id)
                                .is_some_and(|angles| angles.contains(&pair.angle_id))
                    })
                    .count() as u32
            })
            .collect()
    }

    pub fn check_coverage(&self, solution: &Solution) -> CheckOutcome {
        let counts = self.calc_coverage_counts(solution);
        let uncovered: Vec<String> = self
            .sample_points
            .iter()
            .zip(counts.iter())
            .filter(|(_, &count)| count < REQUIRED_COVERAGE)
            .map(|(sample, count)| format!("'{}' ({})", sample.id, count))
            .collect();
        if uncovered.is_empty() {
            CheckOutcome::pass(format!(
                "All {} sample points are covered at least {} times",
                counts.len(),
                REQUIRED_COVERAGE
            ))
        } else {
            CheckOutcome::fail(format!(
                "{} of {} sample points are covered fewer than {} times: {}",
                uncovered.len(),
                counts.len(),
                REQUIRED_COVERAGE,
                list_ids(&uncovered)
            ))
        }
    }
}

fn list_ids<T: std::fmt::Display>(ids: &[T]) -> String {
    let mut listed = ids
        .iter()
        .take(MAX_LISTED)
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if ids.len() > MAX_LISTED {
        listed.push_str(&format!(" and {} more", ids.len() - MAX_LISTED));
    }
    listed
}
