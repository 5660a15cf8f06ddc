use std::collections::BTreeSet;
use vpt_challenges::viewpoint_coverage::{Challenge, REQUIRED_COVERAGE};

/// Running count of selected covering pairs per sample point.
#[derive(Debug, Clone)]
pub struct CoverageTracker {
    counts: Vec<u32>,
    /// Per viewpoint: (sample index, angle id) of the first covering pair that
    /// references the viewpoint in each sample point, in sample order.
    reach: Vec<Vec<(usize, String)>>,
}

impl CoverageTracker {
    pub fn new(challenge: &Challenge) -> Self {
        let mut reach = vec![Vec::new(); challenge.num_viewpoints()];
        for (s, sample) in challenge.sample_points.iter().enumerate() {
            let mut seen = BTreeSet::new();
            for pair in sample.covering_pairs.iter() {
                if let Some(v) = challenge.viewpoint_index(&pair.viewpoint_id) {
                    if seen.insert(v) {
                        reach[v].push((s, pair.angle_id.clone()));
                    }
                }
            }
        }
        Self {
            counts: vec![0; challenge.sample_points.len()],
            reach,
        }
    }

    /// Number of still-unsatisfied sample points this viewpoint can observe.
    pub fn remaining_benefit(&self, viewpoint: usize) -> usize {
        self.reach[viewpoint]
            .iter()
            .filter(|(s, _)| self.counts[*s] < REQUIRED_COVERAGE)
            .count()
    }

    /// Records the selection of `viewpoint` and returns the angles it selects.
    /// Counts keep growing past the target.
    pub fn apply_selection(&mut self, viewpoint: usize) -> BTreeSet<String> {
        let mut angles = BTreeSet::new();
        for (s, angle_id) in self.reach[viewpoint].iter() {
            self.counts[*s] += 1;
            angles.insert(angle_id.clone());
        }
        angles
    }

    pub fn is_fully_covered(&self) -> bool {
        self.counts.iter().all(|&count| count >= REQUIRED_COVERAGE)
    }

    pub fn num_covered(&self) -> usize {
        self.counts
            .iter()
            .filter(|&&count| count >= REQUIRED_COVERAGE)
            .count()
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }
}
