mod adjacency;
pub use adjacency::*;
mod geometry;
pub use geometry::*;
mod metrics;
mod validation;
pub use validation::*;

use crate::ChallengeError;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Number of selected covering pairs every sample point needs.
pub const REQUIRED_COVERAGE: u32 = 3;
/// Generator only: viewpoints further apart than this are never connected.
pub const CONNECT_RADIUS: f64 = 45.0;

#[derive(Serialize, Deserialize, Debug, Copy, Clone)]
pub struct Track {
    pub num_viewpoints: usize,
    pub num_sample_points: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Viewpoint {
    pub id: String,
    #[serde(rename = "coordinates")]
    pub position: Point3,
    #[serde(default)]
    pub is_mandatory: bool,
    /// angle id -> precision score
    #[serde(default)]
    pub precision: BTreeMap<String, f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct CoveringPair {
    pub viewpoint_id: String,
    pub angle_id: String,
}

impl CoveringPair {
    pub fn new(viewpoint_id: &str, angle_id: &str) -> Self {
        Self {
            viewpoint_id: viewpoint_id.to_string(),
            angle_id: angle_id.to_string(),
        }
    }
}

impl From<(String, String)> for CoveringPair {
    fn from((viewpoint_id, angle_id): (String, String)) -> Self {
        Self {
            viewpoint_id,
            angle_id,
        }
    }
}

impl From<CoveringPair> for (String, String) {
    fn from(pair: CoveringPair) -> Self {
        (pair.viewpoint_id, pair.angle_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SamplePoint {
    pub id: String,
    #[serde(rename = "coordinates")]
    pub position: Point3,
    #[serde(rename = "coverage_pairs")]
    pub covering_pairs: Vec<CoveringPair>,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(untagged)]
pub enum AdjacencyCell {
    Flag(bool),
    Int(i64),
}

impl AdjacencyCell {
    pub fn is_permitted(&self) -> bool {
        match *self {
            AdjacencyCell::Flag(flag) => flag,
            AdjacencyCell::Int(value) => value != 0,
        }
    }
}

/// Wire form of a problem instance, before any validation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Instance {
    pub viewpoints: Vec<Viewpoint>,
    pub sample_points: Vec<SamplePoint>,
    pub collision_matrix: Vec<Vec<AdjacencyCell>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Solution {
    /// Visiting order. The last viewpoint connects back to the first.
    pub route: Vec<String>,
    pub selected_angles: BTreeMap<String, BTreeSet<String>>,
    pub total_distance: f64,
    pub total_precision: f64,
    /// Set when construction stopped because the time budget ran out.
    pub time_limited: bool,
}

impl Solution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower is better.
    pub fn objective(&self) -> f64 {
        self.total_distance - self.total_precision
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(try_from = "Instance", into = "Instance")]
pub struct Challenge {
    pub viewpoints: Vec<Viewpoint>,
    pub sample_points: Vec<SamplePoint>,
    pub adjacency: AdjacencyOracle,
}

impl TryFrom<Instance> for Challenge {
    type Error = ChallengeError;

    fn try_from(instance: Instance) -> Result<Self, Self::Error> {
        Challenge::from_instance(instance)
    }
}

impl From<Challenge> for Instance {
    fn from(challenge: Challenge) -> Self {
        challenge.to_instance()
    }
}

impl Challenge {
    pub fn from_instance(instance: Instance) -> Result<Self, ChallengeError> {
        let Instance {
            viewpoints,
            sample_points,
            collision_matrix,
        } = instance;

        if viewpoints.is_empty() {
            return Err(ChallengeError::EmptyInstance {
                collection: "viewpoints",
            });
        }
        if sample_points.is_empty() {
            return Err(ChallengeError::EmptyInstance {
                collection: "sample points",
            });
        }

        if let Some(id) = viewpoints
            .iter()
            .map(|v| (&v.id, &v.position))
            .chain(sample_points.iter().map(|s| (&s.id, &s.position)))
            .find(|(_, position)| !position.is_finite())
            .map(|(id, _)| id.clone())
        {
            return Err(ChallengeError::InvalidCoordinates { id });
        }

        for viewpoint in viewpoints.iter() {
            for (angle_id, &value) in viewpoint.precision.iter() {
                if !value.is_finite() || value < 0.0 {
                    return Err(ChallengeError::InvalidPrecision {
                        viewpoint_id: viewpoint.id.clone(),
                        angle_id: angle_id.clone(),
                        value,
                    });
                }
            }
        }

        let viewpoint_ids: Vec<String> = viewpoints.iter().map(|v| v.id.clone()).collect();
        let matrix: Vec<Vec<bool>> = collision_matrix
            .iter()
            .map(|row| row.iter().map(AdjacencyCell::is_permitted).collect())
            .collect();
        let adjacency = AdjacencyOracle::new(&viewpoint_ids, &matrix)?;

        let mut sample_ids = HashSet::with_capacity(sample_points.len());
        for sample in sample_points.iter() {
            if !sample_ids.insert(sample.id.as_str()) {
                return Err(ChallengeError::DuplicateSamplePoint {
                    sample_id: sample.id.clone(),
                });
            }
            for pair in sample.covering_pairs.iter() {
                let idx = adjacency.index_of(&pair.viewpoint_id).ok_or_else(|| {
                    ChallengeError::UnknownViewpoint {
                        sample_id: sample.id.clone(),
                        viewpoint_id: pair.viewpoint_id.clone(),
                    }
                })?;
                if !viewpoints[idx].precision.contains_key(&pair.angle_id) {
                    return Err(ChallengeError::UnknownAngle {
                        sample_id: sample.id.clone(),
                        viewpoint_id: pair.viewpoint_id.clone(),
                        angle_id: pair.angle_id.clone(),
                    });
                }
            }
            let distinct_pairs = sample.covering_pairs.iter().collect::<HashSet<_>>().len();
            if distinct_pairs < REQUIRED_COVERAGE as usize {
                log::warn!(
                    "Sample point '{}' has only {} distinct covering pairs and can never reach coverage {}",
                    sample.id,
                    distinct_pairs,
                    REQUIRED_COVERAGE
                );
            }
        }

        Ok(Self {
            viewpoints,
            sample_points,
            adjacency,
        })
    }

    pub fn to_instance(&self) -> Instance {
        Instance {
            viewpoints: self.viewpoints.clone(),
            sample_points: self.sample_points.clone(),
            collision_matrix: self
                .adjacency
                .to_matrix()
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|permitted| AdjacencyCell::Int(permitted as i64))
                        .collect()
                })
                .collect(),
        }
    }

    pub fn generate_instance(seed: &[u8; 32], track: &Track) -> anyhow::Result<Self> {
        if track.num_viewpoints < REQUIRED_COVERAGE as usize {
            return Err(anyhow::anyhow!(
                "num_viewpoints must be at least {}",
                REQUIRED_COVERAGE
            ));
        }
        if track.num_sample_points == 0 {
            return Err(anyhow::anyhow!("num_sample_points must be at least 1"));
        }
        let mut rng = SmallRng::from_seed(seed.clone());

        let mut positions: Vec<(i32, i32, i32)> = Vec::with_capacity(track.num_viewpoints);
        let mut positions_set: HashSet<(i32, i32, i32)> =
            HashSet::with_capacity(track.num_viewpoints);
        while positions.len() < track.num_viewpoints {
            let pos = (
                rng.gen_range(0..=100),
                rng.gen_range(0..=100),
                rng.gen_range(0..=100),
            );
            if positions_set.insert(pos) {
                positions.push(pos);
            }
        }

        let viewpoints: Vec<Viewpoint> = positions
            .iter()
            .enumerate()
            .map(|(i, &(x, y, z))| {
                let num_angles = rng.gen_range(1..=4);
                Viewpoint {
                    id: format!("v{}", i),
                    position: Point3::new(x as f64, y as f64, z as f64),
                    is_mandatory: i == 0,
                    precision: (0..num_angles)
                        .map(|a| {
                            let precision = (rng.gen::<f64>() * 1000.0).floor() / 1000.0;
                            (format!("a{}", a), precision)
                        })
                        .collect(),
                }
            })
            .collect();

        let collision_matrix: Vec<Vec<AdjacencyCell>> = viewpoints
            .iter()
            .enumerate()
            .map(|(i, from)| {
                viewpoints
                    .iter()
                    .enumerate()
                    .map(|(j, to)| {
                        let permitted = i != j
                            && from.position.distance(&to.position) <= CONNECT_RADIUS
                            && rng.gen::<f64>() >= 0.1;
                        AdjacencyCell::Int(permitted as i64)
                    })
                    .collect()
            })
            .collect();

        let sample_points: Vec<SamplePoint> = (0..track.num_sample_points)
            .map(|s| {
                let position = Point3::new(
                    rng.gen_range(0..=100) as f64,
                    rng.gen_range(0..=100) as f64,
                    rng.gen_range(0..=100) as f64,
                );
                let num_pairs = rng.gen_range(3..=6).min(track.num_viewpoints);
                let mut chosen: Vec<usize> = Vec::with_capacity(num_pairs);
                while chosen.len() < num_pairs {
                    let v = rng.gen_range(0..track.num_viewpoints);
                    if !chosen.contains(&v) {
                        chosen.push(v);
                    }
                }
                let covering_pairs = chosen
                    .into_iter()
                    .map(|v| {
                        let num_angles = viewpoints[v].precision.len();
                        let angle_id = format!("a{}", rng.gen_range(0..num_angles));
                        CoveringPair::new(&viewpoints[v].id, &angle_id)
                    })
                    .collect();
                SamplePoint {
                    id: format!("s{}", s),
                    position,
                    covering_pairs,
                }
            })
            .collect();

        Ok(Challenge::from_instance(Instance {
            viewpoints,
            sample_points,
            collision_matrix,
        })?)
    }

    pub fn num_viewpoints(&self) -> usize {
        self.viewpoints.len()
    }

    pub fn viewpoint_index(&self, viewpoint_id: &str) -> Option<usize> {
        self.adjacency.index_of(viewpoint_id)
    }

    /// Index of the single mandatory viewpoint.
    pub fn mandatory_index(&self) -> Result<usize, ChallengeError> {
        let mandatory: Vec<usize> = self
            .viewpoints
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_mandatory)
            .map(|(i, _)| i)
            .collect();
        match mandatory.as_slice() {
            [] => Err(ChallengeError::MissingMandatory),
            [idx] => Ok(*idx),
            _ => Err(ChallengeError::AmbiguousMandatory {
                viewpoint_ids: mandatory
                    .iter()
                    .map(|&i| self.viewpoints[i].id.clone())
                    .collect(),
            }),
        }
    }

    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.viewpoints[from]
            .position
            .distance(&self.viewpoints[to].position)
    }
}
