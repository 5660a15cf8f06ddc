#[derive(Debug, Clone, PartialEq)]
pub enum ChallengeError {
    AmbiguousMandatory {
        viewpoint_ids: Vec<String>,
    },
    DuplicateSamplePoint {
        sample_id: String,
    },
    DuplicateViewpoint {
        viewpoint_id: String,
    },
    EmptyInstance {
        collection: &'static str,
    },
    InvalidCoordinates {
        id: String,
    },
    InvalidPrecision {
        viewpoint_id: String,
        angle_id: String,
        value: f64,
    },
    MissingMandatory,
    ShapeMismatch {
        expected: usize,
        rows: usize,
        row_lengths: Vec<usize>,
    },
    TimedOut {
        budget_ms: u64,
        elapsed_ms: u64,
        tour_len: usize,
    },
    UnknownAngle {
        sample_id: String,
        viewpoint_id: String,
        angle_id: String,
    },
    UnknownViewpoint {
        sample_id: String,
        viewpoint_id: String,
    },
}

impl std::fmt::Display for ChallengeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChallengeError::AmbiguousMandatory { viewpoint_ids } => write!(
                f,
                "Exactly one mandatory viewpoint is required, found {}: {:?}",
                viewpoint_ids.len(),
                viewpoint_ids
            ),
            ChallengeError::DuplicateSamplePoint { sample_id } => {
                write!(f, "Sample point '{}' is defined more than once", sample_id)
            }
            ChallengeError::DuplicateViewpoint { viewpoint_id } => {
                write!(f, "Viewpoint '{}' is defined more than once", viewpoint_id)
            }
            ChallengeError::EmptyInstance { collection } => {
                write!(f, "Instance has no {}", collection)
            }
            ChallengeError::InvalidCoordinates { id } => {
                write!(f, "'{}' has non-finite coordinates", id)
            }
            ChallengeError::InvalidPrecision {
                viewpoint_id,
                angle_id,
                value,
            } => write!(
                f,
                "Viewpoint '{}' angle '{}' has precision {}, must be finite and non-negative",
                viewpoint_id, angle_id, value
            ),
            ChallengeError::MissingMandatory => {
                write!(f, "No viewpoint is flagged as mandatory")
            }
            ChallengeError::ShapeMismatch {
                expected,
                rows,
                row_lengths,
            } => write!(
                f,
                "Adjacency matrix must be {}x{} to match the viewpoint count, got {} rows with lengths {:?}",
                expected, expected, rows, row_lengths
            ),
            ChallengeError::TimedOut {
                budget_ms,
                elapsed_ms,
                tour_len,
            } => write!(
                f,
                "Time budget of {}ms exceeded after {}ms, returning partial tour of {} viewpoints",
                budget_ms, elapsed_ms, tour_len
            ),
            ChallengeError::UnknownAngle {
                sample_id,
                viewpoint_id,
                angle_id,
            } => write!(
                f,
                "Sample point '{}' references angle '{}' which viewpoint '{}' does not declare",
                sample_id, angle_id, viewpoint_id
            ),
            ChallengeError::UnknownViewpoint {
                sample_id,
                viewpoint_id,
            } => write!(
                f,
                "Sample point '{}' references unknown viewpoint '{}'",
                sample_id, viewpoint_id
            ),
        }
    }
}

impl std::error::Error for ChallengeError {}
