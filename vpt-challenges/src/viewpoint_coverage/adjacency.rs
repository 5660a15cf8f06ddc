use crate::ChallengeError;
use ahash::AHashMap;

/// Directed "may travel directly from A to B" relation over viewpoints,
/// indexed by their enumeration order. Never assumed symmetric.
#[derive(Debug, Clone)]
pub struct AdjacencyOracle {
    size: usize,
    permitted: Vec<bool>,
    index: AHashMap<String, usize>,
}

impl AdjacencyOracle {
    pub fn new(viewpoint_ids: &[String], matrix: &[Vec<bool>]) -> Result<Self, ChallengeError> {
        let size = viewpoint_ids.len();
        if matrix.len() != size || matrix.iter().any(|row| row.len() != size) {
            return Err(ChallengeError::ShapeMismatch {
                expected: size,
                rows: matrix.len(),
                row_lengths: matrix.iter().map(|row| row.len()).collect(),
            });
        }

        let mut index = AHashMap::with_capacity(size);
        for (i, id) in viewpoint_ids.iter().enumerate() {
            if index.insert(id.clone(), i).is_some() {
                return Err(ChallengeError::DuplicateViewpoint {
                    viewpoint_id: id.clone(),
                });
            }
        }

        Ok(Self {
            size,
            permitted: matrix.iter().flatten().cloned().collect(),
            index,
        })
    }

    pub fn index_of(&self, viewpoint_id: &str) -> Option<usize> {
        self.index.get(viewpoint_id).copied()
    }

    pub fn can_connect_idx(&self, from: usize, to: usize) -> bool {
        from < self.size && to < self.size && self.permitted[from * self.size + to]
    }

    /// Unknown ids never connect.
    pub fn can_connect(&self, from_id: &str, to_id: &str) -> bool {
        match (self.index_of(from_id), self.index_of(to_id)) {
            (Some(from), Some(to)) => self.can_connect_idx(from, to),
            _ => false,
        }
    }

    pub fn to_matrix(&self) -> Vec<Vec<bool>> {
        self.permitted
            .chunks(self.size.max(1))
            .take(self.size)
            .map(|row| row.to_vec())
            .collect()
    }
}
