use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// Flat f32 vector representing a single environment's state observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    data: Vec<f32>,
}

impl Observation {
    pub const fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

impl std::ops::Index<usize> for Observation {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        &self.data[i]
    }
}

impl From<Vec<f32>> for Observation {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// BatchObservation
// ---------------------------------------------------------------------------

/// Row-major `[num_envs x dim]` observation buffer shared by every parallel
/// environment instance of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchObservation {
    num_envs: usize,
    dim: usize,
    data: Vec<f32>,
}

impl BatchObservation {
    /// Build from row-major data. Panics if `data.len() != num_envs * dim`;
    /// observation assembly is internal and a mismatch is a programming bug.
    pub fn new(num_envs: usize, dim: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            num_envs * dim,
            "BatchObservation: data length {} != {num_envs} x {dim}",
            data.len()
        );
        Self {
            num_envs,
            dim,
            data,
        }
    }

    pub fn zeros(num_envs: usize, dim: usize) -> Self {
        Self {
            num_envs,
            dim,
            data: vec![0.0; num_envs * dim],
        }
    }

    pub const fn num_envs(&self) -> usize {
        self.num_envs
    }

    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Row slice for one environment.
    pub fn env(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Single-environment row as an owned [`Observation`].
    pub fn row(&self, i: usize) -> Observation {
        Observation::new(self.env(i).to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_new_and_len() {
        let obs = Observation::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(obs.len(), 3);
        assert!(!obs.is_empty());
    }

    #[test]
    fn observation_zeros() {
        let obs = Observation::zeros(5);
        assert_eq!(obs.len(), 5);
        assert_eq!(obs.as_slice(), &[0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn observation_indexing_and_mut() {
        let mut obs = Observation::new(vec![10.0, 20.0]);
        assert!((obs[0] - 10.0).abs() < f32::EPSILON);
        obs.as_mut_slice()[1] = 99.0;
        assert!((obs[1] - 99.0).abs() < f32::EPSILON);
    }

    #[test]
    fn observation_from_vec_roundtrip() {
        let obs: Observation = vec![4.0, 5.0].into();
        assert_eq!(obs.into_vec(), vec![4.0, 5.0]);
    }

    #[test]
    fn observation_serialize_roundtrip() {
        let obs = Observation::new(vec![1.0, 2.0, 3.0]);
        let json = serde_json::to_string(&obs).unwrap();
        let obs2: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(obs, obs2);
    }

    #[test]
    fn batch_observation_rows() {
        let b = BatchObservation::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(b.num_envs(), 2);
        assert_eq!(b.dim(), 3);
        assert_eq!(b.env(0), &[1.0, 2.0, 3.0]);
        assert_eq!(b.env(1), &[4.0, 5.0, 6.0]);
        assert_eq!(b.row(1).as_slice(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn batch_observation_zeros() {
        let b = BatchObservation::zeros(3, 4);
        assert_eq!(b.as_slice().len(), 12);
        assert!(b.as_slice().iter().all(|v| v.abs() < f32::EPSILON));
    }

    #[test]
    #[should_panic(expected = "data length")]
    fn batch_observation_length_mismatch_panics() {
        let _ = BatchObservation::new(2, 3, vec![0.0; 5]);
    }
}
