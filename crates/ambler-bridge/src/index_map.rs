//! Generalized-coordinate index mapping between the two engine layouts.

use ambler_mjcf::JointType;
use ambler_sim::SceneModel;

/// Permutation of length `nq` mapping vectorized-layout coordinate `i` to
/// its reference-layout position `map[i]`.
///
/// For every free-jointed 6-DOF body the four quaternion entries following
/// the three translational entries are rotated so that the vectorized
/// `(x, y, z, w)` block lands in the reference `(w, x, y, z)` slots; every
/// other entry maps identity. Immutable after construction; recompute only
/// if the scene description changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateIndexMap {
    map: Vec<usize>,
}

impl CoordinateIndexMap {
    /// Scan the model's bodies and build the map.
    ///
    /// A body qualifies only if it has exactly 6 degrees of freedom *and*
    /// its governing joint is a free joint. A 6-DOF body assembled from
    /// scalar joints keeps the identity mapping; the joint-type check is
    /// load-bearing.
    pub fn from_model(model: &SceneModel) -> Self {
        let mut map: Vec<usize> = (0..model.nq).collect();

        for body_id in 1..model.nbody {
            if model.body_dof_num[body_id] != 6 || model.body_jnt_num[body_id] == 0 {
                continue;
            }
            let jnt_id = model.body_jnt_adr[body_id];
            if model.jnt_type[jnt_id] != JointType::Free {
                continue;
            }
            // xyz + quat(x,y,z,w) -> xyz + quat(w,x,y,z)
            let adr = model.jnt_qpos_adr[jnt_id];
            map[adr + 3] = adr + 4;
            map[adr + 4] = adr + 5;
            map[adr + 5] = adr + 6;
            map[adr + 6] = adr + 3;
        }

        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.map
    }

    /// Scatter a vectorized-layout buffer into a reference-layout buffer:
    /// `dst[map[i]] = src(i)`.
    pub fn scatter(&self, src: impl Fn(usize) -> f64, dst: &mut [f64]) {
        for (i, &j) in self.map.iter().enumerate() {
            dst[j] = src(i);
        }
    }

    /// Gather a reference-layout buffer into vectorized order:
    /// `out[i] = src[map[i]]`. Exact inverse of [`scatter`](Self::scatter).
    pub fn gather(&self, src: &[f64]) -> Vec<f64> {
        self.map.iter().map(|&j| src[j]).collect()
    }
}

impl std::ops::Index<usize> for CoordinateIndexMap {
    type Output = usize;
    fn index(&self, i: usize) -> &usize {
        &self.map[i]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
