//! Static geometry snapshot and the geom filter applied before tracing.

use nalgebra::{Matrix3, Vector3};

use ambler_sim::{SceneModel, SceneState};

use crate::raycast::GeomShape;

// ---------------------------------------------------------------------------
// GeomFilter
// ---------------------------------------------------------------------------

/// Selects which geoms the sensor can see.
///
/// `group_mask` is a byte per collision group (0-5): nonzero means the
/// group is visible. `exclude_body` removes the robot's own base body so
/// rays never hit the sensor's carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeomFilter {
    pub group_mask: [u8; 6],
    pub exclude_body: Option<usize>,
}

impl GeomFilter {
    /// Visibility mask for a single group, nothing excluded.
    pub fn group_only(group: usize) -> Self {
        let mut mask = [0u8; 6];
        mask[group] = 1;
        Self {
            group_mask: mask,
            exclude_body: None,
        }
    }

    pub fn with_exclude_body(mut self, body_id: usize) -> Self {
        self.exclude_body = Some(body_id);
        self
    }

    /// Whether the tracer should see this geom.
    pub fn includes(&self, model: &SceneModel, geom_id: usize) -> bool {
        let group = model.geom_group[geom_id] as usize;
        if self.group_mask[group] == 0 {
            return false;
        }
        self.exclude_body != Some(model.geom_body[geom_id])
    }
}

impl Default for GeomFilter {
    /// Everything visible, nothing excluded.
    fn default() -> Self {
        Self {
            group_mask: [1; 6],
            exclude_body: None,
        }
    }
}

// ---------------------------------------------------------------------------
// GeometrySnapshot
// ---------------------------------------------------------------------------

/// One filtered geom with its world pose at capture time.
#[derive(Debug, Clone)]
pub struct GeomPose {
    pub geom_id: usize,
    pub shape: GeomShape,
    pub pos: Vector3<f64>,
    pub mat: Matrix3<f64>,
}

/// World poses of every visible geom, captured once after an initial
/// forward-kinematics pass and shared (conceptually broadcast) across all
/// `num_envs` parallel environments.
///
/// The snapshot is never refreshed: only geometry that is static over the
/// simulation's lifetime is observed correctly. Mesh geoms are dropped
/// here because the tracer has no mesh support.
#[derive(Debug, Clone)]
pub struct GeometrySnapshot {
    geoms: Vec<GeomPose>,
    num_envs: usize,
}

impl GeometrySnapshot {
    /// Read world geom poses out of the reference state. The caller is
    /// responsible for having run a forward pass first.
    pub fn capture(
        model: &SceneModel,
        state: &SceneState,
        filter: &GeomFilter,
        num_envs: usize,
    ) -> Self {
        let mut geoms = Vec::new();
        for geom_id in 0..model.ngeom {
            if !filter.includes(model, geom_id) {
                continue;
            }
            let Some(shape) = GeomShape::from_geom(model.geom_type[geom_id], &model.geom_size[geom_id])
            else {
                continue; // mesh
            };
            geoms.push(GeomPose {
                geom_id,
                shape,
                pos: state.geom_xpos[geom_id],
                mat: state.geom_xmat[geom_id],
            });
        }
        Self { geoms, num_envs }
    }

    pub fn geoms(&self) -> &[GeomPose] {
        &self.geoms
    }

    pub const fn num_envs(&self) -> usize {
        self.num_envs
    }

    pub fn is_empty(&self) -> bool {
        self.geoms.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
