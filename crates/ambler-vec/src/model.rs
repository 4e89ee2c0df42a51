//! Batched model wrapper and live site pose queries.

use std::sync::Arc;

use nalgebra::{Matrix3, Vector3};

use ambler_sim::{QuatLayout, SceneError, SceneModel, site_pose};

use crate::state::BatchState;

/// Shared compiled model plus the batch dimension. All environments share
/// one model (same nq/nv, same body tree); only state differs per row.
#[derive(Debug, Clone)]
pub struct BatchModel {
    model: Arc<SceneModel>,
    num_envs: usize,
}

impl BatchModel {
    pub fn new(model: Arc<SceneModel>, num_envs: usize) -> Self {
        Self { model, num_envs }
    }

    pub const fn num_envs(&self) -> usize {
        self.num_envs
    }

    pub fn model(&self) -> &SceneModel {
        &self.model
    }

    pub fn shared_model(&self) -> Arc<SceneModel> {
        Arc::clone(&self.model)
    }

    /// Allocate a batched state at the default configuration.
    pub fn make_state(&self) -> BatchState {
        BatchState::new(&self.model, self.num_envs)
    }

    /// Resolve a named site into a handle for live pose queries.
    pub fn site(&self, name: &str) -> Result<SiteRef, SceneError> {
        Ok(SiteRef {
            id: self.model.site(name)?,
        })
    }
}

// ---------------------------------------------------------------------------
// SiteRef
// ---------------------------------------------------------------------------

/// Handle to a named reference point. Pose queries always evaluate against
/// the **live** batched state, never against any cached snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteRef {
    pub id: usize,
}

impl SiteRef {
    /// World pose of this site in one environment.
    pub fn pose(
        &self,
        model: &BatchModel,
        state: &BatchState,
        env: usize,
    ) -> (Vector3<f64>, Matrix3<f64>) {
        let row = state.env_dof_pos(env);
        site_pose(model.model(), &row, QuatLayout::Xyzw, self.id)
    }

    /// World position of this site in one environment.
    pub fn position(&self, model: &BatchModel, state: &BatchState, env: usize) -> Vector3<f64> {
        self.pose(model, state, env).0
    }

    /// World rotation matrix of this site in one environment.
    pub fn rotation(&self, model: &BatchModel, state: &BatchState, env: usize) -> Matrix3<f64> {
        self.pose(model, state, env).1
    }

    /// World poses across the whole batch.
    pub fn poses(
        &self,
        model: &BatchModel,
        state: &BatchState,
    ) -> Vec<(Vector3<f64>, Matrix3<f64>)> {
        (0..state.num_envs())
            .map(|env| self.pose(model, state, env))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const SCENE: &str = r#"
        <mujoco>
          <worldbody>
            <body name="base" pos="0 0 0.4">
              <freejoint/>
              <geom type="box" size="0.2 0.1 0.05"/>
              <site name="lidar" pos="0.1 0 0.08"/>
            </body>
          </worldbody>
        </mujoco>
    "#;

    fn batch_model(num_envs: usize) -> BatchModel {
        let model = Arc::new(SceneModel::from_str(SCENE, None).unwrap());
        BatchModel::new(model, num_envs)
    }

    #[test]
    fn site_lookup_by_name() {
        let bm = batch_model(2);
        assert!(bm.site("lidar").is_ok());
        assert!(matches!(
            bm.site("imu"),
            Err(SceneError::MissingSite(_))
        ));
    }

    #[test]
    fn site_pose_tracks_live_state() {
        let bm = batch_model(2);
        let mut state = bm.make_state();
        let site = bm.site("lidar").unwrap();

        // Default: base at (0, 0, 0.4), site offset (0.1, 0, 0.08).
        let p0 = site.position(&bm, &state, 0);
        assert!((p0 - Vector3::new(0.1, 0.0, 0.48)).norm() < 1e-12);

        // Move env 1 and yaw it 90 degrees; env 0 must be unaffected.
        let mut rows = state.dof_pos().clone();
        rows[(1, 0)] = 1.0; // x
        // Quaternion (x, y, z, w) for a 90-degree yaw.
        let half = FRAC_PI_2 / 2.0;
        rows[(1, 3)] = 0.0;
        rows[(1, 4)] = 0.0;
        rows[(1, 5)] = half.sin();
        rows[(1, 6)] = half.cos();
        state.set_dof_pos(&rows).unwrap();

        let p0 = site.position(&bm, &state, 0);
        assert!((p0 - Vector3::new(0.1, 0.0, 0.48)).norm() < 1e-12);

        let p1 = site.position(&bm, &state, 1);
        // Site offset (0.1, 0, 0.08) yawed to (0, 0.1, 0.08), base at (1, 0, 0.4).
        assert!((p1 - Vector3::new(1.0, 0.1, 0.48)).norm() < 1e-9);

        let r1 = site.rotation(&bm, &state, 1);
        let x_axis = r1 * Vector3::x();
        assert!((x_axis - Vector3::y()).norm() < 1e-9);
    }

    #[test]
    fn poses_covers_every_env() {
        let bm = batch_model(3);
        let state = bm.make_state();
        let site = bm.site("lidar").unwrap();
        let poses = site.poses(&bm, &state);
        assert_eq!(poses.len(), 3);
        for (pos, _) in &poses {
            assert!((pos - Vector3::new(0.1, 0.0, 0.48)).norm() < 1e-12);
        }
    }
}
