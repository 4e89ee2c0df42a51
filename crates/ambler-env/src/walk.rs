//! Base quadruped walk task: vectorized model/state ownership and the
//! proprioceptive observation.

use std::sync::Arc;

use ambler_core::types::BatchObservation;
use ambler_sim::SceneModel;
use ambler_vec::{BatchModel, BatchState};

use crate::config::WalkConfig;
use crate::error::EnvError;

/// The underlying locomotion task. The lidar overlay delegates to it for
/// the raw state observation.
#[derive(Debug)]
pub struct WalkTask {
    cfg: WalkConfig,
    batch: BatchModel,
}

impl WalkTask {
    /// Load the scene from `cfg.model_file` and build the task.
    pub fn new(cfg: WalkConfig, num_envs: usize) -> Result<Self, EnvError> {
        cfg.validate()?;
        let model = Arc::new(SceneModel::from_file(&cfg.model_file, None)?);
        Ok(Self::from_shared(cfg, model, num_envs))
    }

    /// Build over an already-compiled model (tests, overlay reuse).
    pub fn from_shared(cfg: WalkConfig, model: Arc<SceneModel>, num_envs: usize) -> Self {
        let batch = BatchModel::new(model, num_envs);
        Self { cfg, batch }
    }

    pub fn config(&self) -> &WalkConfig {
        &self.cfg
    }

    pub fn batch_model(&self) -> &BatchModel {
        &self.batch
    }

    pub fn shared_model(&self) -> Arc<SceneModel> {
        self.batch.shared_model()
    }

    pub fn num_envs(&self) -> usize {
        self.batch.num_envs()
    }

    /// Allocate a batched state at the default configuration.
    pub fn make_state(&self) -> BatchState {
        self.batch.make_state()
    }

    /// Observation width: generalized positions plus velocities.
    pub fn obs_dim(&self) -> usize {
        let m = self.batch.model();
        m.nq + m.nv
    }

    /// Proprioceptive observation: `[dof_pos, dof_vel]` per environment.
    pub fn observe(&self, state: &BatchState) -> BatchObservation {
        let m = self.batch.model();
        let dim = m.nq + m.nv;
        let num_envs = state.num_envs();
        let mut data = Vec::with_capacity(num_envs * dim);
        for env in 0..num_envs {
            for c in 0..m.nq {
                data.push(state.dof_pos()[(env, c)] as f32);
            }
            for c in 0..m.nv {
                data.push(state.dof_vel()[(env, c)] as f32);
            }
        }
        BatchObservation::new(num_envs, dim, data)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    const SCENE: &str = r#"
        <mujoco>
          <worldbody>
            <body name="base" pos="0 0 0.4">
              <freejoint/>
              <geom type="box" size="0.2 0.1 0.05"/>
              <body name="leg">
                <joint name="hip" type="hinge"/>
                <geom type="capsule" size="0.02 0.1"/>
              </body>
            </body>
          </worldbody>
          <actuator><motor joint="hip"/></actuator>
        </mujoco>
    "#;

    fn task(num_envs: usize) -> WalkTask {
        let model = Arc::new(SceneModel::from_str(SCENE, None).unwrap());
        WalkTask::from_shared(WalkConfig::default(), model, num_envs)
    }

    #[test]
    fn observation_dimensions() {
        let t = task(2);
        // nq = 8, nv = 7
        assert_eq!(t.obs_dim(), 15);
        let state = t.make_state();
        let obs = t.observe(&state);
        assert_eq!(obs.num_envs(), 2);
        assert_eq!(obs.dim(), 15);
    }

    #[test]
    fn observation_reflects_state() {
        let t = task(2);
        let mut state = t.make_state();
        let mut rows = state.dof_pos().clone();
        rows[(1, 0)] = 3.5;
        state.set_dof_pos(&rows).unwrap();
        let mut vel = DMatrix::zeros(2, 7);
        vel[(1, 6)] = -2.0;
        state.set_dof_vel(&vel).unwrap();

        let obs = t.observe(&state);
        assert!((obs.env(1)[0] - 3.5).abs() < 1e-6);
        assert!((obs.env(1)[8 + 6] - (-2.0)).abs() < 1e-6);
        // Env 0 untouched.
        assert!(obs.env(0)[0].abs() < 1e-6);
    }

    #[test]
    fn new_fails_on_missing_scene_file() {
        let cfg = WalkConfig {
            model_file: "/nonexistent/scene.xml".into(),
            ..WalkConfig::default()
        };
        assert!(matches!(
            WalkTask::new(cfg, 1),
            Err(EnvError::Scene(_))
        ));
    }
}
