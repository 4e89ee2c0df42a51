//! The synchronization bridge itself.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use ambler_core::error::ShapeError;
use ambler_mjcf::AssetMap;
use ambler_sim::{KeyframeId, SceneError, SceneModel, SceneState, forward};
use ambler_vec::{BatchModel, BatchState, DofView};

use crate::index_map::CoordinateIndexMap;

/// Errors from bridge operations that touch both representations.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Owns the reference model and its mutable state, plus the coordinate
/// index map built once at construction.
///
/// Callers never hold a lasting mutable reference into the bridge; they get
/// transient read access to the reference state from
/// [`synchronize`](Self::synchronize) and nothing else.
#[derive(Debug)]
pub struct SyncBridge {
    model: Arc<SceneModel>,
    state: SceneState,
    map: CoordinateIndexMap,
}

impl SyncBridge {
    /// Load a scene description from disk (with optional in-memory assets),
    /// compile it, and build the index map.
    ///
    /// Any parse failure or missing asset is a fatal construction error;
    /// no partially-built bridge is left behind.
    pub fn from_path(path: impl AsRef<Path>, assets: Option<&AssetMap>) -> Result<Self, SceneError> {
        let model = Arc::new(SceneModel::from_file(path, assets)?);
        Ok(Self::from_shared(model))
    }

    /// Compile from an XML string (primarily for tests and tooling).
    pub fn from_str(xml: &str, assets: Option<&AssetMap>) -> Result<Self, SceneError> {
        let model = Arc::new(SceneModel::from_str(xml, assets)?);
        Ok(Self::from_shared(model))
    }

    /// Build over an already-compiled model, sharing it with the caller.
    pub fn from_shared(model: Arc<SceneModel>) -> Self {
        let state = model.make_state();
        let map = CoordinateIndexMap::from_model(&model);
        Self { model, state, map }
    }

    pub fn model(&self) -> &SceneModel {
        &self.model
    }

    pub fn shared_model(&self) -> Arc<SceneModel> {
        Arc::clone(&self.model)
    }

    /// Read access to the reference state (world poses are only as fresh
    /// as the last `forward`/`synchronize` call).
    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn index_map(&self) -> &CoordinateIndexMap {
        &self.map
    }

    /// Reset the reference state to the model's default configuration.
    pub fn reset(&mut self) {
        self.state.reset(&self.model);
    }

    /// Recompute derived world poses from the current generalized
    /// positions. Pure recomputation; no time integration, no coordinate
    /// translation.
    pub fn forward(&mut self) {
        forward(&self.model, &mut self.state);
    }

    /// Mirror a vectorized generalized-position buffer into the reference
    /// state and recompute forward kinematics.
    ///
    /// The buffer's trailing dimension must equal the reference model's
    /// `nq`; otherwise a shape error is returned and the reference state is
    /// untouched. Batched views are narrowed to their first row.
    pub fn synchronize(&mut self, dof_pos: DofView<'_>) -> Result<&SceneState, ShapeError> {
        let expected = self.model.nq;
        let got = dof_pos.trailing_dim();
        if got != expected {
            return Err(ShapeError::DofPosMismatch { expected, got });
        }

        self.map
            .scatter(|i| dof_pos.get(i), self.state.qpos.as_mut_slice());
        forward(&self.model, &mut self.state);
        Ok(&self.state)
    }

    /// Reset the reference state, load a keyframe into it, run forward
    /// kinematics, then write the resulting pose back into the vectorized
    /// state — generalized positions through the inverse index map,
    /// velocities and controls verbatim — broadcast to every environment.
    pub fn load_keyframe(
        &mut self,
        vec_state: &mut BatchState,
        vec_model: &BatchModel,
        key: impl Into<KeyframeId>,
    ) -> Result<(), BridgeError> {
        // The two representations must describe the same scene.
        if vec_model.model().nq != self.model.nq {
            return Err(ShapeError::DofPosMismatch {
                expected: self.model.nq,
                got: vec_model.model().nq,
            }
            .into());
        }

        self.state.reset(&self.model);
        let keyframe = self.model.keyframe(key)?.clone();
        self.state.load_keyframe(&keyframe);
        forward(&self.model, &mut self.state);

        let dof_pos = self.map.gather(self.state.qpos.as_slice());
        vec_state.broadcast_dof_pos(&dof_pos).map_err(BridgeError::from)?;
        vec_state
            .broadcast_dof_vel(self.state.qvel.as_slice())
            .map_err(BridgeError::from)?;
        vec_state
            .broadcast_ctrl(self.state.ctrl.as_slice())
            .map_err(BridgeError::from)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
