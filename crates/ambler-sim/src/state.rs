//! Mutable per-step state buffers for a compiled model.

use nalgebra::{DVector, Matrix3, UnitQuaternion, Vector3};

use crate::fk;
use crate::model::{Keyframe, SceneModel};

/// Mutable simulation state: generalized coordinates plus derived
/// world-frame quantities filled in by [`forward`](crate::fk::forward).
///
/// Owned exclusively by one caller and overwritten in place; no buffer is
/// ever reallocated after construction.
#[derive(Debug, Clone)]
pub struct SceneState {
    /// Generalized positions (length nq), quaternions in `(w, x, y, z)` order.
    pub qpos: DVector<f64>,
    /// Generalized velocities (length nv).
    pub qvel: DVector<f64>,
    /// Control signals (length nu).
    pub ctrl: DVector<f64>,

    // Derived world-frame quantities (valid after `forward`).
    pub xpos: Vec<Vector3<f64>>,
    pub xquat: Vec<UnitQuaternion<f64>>,
    pub xmat: Vec<Matrix3<f64>>,
    pub geom_xpos: Vec<Vector3<f64>>,
    pub geom_xmat: Vec<Matrix3<f64>>,
    pub site_xpos: Vec<Vector3<f64>>,
    pub site_xmat: Vec<Matrix3<f64>>,
}

impl SceneState {
    /// Allocate state at the model's default configuration, with derived
    /// quantities already computed.
    pub fn new(model: &SceneModel) -> Self {
        let mut state = Self {
            qpos: model.qpos0.clone(),
            qvel: DVector::zeros(model.nv),
            ctrl: DVector::zeros(model.nu),
            xpos: vec![Vector3::zeros(); model.nbody],
            xquat: vec![UnitQuaternion::identity(); model.nbody],
            xmat: vec![Matrix3::identity(); model.nbody],
            geom_xpos: vec![Vector3::zeros(); model.ngeom],
            geom_xmat: vec![Matrix3::identity(); model.ngeom],
            site_xpos: vec![Vector3::zeros(); model.nsite],
            site_xmat: vec![Matrix3::identity(); model.nsite],
        };
        fk::forward(model, &mut state);
        state
    }

    /// Reset to the model's default configuration (qpos0, zero velocities
    /// and controls). Derived quantities are left stale until the next
    /// [`forward`](crate::fk::forward) call.
    pub fn reset(&mut self, model: &SceneModel) {
        self.qpos.copy_from(&model.qpos0);
        self.qvel.fill(0.0);
        self.ctrl.fill(0.0);
    }

    /// Load a keyframe's qpos/qvel/ctrl into this state.
    pub fn load_keyframe(&mut self, key: &Keyframe) {
        self.qpos.copy_from(&key.qpos);
        self.qvel.copy_from(&key.qvel);
        self.ctrl.copy_from(&key.ctrl);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
