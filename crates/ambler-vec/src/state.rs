//! Batched state buffers and the state view handed to the bridge.

use nalgebra::DMatrix;

use ambler_core::error::ShapeError;
use ambler_mjcf::JointType;
use ambler_sim::SceneModel;

// ---------------------------------------------------------------------------
// DofView
// ---------------------------------------------------------------------------

/// Read-only view of a vectorized generalized-position buffer.
///
/// The bridge accepts both a single environment's flat buffer and a batched
/// buffer. The variant is explicit: there is no runtime shape sniffing, and
/// batched synchronization is documented to read **row 0 only**.
#[derive(Debug, Clone, Copy)]
pub enum DofView<'a> {
    /// One environment: a flat buffer of length `nq`.
    Single(&'a [f64]),
    /// `num_envs` rows of length `nq`. Only the first row is synchronized.
    Batched(&'a DMatrix<f64>),
}

impl DofView<'_> {
    /// Length of the trailing (per-environment) dimension.
    pub fn trailing_dim(&self) -> usize {
        match self {
            Self::Single(buf) => buf.len(),
            Self::Batched(m) => m.ncols(),
        }
    }

    /// Element `i` of the synchronized row (row 0 for batched views).
    pub fn get(&self, i: usize) -> f64 {
        match self {
            Self::Single(buf) => buf[i],
            Self::Batched(m) => m[(0, i)],
        }
    }
}

impl<'a> From<&'a [f64]> for DofView<'a> {
    fn from(buf: &'a [f64]) -> Self {
        Self::Single(buf)
    }
}

impl<'a> From<&'a DMatrix<f64>> for DofView<'a> {
    fn from(m: &'a DMatrix<f64>) -> Self {
        Self::Batched(m)
    }
}

// ---------------------------------------------------------------------------
// BatchState
// ---------------------------------------------------------------------------

/// Mutable batched state: one row per parallel environment.
#[derive(Debug, Clone)]
pub struct BatchState {
    num_envs: usize,
    /// `[num_envs x nq]`, quaternion blocks in `(x, y, z, w)` order.
    dof_pos: DMatrix<f64>,
    /// `[num_envs x nv]`.
    dof_vel: DMatrix<f64>,
    /// `[num_envs x nu]`.
    ctrl: DMatrix<f64>,
}

impl BatchState {
    /// Allocate a batch at the model's default configuration, translated
    /// into this engine's `(x, y, z, w)` layout.
    pub fn new(model: &SceneModel, num_envs: usize) -> Self {
        let row = vec_layout_qpos0(model);
        let dof_pos = DMatrix::from_fn(num_envs, model.nq, |_, c| row[c]);
        Self {
            num_envs,
            dof_pos,
            dof_vel: DMatrix::zeros(num_envs, model.nv),
            ctrl: DMatrix::zeros(num_envs, model.nu),
        }
    }

    pub const fn num_envs(&self) -> usize {
        self.num_envs
    }

    pub fn dof_pos(&self) -> &DMatrix<f64> {
        &self.dof_pos
    }

    pub fn dof_vel(&self) -> &DMatrix<f64> {
        &self.dof_vel
    }

    pub fn ctrl(&self) -> &DMatrix<f64> {
        &self.ctrl
    }

    /// Batched view of the generalized-position buffer for the bridge.
    pub fn dof_view(&self) -> DofView<'_> {
        DofView::Batched(&self.dof_pos)
    }

    /// One environment's generalized-position row, copied out contiguously.
    pub fn env_dof_pos(&self, env: usize) -> Vec<f64> {
        self.dof_pos.row(env).iter().copied().collect()
    }

    /// Overwrite the full generalized-position buffer.
    pub fn set_dof_pos(&mut self, rows: &DMatrix<f64>) -> Result<(), ShapeError> {
        check_shape(rows, self.num_envs, self.dof_pos.ncols(), Kind::DofPos)?;
        self.dof_pos.copy_from(rows);
        Ok(())
    }

    /// Broadcast one row to every environment.
    pub fn broadcast_dof_pos(&mut self, row: &[f64]) -> Result<(), ShapeError> {
        let expected = self.dof_pos.ncols();
        if row.len() != expected {
            return Err(ShapeError::DofPosMismatch {
                expected,
                got: row.len(),
            });
        }
        broadcast(&mut self.dof_pos, row);
        Ok(())
    }

    pub fn set_dof_vel(&mut self, rows: &DMatrix<f64>) -> Result<(), ShapeError> {
        check_shape(rows, self.num_envs, self.dof_vel.ncols(), Kind::DofVel)?;
        self.dof_vel.copy_from(rows);
        Ok(())
    }

    pub fn broadcast_dof_vel(&mut self, row: &[f64]) -> Result<(), ShapeError> {
        let expected = self.dof_vel.ncols();
        if row.len() != expected {
            return Err(ShapeError::DofVelMismatch {
                expected,
                got: row.len(),
            });
        }
        broadcast(&mut self.dof_vel, row);
        Ok(())
    }

    pub fn set_ctrl(&mut self, rows: &DMatrix<f64>) -> Result<(), ShapeError> {
        check_shape(rows, self.num_envs, self.ctrl.ncols(), Kind::Ctrl)?;
        self.ctrl.copy_from(rows);
        Ok(())
    }

    pub fn broadcast_ctrl(&mut self, row: &[f64]) -> Result<(), ShapeError> {
        let expected = self.ctrl.ncols();
        if row.len() != expected {
            return Err(ShapeError::CtrlMismatch {
                expected,
                got: row.len(),
            });
        }
        broadcast(&mut self.ctrl, row);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

enum Kind {
    DofPos,
    DofVel,
    Ctrl,
}

fn broadcast(target: &mut DMatrix<f64>, row: &[f64]) {
    for env in 0..target.nrows() {
        for (c, v) in row.iter().enumerate() {
            target[(env, c)] = *v;
        }
    }
}

fn check_shape(
    rows: &DMatrix<f64>,
    num_envs: usize,
    ncols: usize,
    kind: Kind,
) -> Result<(), ShapeError> {
    if rows.nrows() != num_envs {
        return Err(ShapeError::BatchMismatch {
            expected: num_envs,
            got: rows.nrows(),
        });
    }
    if rows.ncols() != ncols {
        return Err(match kind {
            Kind::DofPos => ShapeError::DofPosMismatch {
                expected: ncols,
                got: rows.ncols(),
            },
            Kind::DofVel => ShapeError::DofVelMismatch {
                expected: ncols,
                got: rows.ncols(),
            },
            Kind::Ctrl => ShapeError::CtrlMismatch {
                expected: ncols,
                got: rows.ncols(),
            },
        });
    }
    Ok(())
}

/// The model's default qpos with every quaternion block rotated from the
/// reference `(w, x, y, z)` order into this engine's `(x, y, z, w)` order.
fn vec_layout_qpos0(model: &SceneModel) -> Vec<f64> {
    let mut row = model.qpos0.as_slice().to_vec();
    for jnt_id in 0..model.njnt {
        let adr = model.jnt_qpos_adr[jnt_id];
        let quat_adr = match model.jnt_type[jnt_id] {
            JointType::Free => Some(adr + 3),
            JointType::Ball => Some(adr),
            JointType::Hinge | JointType::Slide => None,
        };
        if let Some(qa) = quat_adr {
            let (w, x, y, z) = (row[qa], row[qa + 1], row[qa + 2], row[qa + 3]);
            row[qa] = x;
            row[qa + 1] = y;
            row[qa + 2] = z;
            row[qa + 3] = w;
        }
    }
    row
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"
        <mujoco>
          <worldbody>
            <body name="base" pos="0 0 0.4">
              <freejoint/>
              <geom type="sphere" size="0.1"/>
              <body name="leg" pos="0.1 0 0">
                <joint name="hip" type="hinge"/>
                <geom type="capsule" size="0.02 0.1"/>
              </body>
            </body>
          </worldbody>
          <actuator><motor joint="hip"/></actuator>
        </mujoco>
    "#;

    fn model() -> SceneModel {
        SceneModel::from_str(SCENE, None).unwrap()
    }

    #[test]
    fn new_state_uses_xyzw_layout() {
        let m = model();
        let state = BatchState::new(&m, 3);
        assert_eq!(state.num_envs(), 3);
        // Reference qpos0 quaternion block is (w=1, 0, 0, 0); in this
        // engine's layout the identity sits at the last slot.
        for env in 0..3 {
            assert_eq!(state.dof_pos()[(env, 2)], 0.4); // z
            assert_eq!(state.dof_pos()[(env, 3)], 0.0); // x
            assert_eq!(state.dof_pos()[(env, 6)], 1.0); // w
        }
    }

    #[test]
    fn dof_view_batched_reads_row_zero() {
        let m = model();
        let mut state = BatchState::new(&m, 2);
        let mut rows = state.dof_pos().clone();
        rows[(0, 0)] = 7.0;
        rows[(1, 0)] = 9.0;
        state.set_dof_pos(&rows).unwrap();

        let view = state.dof_view();
        assert_eq!(view.trailing_dim(), m.nq);
        assert_eq!(view.get(0), 7.0);
    }

    #[test]
    fn dof_view_single_from_slice() {
        let buf = [1.0, 2.0, 3.0];
        let view = DofView::from(&buf[..]);
        assert_eq!(view.trailing_dim(), 3);
        assert_eq!(view.get(2), 3.0);
    }

    #[test]
    fn broadcast_dof_pos_fills_every_row() {
        let m = model();
        let mut state = BatchState::new(&m, 4);
        let row: Vec<f64> = (0..m.nq).map(|i| i as f64).collect();
        state.broadcast_dof_pos(&row).unwrap();
        for env in 0..4 {
            assert_eq!(state.env_dof_pos(env), row);
        }
    }

    #[test]
    fn broadcast_wrong_length_is_shape_error() {
        let m = model();
        let mut state = BatchState::new(&m, 2);
        let err = state.broadcast_dof_pos(&[0.0; 3]).unwrap_err();
        assert_eq!(
            err,
            ShapeError::DofPosMismatch {
                expected: m.nq,
                got: 3
            }
        );
    }

    #[test]
    fn set_dof_vel_shape_checks() {
        let m = model();
        let mut state = BatchState::new(&m, 2);
        let bad_rows = DMatrix::zeros(3, m.nv);
        assert!(matches!(
            state.set_dof_vel(&bad_rows),
            Err(ShapeError::BatchMismatch { .. })
        ));
        let bad_cols = DMatrix::zeros(2, m.nv + 1);
        assert!(matches!(
            state.set_dof_vel(&bad_cols),
            Err(ShapeError::DofVelMismatch { .. })
        ));
        let ok = DMatrix::zeros(2, m.nv);
        assert!(state.set_dof_vel(&ok).is_ok());
    }

    #[test]
    fn broadcast_ctrl_fills_rows() {
        let m = model();
        let mut state = BatchState::new(&m, 2);
        state.broadcast_ctrl(&[0.5]).unwrap();
        assert_eq!(state.ctrl()[(0, 0)], 0.5);
        assert_eq!(state.ctrl()[(1, 0)], 0.5);
    }
}
