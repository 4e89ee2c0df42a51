//! Forward kinematics: world poses from generalized positions.
//!
//! Traverses the kinematic tree from root to leaves (bodies are stored in
//! topological order), composing each body's frame from its parent frame,
//! its fixed offset, and its joints, then derives geom and site world poses.

use nalgebra::{Matrix3, Quaternion, Unit, UnitQuaternion, Vector3};

use ambler_mjcf::JointType;

use crate::model::SceneModel;
use crate::state::SceneState;

// ---------------------------------------------------------------------------
// QuatLayout
// ---------------------------------------------------------------------------

/// Component order of quaternion blocks inside a generalized-position
/// vector. The reference layout stores `(w, x, y, z)`; the vectorized
/// engine's layout stores `(x, y, z, w)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuatLayout {
    Wxyz,
    Xyzw,
}

impl QuatLayout {
    /// Read a unit quaternion from a 4-component block in this layout.
    pub fn read(self, block: &[f64]) -> UnitQuaternion<f64> {
        let q = match self {
            Self::Wxyz => Quaternion::new(block[0], block[1], block[2], block[3]),
            Self::Xyzw => Quaternion::new(block[3], block[0], block[1], block[2]),
        };
        UnitQuaternion::from_quaternion(q)
    }
}

// ---------------------------------------------------------------------------
// Body poses
// ---------------------------------------------------------------------------

/// Compute world position and orientation of every body from `qpos`.
///
/// `layout` selects the quaternion component order of free/ball joint
/// blocks in `qpos`; everything else is layout-independent.
pub fn body_poses(
    model: &SceneModel,
    qpos: &[f64],
    layout: QuatLayout,
) -> (Vec<Vector3<f64>>, Vec<UnitQuaternion<f64>>) {
    assert_eq!(qpos.len(), model.nq, "qpos length must equal nq");

    let mut xpos = vec![Vector3::zeros(); model.nbody];
    let mut xquat = vec![UnitQuaternion::identity(); model.nbody];

    for body_id in 1..model.nbody {
        let parent_id = model.body_parent[body_id];

        let mut pos = xpos[parent_id];
        let mut quat = xquat[parent_id];

        // Fixed body offset in the parent frame.
        pos += quat * model.body_pos[body_id];
        quat *= model.body_quat[body_id];

        let jnt_start = model.body_jnt_adr[body_id];
        let jnt_end = jnt_start + model.body_jnt_num[body_id];

        for jnt_id in jnt_start..jnt_end {
            let adr = model.jnt_qpos_adr[jnt_id];

            match model.jnt_type[jnt_id] {
                JointType::Hinge => {
                    let angle = qpos[adr];
                    let world_anchor = pos + quat * model.jnt_pos[jnt_id];
                    let world_axis = quat * model.jnt_axis[jnt_id];
                    let rot = match Unit::try_new(world_axis, 1e-10) {
                        Some(axis) => UnitQuaternion::from_axis_angle(&axis, angle),
                        None => UnitQuaternion::identity(),
                    };
                    quat = rot * quat;
                    pos = world_anchor + rot * (pos - world_anchor);
                }
                JointType::Slide => {
                    let displacement = qpos[adr];
                    pos += quat * (model.jnt_axis[jnt_id] * displacement);
                }
                JointType::Ball => {
                    quat *= layout.read(&qpos[adr..adr + 4]);
                }
                JointType::Free => {
                    // A free joint gives the body its world pose directly.
                    pos = Vector3::new(qpos[adr], qpos[adr + 1], qpos[adr + 2]);
                    quat = layout.read(&qpos[adr + 3..adr + 7]);
                }
            }
        }

        xpos[body_id] = pos;
        xquat[body_id] = quat;
    }

    (xpos, xquat)
}

/// Forward kinematics over the reference state: recompute all derived
/// world-frame quantities from `state.qpos` without advancing time.
pub fn forward(model: &SceneModel, state: &mut SceneState) {
    let (xpos, xquat) = body_poses(model, state.qpos.as_slice(), QuatLayout::Wxyz);

    for body_id in 0..model.nbody {
        state.xpos[body_id] = xpos[body_id];
        state.xquat[body_id] = xquat[body_id];
        state.xmat[body_id] = xquat[body_id].to_rotation_matrix().into_inner();
    }

    for geom_id in 0..model.ngeom {
        let body_id = model.geom_body[geom_id];
        state.geom_xpos[geom_id] = xpos[body_id] + xquat[body_id] * model.geom_pos[geom_id];
        state.geom_xmat[geom_id] = (xquat[body_id] * model.geom_quat[geom_id])
            .to_rotation_matrix()
            .into_inner();
    }

    for site_id in 0..model.nsite {
        let body_id = model.site_body[site_id];
        state.site_xpos[site_id] = xpos[body_id] + xquat[body_id] * model.site_pos[site_id];
        state.site_xmat[site_id] = (xquat[body_id] * model.site_quat[site_id])
            .to_rotation_matrix()
            .into_inner();
    }
}

/// World pose of a single site for the given `qpos` and layout.
///
/// Used by the vectorized facade to resolve live sensor-mount poses without
/// materializing a full state.
pub fn site_pose(
    model: &SceneModel,
    qpos: &[f64],
    layout: QuatLayout,
    site_id: usize,
) -> (Vector3<f64>, Matrix3<f64>) {
    let (xpos, xquat) = body_poses(model, qpos, layout);
    let body_id = model.site_body[site_id];
    let pos = xpos[body_id] + xquat[body_id] * model.site_pos[site_id];
    let mat = (xquat[body_id] * model.site_quat[site_id])
        .to_rotation_matrix()
        .into_inner();
    (pos, mat)
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
            <body name="base" pos="0 0 0.5">
              <freejoint/>
              <geom name="trunk" type="box" size="0.2 0.1 0.05"/>
              <site name="lidar" pos="0.1 0 0.0"/>
              <body name="arm" pos="0.3 0 0">
                <joint name="shoulder" type="hinge" axis="0 0 1"/>
                <geom type="capsule" size="0.02 0.1"/>
              </body>
            </body>
          </worldbody>
        </mujoco>
    "#;

    #[test]
    fn free_joint_places_body_absolutely() {
        let model = SceneModel::from_str(SCENE, None).unwrap();
        let mut state = model.make_state();
        state.qpos[0] = 1.0;
        state.qpos[1] = -2.0;
        state.qpos[2] = 3.0;
        forward(&model, &mut state);
        let base = model.body("base").unwrap();
        assert!((state.xpos[base] - Vector3::new(1.0, -2.0, 3.0)).norm() < 1e-12);
    }

    #[test]
    fn hinge_rotates_child_about_anchor() {
        let model = SceneModel::from_str(SCENE, None).unwrap();
        let mut state = model.make_state();
        // Rotate the shoulder 90 degrees about +z.
        state.qpos[7] = FRAC_PI_2;
        forward(&model, &mut state);
        let arm = model.body("arm").unwrap();
        // Arm frame origin stays at the anchor (joint pos = body origin).
        assert!((state.xpos[arm] - Vector3::new(0.3, 0.0, 0.5)).norm() < 1e-12);
        // Its x-axis now points along world +y.
        let x_axis = state.xmat[arm] * Vector3::x();
        assert!((x_axis - Vector3::y()).norm() < 1e-9);
    }

    #[test]
    fn site_tracks_body_frame() {
        let model = SceneModel::from_str(SCENE, None).unwrap();
        let mut state = model.make_state();
        // Yaw the base 90 degrees: site offset (0.1, 0, 0) maps to (0, 0.1, 0).
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        state.qpos[3] = yaw.w;
        state.qpos[4] = yaw.i;
        state.qpos[5] = yaw.j;
        state.qpos[6] = yaw.k;
        forward(&model, &mut state);
        let site = model.site("lidar").unwrap();
        assert!((state.site_xpos[site] - Vector3::new(0.0, 0.1, 0.5)).norm() < 1e-9);
    }

    #[test]
    fn layouts_agree_after_component_reorder() {
        let model = SceneModel::from_str(SCENE, None).unwrap();
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.7);

        let mut q_wxyz = model.qpos0.as_slice().to_vec();
        q_wxyz[3] = yaw.w;
        q_wxyz[4] = yaw.i;
        q_wxyz[5] = yaw.j;
        q_wxyz[6] = yaw.k;

        let mut q_xyzw = q_wxyz.clone();
        q_xyzw[3] = yaw.i;
        q_xyzw[4] = yaw.j;
        q_xyzw[5] = yaw.k;
        q_xyzw[6] = yaw.w;

        let (pos_a, quat_a) = body_poses(&model, &q_wxyz, QuatLayout::Wxyz);
        let (pos_b, quat_b) = body_poses(&model, &q_xyzw, QuatLayout::Xyzw);
        for i in 0..model.nbody {
            assert!((pos_a[i] - pos_b[i]).norm() < 1e-12);
            assert!(quat_a[i].angle_to(&quat_b[i]) < 1e-12);
        }
    }

    #[test]
    fn site_pose_matches_full_forward() {
        let model = SceneModel::from_str(SCENE, None).unwrap();
        let mut state = model.make_state();
        state.qpos[0] = 0.4;
        state.qpos[7] = 0.3;
        forward(&model, &mut state);

        let site = model.site("lidar").unwrap();
        let (pos, mat) = site_pose(&model, state.qpos.as_slice(), QuatLayout::Wxyz, site);
        assert!((pos - state.site_xpos[site]).norm() < 1e-12);
        assert!((mat - state.site_xmat[site]).norm() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "qpos length must equal nq")]
    fn wrong_qpos_length_panics() {
        let model = SceneModel::from_str(SCENE, None).unwrap();
        let _ = body_poses(&model, &[0.0; 3], QuatLayout::Wxyz);
    }
}
