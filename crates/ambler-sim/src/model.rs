//! Compiled scene model: MuJoCo-style id and address arrays.
//!
//! # Memory Layout
//!
//! Arrays are indexed by their respective ids:
//! - `body_*` arrays indexed by `body_id` (0 = world)
//! - `jnt_*` arrays indexed by `joint_id`
//! - `geom_*` / `site_*` arrays indexed by `geom_id` / `site_id`
//!
//! Joints of one body occupy a contiguous run of the `jnt_*` arrays, and
//! `jnt_qpos_adr` / `jnt_dof_adr` give each joint's start offset in the
//! generalized position/velocity vectors.

use std::path::Path;

use nalgebra::{DVector, Quaternion, UnitQuaternion, Vector3};

use ambler_mjcf::{AssetMap, GeomKind, JointType, SceneSpec};

use crate::error::SceneError;
use crate::state::SceneState;

// ---------------------------------------------------------------------------
// Keyframe
// ---------------------------------------------------------------------------

/// A named state snapshot, sized to the model dimensions at compile time.
/// Unspecified fields of the MJCF `<key>` are filled with model defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub name: Option<String>,
    /// Generalized positions (length nq). Default: `qpos0`.
    pub qpos: DVector<f64>,
    /// Generalized velocities (length nv). Default: zeros.
    pub qvel: DVector<f64>,
    /// Control signals (length nu). Default: zeros.
    pub ctrl: DVector<f64>,
}

/// Keyframe selector: by position in the keyframe table or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyframeId {
    Index(usize),
    Name(String),
}

impl From<usize> for KeyframeId {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

impl From<&str> for KeyframeId {
    fn from(s: &str) -> Self {
        Self::Name(s.to_string())
    }
}

impl From<String> for KeyframeId {
    fn from(s: String) -> Self {
        Self::Name(s)
    }
}

// ---------------------------------------------------------------------------
// SceneModel
// ---------------------------------------------------------------------------

/// Static compiled model. Immutable after construction.
#[derive(Debug, Clone)]
pub struct SceneModel {
    pub name: String,
    pub timestep: f64,
    pub gravity: Vector3<f64>,

    // Dimensions
    /// Number of generalized position coordinates (includes quaternions).
    pub nq: usize,
    /// Number of generalized velocity coordinates (always <= nq).
    pub nv: usize,
    /// Number of actuators.
    pub nu: usize,
    /// Number of bodies (including world body 0).
    pub nbody: usize,
    /// Number of joints.
    pub njnt: usize,
    /// Number of collision geoms.
    pub ngeom: usize,
    /// Number of sites.
    pub nsite: usize,
    /// Number of keyframes.
    pub nkey: usize,

    // Bodies (0 = world)
    pub body_parent: Vec<usize>,
    pub body_pos: Vec<Vector3<f64>>,
    pub body_quat: Vec<UnitQuaternion<f64>>,
    pub body_name: Vec<Option<String>>,
    /// First joint id for this body (meaningless when `body_jnt_num` is 0).
    pub body_jnt_adr: Vec<usize>,
    pub body_jnt_num: Vec<usize>,
    /// First DOF index for this body (meaningless when `body_dof_num` is 0).
    pub body_dof_adr: Vec<usize>,
    pub body_dof_num: Vec<usize>,

    // Joints
    pub jnt_type: Vec<JointType>,
    /// The body this joint moves (its child body).
    pub jnt_body: Vec<usize>,
    /// Start index in the qpos vector.
    pub jnt_qpos_adr: Vec<usize>,
    /// Start index in the qvel vector.
    pub jnt_dof_adr: Vec<usize>,
    pub jnt_pos: Vec<Vector3<f64>>,
    pub jnt_axis: Vec<Vector3<f64>>,
    pub jnt_range: Vec<Option<[f64; 2]>>,
    pub jnt_name: Vec<Option<String>>,

    // Geoms
    pub geom_type: Vec<GeomKind>,
    pub geom_body: Vec<usize>,
    pub geom_pos: Vec<Vector3<f64>>,
    pub geom_quat: Vec<UnitQuaternion<f64>>,
    pub geom_size: Vec<Vector3<f64>>,
    pub geom_group: Vec<u8>,
    pub geom_name: Vec<Option<String>>,

    // Sites
    pub site_body: Vec<usize>,
    pub site_pos: Vec<Vector3<f64>>,
    pub site_quat: Vec<UnitQuaternion<f64>>,
    pub site_name: Vec<String>,

    // Actuators
    pub actuator_joint: Vec<usize>,
    pub actuator_name: Vec<Option<String>>,

    /// Default generalized positions (free/ball quaternions are identity
    /// unless the body frame says otherwise).
    pub qpos0: DVector<f64>,
    pub keyframes: Vec<Keyframe>,
}

impl SceneModel {
    /// Load and compile a scene description from disk.
    pub fn from_file(
        path: impl AsRef<Path>,
        assets: Option<&AssetMap>,
    ) -> Result<Self, SceneError> {
        let spec = ambler_mjcf::parse_file(path, assets)?;
        Self::compile(&spec)
    }

    /// Compile a scene description from an XML string.
    pub fn from_str(xml: &str, assets: Option<&AssetMap>) -> Result<Self, SceneError> {
        let spec = ambler_mjcf::parse_string(xml, assets)?;
        Self::compile(&spec)
    }

    /// Compile a parsed spec into an addressable model.
    pub fn compile(spec: &SceneSpec) -> Result<Self, SceneError> {
        let nbody = spec.bodies.len() + 1;

        let mut model = Self {
            name: spec.name.clone(),
            timestep: spec.timestep,
            gravity: Vector3::new(spec.gravity[0], spec.gravity[1], spec.gravity[2]),
            nq: 0,
            nv: 0,
            nu: 0,
            nbody,
            njnt: 0,
            ngeom: 0,
            nsite: 0,
            nkey: 0,
            body_parent: vec![0; nbody],
            body_pos: vec![Vector3::zeros(); nbody],
            body_quat: vec![UnitQuaternion::identity(); nbody],
            body_name: vec![None; nbody],
            body_jnt_adr: vec![0; nbody],
            body_jnt_num: vec![0; nbody],
            body_dof_adr: vec![0; nbody],
            body_dof_num: vec![0; nbody],
            jnt_type: Vec::new(),
            jnt_body: Vec::new(),
            jnt_qpos_adr: Vec::new(),
            jnt_dof_adr: Vec::new(),
            jnt_pos: Vec::new(),
            jnt_axis: Vec::new(),
            jnt_range: Vec::new(),
            jnt_name: Vec::new(),
            geom_type: Vec::new(),
            geom_body: Vec::new(),
            geom_pos: Vec::new(),
            geom_quat: Vec::new(),
            geom_size: Vec::new(),
            geom_group: Vec::new(),
            geom_name: Vec::new(),
            site_body: Vec::new(),
            site_pos: Vec::new(),
            site_quat: Vec::new(),
            site_name: Vec::new(),
            actuator_joint: Vec::new(),
            actuator_name: Vec::new(),
            qpos0: DVector::zeros(0),
            keyframes: Vec::new(),
        };
        model.body_name[0] = Some("world".to_string());

        // World geoms and sites belong to body 0.
        for geom in &spec.world_geoms {
            push_geom(&mut model, 0, geom);
        }
        for site in &spec.world_sites {
            push_site(&mut model, 0, site);
        }

        // Bodies are in document order, so every parent precedes its
        // children and a single pass assigns all addresses.
        let mut qpos_cursor = 0usize;
        let mut dof_cursor = 0usize;

        for (spec_idx, body) in spec.bodies.iter().enumerate() {
            let body_id = spec_idx + 1;
            model.body_parent[body_id] = body.parent.map_or(0, |p| p + 1);
            model.body_pos[body_id] = Vector3::new(body.pos[0], body.pos[1], body.pos[2]);
            model.body_quat[body_id] = quat_wxyz(body.quat);
            model.body_name[body_id] = body.name.clone();

            if body.joints.iter().any(|j| j.kind == JointType::Free) && body.joints.len() > 1 {
                return Err(SceneError::FreeJointNotAlone(
                    body.name.clone().unwrap_or_else(|| format!("#{body_id}")),
                ));
            }

            model.body_jnt_adr[body_id] = model.jnt_type.len();
            model.body_jnt_num[body_id] = body.joints.len();
            model.body_dof_adr[body_id] = dof_cursor;

            for joint in &body.joints {
                model.jnt_type.push(joint.kind);
                model.jnt_body.push(body_id);
                model.jnt_qpos_adr.push(qpos_cursor);
                model.jnt_dof_adr.push(dof_cursor);
                model.jnt_pos.push(Vector3::new(
                    joint.pos[0],
                    joint.pos[1],
                    joint.pos[2],
                ));
                model.jnt_axis.push(Vector3::new(
                    joint.axis[0],
                    joint.axis[1],
                    joint.axis[2],
                ));
                model.jnt_range.push(joint.range);
                model.jnt_name.push(joint.name.clone());

                qpos_cursor += joint.kind.nq();
                dof_cursor += joint.kind.nv();
            }
            model.body_dof_num[body_id] = dof_cursor - model.body_dof_adr[body_id];

            for geom in &body.geoms {
                push_geom(&mut model, body_id, geom);
            }
            for site in &body.sites {
                push_site(&mut model, body_id, site);
            }
        }

        model.nq = qpos_cursor;
        model.nv = dof_cursor;
        model.njnt = model.jnt_type.len();
        model.ngeom = model.geom_type.len();
        model.nsite = model.site_name.len();

        // Actuators: resolve joint names to ids.
        for act in &spec.actuators {
            let jnt_id = model
                .jnt_name
                .iter()
                .position(|n| n.as_deref() == Some(act.joint.as_str()))
                .ok_or_else(|| SceneError::MissingJoint(act.joint.clone()))?;
            model.actuator_joint.push(jnt_id);
            model.actuator_name.push(act.name.clone());
        }
        model.nu = model.actuator_joint.len();

        model.qpos0 = model.default_qpos();
        model.compile_keyframes(spec)?;
        model.nkey = model.keyframes.len();

        Ok(model)
    }

    /// Default generalized positions: free joints take their body's frame,
    /// ball joints the identity quaternion, scalar joints zero.
    fn default_qpos(&self) -> DVector<f64> {
        let mut qpos0 = DVector::zeros(self.nq);
        for jnt_id in 0..self.njnt {
            let adr = self.jnt_qpos_adr[jnt_id];
            match self.jnt_type[jnt_id] {
                JointType::Free => {
                    let body_id = self.jnt_body[jnt_id];
                    let pos = self.body_pos[body_id];
                    let q = self.body_quat[body_id];
                    qpos0[adr] = pos.x;
                    qpos0[adr + 1] = pos.y;
                    qpos0[adr + 2] = pos.z;
                    qpos0[adr + 3] = q.w;
                    qpos0[adr + 4] = q.i;
                    qpos0[adr + 5] = q.j;
                    qpos0[adr + 6] = q.k;
                }
                JointType::Ball => {
                    qpos0[adr] = 1.0; // w of identity quaternion
                }
                JointType::Hinge | JointType::Slide => {}
            }
        }
        qpos0
    }

    fn compile_keyframes(&mut self, spec: &SceneSpec) -> Result<(), SceneError> {
        for (idx, key) in spec.keyframes.iter().enumerate() {
            let key_name = key
                .name
                .clone()
                .unwrap_or_else(|| format!("#{idx}"));

            let qpos = fill_or_check(&key.qpos, &self.qpos0, self.nq, &key_name, "qpos")?;
            let qvel = fill_or_check(
                &key.qvel,
                &DVector::zeros(self.nv),
                self.nv,
                &key_name,
                "qvel",
            )?;
            let ctrl = fill_or_check(
                &key.ctrl,
                &DVector::zeros(self.nu),
                self.nu,
                &key_name,
                "ctrl",
            )?;

            self.keyframes.push(Keyframe {
                name: key.name.clone(),
                qpos,
                qvel,
                ctrl,
            });
        }
        Ok(())
    }

    /// Allocate a state sized to this model, at the default configuration.
    pub fn make_state(&self) -> SceneState {
        SceneState::new(self)
    }

    // -- Named lookups ------------------------------------------------------

    /// Body id by name.
    pub fn body(&self, name: &str) -> Result<usize, SceneError> {
        self.body_name
            .iter()
            .position(|n| n.as_deref() == Some(name))
            .ok_or_else(|| SceneError::MissingBody(name.to_string()))
    }

    /// Site id by name.
    pub fn site(&self, name: &str) -> Result<usize, SceneError> {
        self.site_name
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| SceneError::MissingSite(name.to_string()))
    }

    /// Keyframe by index or name.
    pub fn keyframe(&self, id: impl Into<KeyframeId>) -> Result<&Keyframe, SceneError> {
        match id.into() {
            KeyframeId::Index(i) => self.keyframes.get(i).ok_or(SceneError::KeyframeIndex {
                index: i,
                nkey: self.nkey,
            }),
            KeyframeId::Name(name) => self
                .keyframes
                .iter()
                .find(|k| k.name.as_deref() == Some(name.as_str()))
                .ok_or(SceneError::MissingKeyframe(name)),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn quat_wxyz(q: [f64; 4]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[0], q[1], q[2], q[3]))
}

fn push_geom(model: &mut SceneModel, body_id: usize, geom: &ambler_mjcf::GeomSpec) {
    model.geom_type.push(geom.kind);
    model.geom_body.push(body_id);
    model
        .geom_pos
        .push(Vector3::new(geom.pos[0], geom.pos[1], geom.pos[2]));
    model.geom_quat.push(quat_wxyz(geom.quat));
    model
        .geom_size
        .push(Vector3::new(geom.size[0], geom.size[1], geom.size[2]));
    model.geom_group.push(geom.group);
    model.geom_name.push(geom.name.clone());
}

fn push_site(model: &mut SceneModel, body_id: usize, site: &ambler_mjcf::SiteSpec) {
    model.site_body.push(body_id);
    model
        .site_pos
        .push(Vector3::new(site.pos[0], site.pos[1], site.pos[2]));
    model.site_quat.push(quat_wxyz(site.quat));
    model.site_name.push(site.name.clone());
}

fn fill_or_check(
    given: &[f64],
    default: &DVector<f64>,
    expected: usize,
    key: &str,
    field: &'static str,
) -> Result<DVector<f64>, SceneError> {
    if given.is_empty() {
        Ok(default.clone())
    } else if given.len() == expected {
        Ok(DVector::from_column_slice(given))
    } else {
        Err(SceneError::KeyframeSize {
            key: key.to_string(),
            field,
            expected,
            got: given.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
