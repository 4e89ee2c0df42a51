//! Raw scene-description tree produced by the parser.
//!
//! All quaternions follow the MJCF attribute convention `(w, x, y, z)`.
//! Positions and orientations are relative to the enclosing body frame.

use crate::error::MjcfError;

// ---------------------------------------------------------------------------
// JointType
// ---------------------------------------------------------------------------

/// Joint families of the supported MJCF subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JointType {
    /// 6-DOF floating base: 3 translational + 3 rotational.
    /// qpos: `[x, y, z, qw, qx, qy, qz]` (7), qvel: 6.
    Free,
    /// 3-DOF spherical rotation. qpos: quaternion `[w, x, y, z]` (4), qvel: 3.
    Ball,
    /// 1-DOF rotation about an axis. qpos: 1, qvel: 1.
    #[default]
    Hinge,
    /// 1-DOF translation along an axis. qpos: 1, qvel: 1.
    Slide,
}

impl JointType {
    /// Width of this joint in the generalized-position vector.
    pub const fn nq(self) -> usize {
        match self {
            Self::Free => 7,
            Self::Ball => 4,
            Self::Hinge | Self::Slide => 1,
        }
    }

    /// Width of this joint in the generalized-velocity vector.
    pub const fn nv(self) -> usize {
        match self {
            Self::Free => 6,
            Self::Ball => 3,
            Self::Hinge | Self::Slide => 1,
        }
    }

    pub fn from_mjcf(s: &str) -> Result<Self, MjcfError> {
        match s {
            "free" => Ok(Self::Free),
            "ball" => Ok(Self::Ball),
            "hinge" => Ok(Self::Hinge),
            "slide" => Ok(Self::Slide),
            other => Err(MjcfError::UnsupportedJointType(other.into())),
        }
    }
}

// ---------------------------------------------------------------------------
// GeomKind
// ---------------------------------------------------------------------------

/// Collision geometry primitives of the supported MJCF subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeomKind {
    Plane,
    #[default]
    Sphere,
    Capsule,
    Cylinder,
    Ellipsoid,
    Box,
    /// Triangle mesh reference. Parsed (and its asset resolved), but the
    /// batched ray tracer skips meshes.
    Mesh,
}

impl GeomKind {
    pub fn from_mjcf(s: &str) -> Result<Self, MjcfError> {
        match s {
            "plane" => Ok(Self::Plane),
            "sphere" => Ok(Self::Sphere),
            "capsule" => Ok(Self::Capsule),
            "cylinder" => Ok(Self::Cylinder),
            "ellipsoid" => Ok(Self::Ellipsoid),
            "box" => Ok(Self::Box),
            "mesh" => Ok(Self::Mesh),
            other => Err(MjcfError::UnsupportedGeomType(other.into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Element specs
// ---------------------------------------------------------------------------

/// Parsed `<joint>` (or `<freejoint>`) element.
#[derive(Debug, Clone)]
pub struct JointSpec {
    pub name: Option<String>,
    pub kind: JointType,
    /// Anchor position in the body frame.
    pub pos: [f64; 3],
    /// Axis for hinge/slide joints, in the body frame.
    pub axis: [f64; 3],
    /// Position limits `[lower, upper]` if limited.
    pub range: Option<[f64; 2]>,
}

impl Default for JointSpec {
    fn default() -> Self {
        Self {
            name: None,
            kind: JointType::default(),
            pos: [0.0; 3],
            axis: [0.0, 0.0, 1.0],
            range: None,
        }
    }
}

/// Parsed `<geom>` element.
#[derive(Debug, Clone)]
pub struct GeomSpec {
    pub name: Option<String>,
    pub kind: GeomKind,
    /// Type-specific size parameters.
    pub size: [f64; 3],
    pub pos: [f64; 3],
    /// Orientation `(w, x, y, z)` in the body frame.
    pub quat: [f64; 4],
    /// Collision group (0-5). The lidar overlay filters on this.
    pub group: u8,
    /// Mesh asset name for `GeomKind::Mesh`.
    pub mesh: Option<String>,
}

impl Default for GeomSpec {
    fn default() -> Self {
        Self {
            name: None,
            kind: GeomKind::default(),
            size: [0.0; 3],
            pos: [0.0; 3],
            quat: [1.0, 0.0, 0.0, 0.0],
            group: 0,
            mesh: None,
        }
    }
}

/// Parsed `<site>` element (named attachment point, e.g. a sensor mount).
#[derive(Debug, Clone)]
pub struct SiteSpec {
    pub name: String,
    pub pos: [f64; 3],
    pub quat: [f64; 4],
}

/// Parsed `<body>` element. Bodies are stored flat, in document order, with
/// a parent index (`None` = direct child of the world body).
#[derive(Debug, Clone)]
pub struct BodySpec {
    pub name: Option<String>,
    pub parent: Option<usize>,
    pub pos: [f64; 3],
    pub quat: [f64; 4],
    pub joints: Vec<JointSpec>,
    pub geoms: Vec<GeomSpec>,
    pub sites: Vec<SiteSpec>,
}

/// Parsed `<key>` element. Empty vectors mean "use model defaults".
#[derive(Debug, Clone, Default)]
pub struct KeyframeSpec {
    pub name: Option<String>,
    pub qpos: Vec<f64>,
    pub qvel: Vec<f64>,
    pub ctrl: Vec<f64>,
}

/// Parsed `<motor>` (or position/velocity servo) element.
#[derive(Debug, Clone)]
pub struct ActuatorSpec {
    pub name: Option<String>,
    pub joint: String,
}

/// Parsed `<mesh>` asset reference.
#[derive(Debug, Clone)]
pub struct MeshAsset {
    pub name: String,
    pub file: String,
}

// ---------------------------------------------------------------------------
// SceneSpec
// ---------------------------------------------------------------------------

/// Raw parsed scene: the full document tree before model compilation.
#[derive(Debug, Clone)]
pub struct SceneSpec {
    pub name: String,
    pub timestep: f64,
    pub gravity: [f64; 3],
    /// All bodies in document order (world body excluded).
    pub bodies: Vec<BodySpec>,
    /// Geoms attached directly to the world body.
    pub world_geoms: Vec<GeomSpec>,
    /// Sites attached directly to the world body.
    pub world_sites: Vec<SiteSpec>,
    pub meshes: Vec<MeshAsset>,
    pub keyframes: Vec<KeyframeSpec>,
    pub actuators: Vec<ActuatorSpec>,
}

impl Default for SceneSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            timestep: 0.002,
            gravity: [0.0, 0.0, -9.81],
            bodies: Vec::new(),
            world_geoms: Vec::new(),
            world_sites: Vec::new(),
            meshes: Vec::new(),
            keyframes: Vec::new(),
            actuators: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_widths() {
        assert_eq!(JointType::Free.nq(), 7);
        assert_eq!(JointType::Free.nv(), 6);
        assert_eq!(JointType::Ball.nq(), 4);
        assert_eq!(JointType::Ball.nv(), 3);
        assert_eq!(JointType::Hinge.nq(), 1);
        assert_eq!(JointType::Slide.nv(), 1);
    }

    #[test]
    fn joint_type_from_mjcf() {
        assert_eq!(JointType::from_mjcf("free").unwrap(), JointType::Free);
        assert_eq!(JointType::from_mjcf("hinge").unwrap(), JointType::Hinge);
        assert!(matches!(
            JointType::from_mjcf("planar"),
            Err(MjcfError::UnsupportedJointType(_))
        ));
    }

    #[test]
    fn geom_kind_from_mjcf() {
        assert_eq!(GeomKind::from_mjcf("plane").unwrap(), GeomKind::Plane);
        assert_eq!(GeomKind::from_mjcf("box").unwrap(), GeomKind::Box);
        assert!(matches!(
            GeomKind::from_mjcf("hfield"),
            Err(MjcfError::UnsupportedGeomType(_))
        ));
    }

    #[test]
    fn defaults_are_identity() {
        let g = GeomSpec::default();
        assert_eq!(g.quat, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(g.group, 0);

        let j = JointSpec::default();
        assert_eq!(j.kind, JointType::Hinge);
        assert_eq!(j.axis, [0.0, 0.0, 1.0]);

        let s = SceneSpec::default();
        assert!((s.timestep - 0.002).abs() < f64::EPSILON);
        assert!((s.gravity[2] + 9.81).abs() < f64::EPSILON);
    }
}
