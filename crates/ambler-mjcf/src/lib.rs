//! MJCF-subset scene description parsing.
//!
//! Parses the slice of MJCF that locomotion scenes use: nested bodies with
//! free/ball/hinge/slide joints, primitive collision geoms with collision
//! groups, sites, motor actuators, mesh asset references, and keyframes.
//! Produces a raw [`SceneSpec`] tree; compilation into an addressable model
//! is the reference engine's job (`ambler-sim`).

pub mod error;
pub mod parser;
pub mod types;

pub use error::MjcfError;
pub use parser::{AssetMap, parse_file, parse_string};
pub use types::{
    ActuatorSpec, BodySpec, GeomKind, GeomSpec, JointSpec, JointType, KeyframeSpec, MeshAsset,
    SceneSpec, SiteSpec,
};
