//! Reference physics model facade.
//!
//! Compiles a parsed [`SceneSpec`](ambler_mjcf::SceneSpec) into an
//! addressable [`SceneModel`] (MuJoCo-style id/address arrays), allocates
//! mutable [`SceneState`] buffers, and recomputes world poses from
//! generalized positions via a forward-kinematics pass. Quaternion blocks in
//! the generalized-position vector follow the `(w, x, y, z)` convention.
//!
//! This crate deliberately stops at kinematics: no dynamics, no contacts,
//! no time integration. It exists so state can be mirrored into it and
//! world poses read back out.

pub mod error;
pub mod fk;
pub mod model;
pub mod state;

pub use error::SceneError;
pub use fk::{QuatLayout, forward, site_pose};
pub use model::{Keyframe, KeyframeId, SceneModel};
pub use state::SceneState;
