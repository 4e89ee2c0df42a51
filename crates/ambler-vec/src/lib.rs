//! Vectorized simulation facade.
//!
//! Holds `num_envs` independent rows of generalized position, velocity, and
//! control over one shared compiled model. Quaternion blocks in the
//! generalized-position rows follow the `(x, y, z, w)` convention — the
//! opposite of the reference layout, which is exactly the mismatch the
//! coordinate bridge exists to translate.

pub mod model;
pub mod state;

pub use model::{BatchModel, SiteRef};
pub use state::{BatchState, DofView};
