//! State-synchronization bridge between two physics representations.
//!
//! The vectorized engine stores free-body orientations as `(x, y, z, w)`
//! quaternions; the reference engine stores `(w, x, y, z)`. The bridge owns
//! the reference model and state, computes a [`CoordinateIndexMap`] once at
//! construction, and translates generalized-position buffers through it in
//! both directions:
//!
//! - [`SyncBridge::synchronize`] scatters a vectorized buffer into the
//!   reference layout and recomputes forward kinematics.
//! - [`SyncBridge::load_keyframe`] gathers the reference layout back into
//!   vectorized order and broadcasts it across the batch.
//!
//! The permutation is computed from joint metadata, never hand-coded per
//! robot, and must stay bit-exact for every degree of freedom.

pub mod bridge;
pub mod index_map;

pub use bridge::{BridgeError, SyncBridge};
pub use index_map::CoordinateIndexMap;
