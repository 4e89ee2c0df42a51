//! Simulated lidar: ray-pattern generation and batched ray tracing against
//! a static geometry snapshot.
//!
//! The scene geometry visible to the sensor is captured **once**, after an
//! initial forward-kinematics pass, and never refreshed: the sensor
//! observes only geometry that stays static over the simulation's
//! lifetime. The sensor mount itself always tracks the live simulation —
//! its pose is an input to every [`RayTracer::scan`] call. Tracers expose
//! [`RayTracer::upload_geometry`] as the extension point for engines that
//! grow a batched dynamic-geometry path.

pub mod error;
pub mod pattern;
pub mod raycast;
pub mod snapshot;
pub mod tracer;

pub use error::TracerError;
pub use pattern::{
    LidarModel, LivoxGenerator, RayPattern, generate_airy96, generate_grid_pattern,
    generate_hdl64, generate_os128, generate_vlp32,
};
pub use raycast::GeomShape;
pub use snapshot::{GeomFilter, GeomPose, GeometrySnapshot};
pub use tracer::{BatchedTracer, CachedTracer, MountPose, RayTracer, ScanResult, TracerBackend};
