//! Ray-tracer backends behind an explicit strategy interface.
//!
//! The backend is chosen at construction via [`TracerBackend`] carried in
//! configuration — never through ambient process state consulted inside
//! methods. Both backends produce identical results; they differ in how
//! geometry reaches them and how work is scheduled:
//!
//! - [`BatchedTracer`] receives explicit world geometry poses (the
//!   snapshot) up front and parallelizes across environments with rayon.
//! - [`CachedTracer`] is bound to the reference model and requires one
//!   [`RayTracer::update`] call to sync its internal cache before the
//!   first scan, mirroring backends that keep device-side state.

use std::str::FromStr;

use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use ambler_core::error::ConfigError;
use ambler_sim::{SceneModel, SceneState};

use crate::error::TracerError;
use crate::pattern::RayPattern;
use crate::raycast::raycast;
use crate::snapshot::{GeomFilter, GeomPose, GeometrySnapshot};

// ---------------------------------------------------------------------------
// TracerBackend
// ---------------------------------------------------------------------------

/// Which tracer implementation to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracerBackend {
    #[default]
    Batched,
    Cached,
}

impl FromStr for TracerBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s {
            "batched" => Ok(Self::Batched),
            "cached" => Ok(Self::Cached),
            other => Err(ConfigError::InvalidValue {
                field: "backend".into(),
                message: format!("unknown tracer backend `{other}`"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MountPose / ScanResult
// ---------------------------------------------------------------------------

/// Live world pose of the sensor mount, one entry per environment.
#[derive(Debug, Clone)]
pub struct MountPose {
    pub positions: Vec<Vector3<f64>>,
    pub rotations: Vec<Matrix3<f64>>,
}

impl MountPose {
    pub fn new(positions: Vec<Vector3<f64>>, rotations: Vec<Matrix3<f64>>) -> Self {
        assert_eq!(
            positions.len(),
            rotations.len(),
            "MountPose: positions and rotations must have equal length"
        );
        Self {
            positions,
            rotations,
        }
    }

    /// Single-environment mount.
    pub fn single(position: Vector3<f64>, rotation: Matrix3<f64>) -> Self {
        Self::new(vec![position], vec![rotation])
    }

    pub fn num_envs(&self) -> usize {
        self.positions.len()
    }
}

/// Batched scan output.
///
/// `distances` is `[num_envs x num_rays]` and `local_points` is
/// `[num_envs x num_rays x 3]`, both row-major. Misses carry the tracer's
/// maximum range.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    num_envs: usize,
    num_rays: usize,
    distances: Vec<f32>,
    local_points: Vec<f32>,
}

impl ScanResult {
    pub const fn num_envs(&self) -> usize {
        self.num_envs
    }

    pub const fn num_rays(&self) -> usize {
        self.num_rays
    }

    pub fn distances(&self) -> &[f32] {
        &self.distances
    }

    pub fn local_points(&self) -> &[f32] {
        &self.local_points
    }

    pub fn distance(&self, env: usize, ray: usize) -> f32 {
        self.distances[env * self.num_rays + ray]
    }

    pub fn point(&self, env: usize, ray: usize) -> [f32; 3] {
        let base = (env * self.num_rays + ray) * 3;
        [
            self.local_points[base],
            self.local_points[base + 1],
            self.local_points[base + 2],
        ]
    }
}

// ---------------------------------------------------------------------------
// RayTracer
// ---------------------------------------------------------------------------

/// Strategy interface over the tracer backends.
pub trait RayTracer: Send {
    /// Resynchronize internal caches with the current reference state.
    /// Required by the cached backend before its first scan; a no-op for
    /// the batched backend.
    fn update(&mut self, model: &SceneModel, state: &SceneState);

    /// Replace the geometry the tracer sees. Extension point for engines
    /// that grow a per-step dynamic-geometry upload path; today's callers
    /// invoke it at most once, at construction time.
    fn upload_geometry(&mut self, snapshot: GeometrySnapshot);

    /// One blocking batched trace: per-environment mount poses in, one
    /// distance and one local-frame hit point per ray out. Atomic — no
    /// partial results, no retry.
    fn scan(&self, mount: &MountPose, pattern: &RayPattern) -> Result<ScanResult, TracerError>;

    /// Backend name for logs and the CLI.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Shared tracing core
// ---------------------------------------------------------------------------

/// Trace all rays for one environment. Returns (distance, local point)
/// per ray; a miss reports `max_range` and the point at max range.
fn trace_env(
    geoms: &[GeomPose],
    origin: &Vector3<f64>,
    rotation: &Matrix3<f64>,
    local_dirs: &[Vector3<f64>],
    max_range: f64,
) -> (Vec<f32>, Vec<f32>) {
    let mut distances = Vec::with_capacity(local_dirs.len());
    let mut points = Vec::with_capacity(local_dirs.len() * 3);

    for local_dir in local_dirs {
        let world_dir = rotation * local_dir;
        let mut best = max_range;
        for geom in geoms {
            if let Some(t) = raycast(&geom.shape, &geom.pos, &geom.mat, origin, &world_dir, best) {
                best = t;
            }
        }
        let d = best as f32;
        distances.push(d);
        points.push(local_dir.x as f32 * d);
        points.push(local_dir.y as f32 * d);
        points.push(local_dir.z as f32 * d);
    }

    (distances, points)
}

fn collect_result(
    per_env: Vec<(Vec<f32>, Vec<f32>)>,
    num_rays: usize,
) -> ScanResult {
    let num_envs = per_env.len();
    let mut distances = Vec::with_capacity(num_envs * num_rays);
    let mut local_points = Vec::with_capacity(num_envs * num_rays * 3);
    for (d, p) in per_env {
        distances.extend_from_slice(&d);
        local_points.extend_from_slice(&p);
    }
    ScanResult {
        num_envs,
        num_rays,
        distances,
        local_points,
    }
}

// ---------------------------------------------------------------------------
// BatchedTracer
// ---------------------------------------------------------------------------

/// Tracer fed explicit world geometry poses, parallel across environments.
pub struct BatchedTracer {
    snapshot: GeometrySnapshot,
    max_range: f64,
}

impl BatchedTracer {
    pub fn new(snapshot: GeometrySnapshot, max_range: f64) -> Self {
        Self {
            snapshot,
            max_range,
        }
    }
}

impl RayTracer for BatchedTracer {
    fn update(&mut self, _model: &SceneModel, _state: &SceneState) {
        // Geometry poses are explicit; nothing to sync.
    }

    fn upload_geometry(&mut self, snapshot: GeometrySnapshot) {
        self.snapshot = snapshot;
    }

    fn scan(&self, mount: &MountPose, pattern: &RayPattern) -> Result<ScanResult, TracerError> {
        let expected = self.snapshot.num_envs();
        if mount.num_envs() != expected {
            return Err(TracerError::MountBatchMismatch {
                expected,
                got: mount.num_envs(),
            });
        }

        let local_dirs = pattern.local_dirs();
        let per_env: Vec<(Vec<f32>, Vec<f32>)> = (0..mount.num_envs())
            .into_par_iter()
            .map(|env| {
                trace_env(
                    self.snapshot.geoms(),
                    &mount.positions[env],
                    &mount.rotations[env],
                    &local_dirs,
                    self.max_range,
                )
            })
            .collect();

        Ok(collect_result(per_env, local_dirs.len()))
    }

    fn name(&self) -> &'static str {
        "batched"
    }
}

// ---------------------------------------------------------------------------
// CachedTracer
// ---------------------------------------------------------------------------

/// Tracer bound to the reference model; caches geometry poses on
/// [`RayTracer::update`] and refuses to scan before the first sync.
pub struct CachedTracer {
    filter: GeomFilter,
    max_range: f64,
    num_envs: usize,
    cache: Option<GeometrySnapshot>,
}

impl CachedTracer {
    pub fn new(filter: GeomFilter, max_range: f64, num_envs: usize) -> Self {
        Self {
            filter,
            max_range,
            num_envs,
            cache: None,
        }
    }
}

impl RayTracer for CachedTracer {
    fn update(&mut self, model: &SceneModel, state: &SceneState) {
        self.cache = Some(GeometrySnapshot::capture(
            model,
            state,
            &self.filter,
            self.num_envs,
        ));
    }

    fn upload_geometry(&mut self, snapshot: GeometrySnapshot) {
        self.cache = Some(snapshot);
    }

    fn scan(&self, mount: &MountPose, pattern: &RayPattern) -> Result<ScanResult, TracerError> {
        let snapshot = self.cache.as_ref().ok_or(TracerError::NotSynchronized)?;
        if mount.num_envs() != snapshot.num_envs() {
            return Err(TracerError::MountBatchMismatch {
                expected: snapshot.num_envs(),
                got: mount.num_envs(),
            });
        }

        let local_dirs = pattern.local_dirs();
        let per_env: Vec<(Vec<f32>, Vec<f32>)> = (0..mount.num_envs())
            .map(|env| {
                trace_env(
                    snapshot.geoms(),
                    &mount.positions[env],
                    &mount.rotations[env],
                    &local_dirs,
                    self.max_range,
                )
            })
            .collect();

        Ok(collect_result(per_env, local_dirs.len()))
    }

    fn name(&self) -> &'static str {
        "cached"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
