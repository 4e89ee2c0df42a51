//! Lidar overlay on top of the walk task.

use serde::Serialize;

use ambler_bridge::SyncBridge;
use ambler_core::types::BatchObservation;
use ambler_lidar::{
    BatchedTracer, CachedTracer, GeomFilter, GeometrySnapshot, LidarModel, LivoxGenerator,
    MountPose, RayPattern, RayTracer, ScanResult, TracerBackend,
};
use ambler_sim::SceneState;
use ambler_vec::{BatchState, DofView, SiteRef};

use crate::config::LidarConfig;
use crate::error::EnvError;
use crate::walk::WalkTask;

// ---------------------------------------------------------------------------
// CompositeObservation
// ---------------------------------------------------------------------------

/// Composite environment observation: lidar hit points plus the underlying
/// task's raw observation, under fixed, stable keys.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeObservation {
    /// Local-frame hit points, `[num_envs x num_rays x 3]` row-major.
    pub lidar_points: Vec<f32>,
    /// The underlying locomotion task's observation, passed through.
    pub state_obs: BatchObservation,
    /// Ray count, so consumers can reshape `lidar_points`.
    #[serde(skip)]
    pub num_rays: usize,
}

impl CompositeObservation {
    pub const LIDAR_POINTS_KEY: &'static str = "lidar_points";
    pub const STATE_OBS_KEY: &'static str = "state_obs";
}

// ---------------------------------------------------------------------------
// LidarWalkTask
// ---------------------------------------------------------------------------

/// Walk task with a lidar overlay.
///
/// Background geometry is snapshotted once at construction and never
/// refreshed; only the sensor mount tracks the live simulation. This is a
/// stated limitation, not a tunable.
pub struct LidarWalkTask {
    walk: WalkTask,
    cfg: LidarConfig,
    bridge: SyncBridge,
    tracer: Box<dyn RayTracer>,
    pattern: RayPattern,
    /// Present only for the Livox family; drives dynamic regeneration.
    livox: Option<LivoxGenerator>,
    mount: SiteRef,
}

impl std::fmt::Debug for LidarWalkTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LidarWalkTask")
            .field("cfg", &self.cfg)
            .field("pattern", &self.pattern)
            .field("mount", &self.mount)
            .finish_non_exhaustive()
    }
}

impl LidarWalkTask {
    /// Load the scene and build the overlay.
    pub fn new(cfg: LidarConfig, num_envs: usize) -> Result<Self, EnvError> {
        let walk = WalkTask::new(cfg.walk.clone(), num_envs)?;
        Self::with_walk(cfg, walk)
    }

    /// Build the overlay over an existing walk task (same scene).
    pub fn with_walk(cfg: LidarConfig, walk: WalkTask) -> Result<Self, EnvError> {
        // Sensor-model selection fails before anything else is built.
        let lidar_model: LidarModel = cfg.lidar_model.parse()?;
        cfg.validate()?;

        let mut bridge = SyncBridge::from_shared(walk.shared_model());
        bridge.forward();

        let exclude = bridge.model().body(&cfg.exclude_body)?;
        let filter = GeomFilter::group_only(cfg.geom_group).with_exclude_body(exclude);

        let num_envs = walk.num_envs();
        let snapshot =
            GeometrySnapshot::capture(bridge.model(), bridge.state(), &filter, num_envs);

        let tracer: Box<dyn RayTracer> = match cfg.backend {
            TracerBackend::Batched => Box::new(BatchedTracer::new(snapshot, cfg.max_range)),
            TracerBackend::Cached => {
                let mut t = CachedTracer::new(filter, cfg.max_range, num_envs);
                // The cached backend must sync once before the first trace.
                t.update(bridge.model(), bridge.state());
                Box::new(t)
            }
        };

        let mount = walk.batch_model().site(&cfg.mount_site)?;

        let (pattern, livox) = if lidar_model.is_livox() {
            let mut generator = LivoxGenerator::with_seed(lidar_model, cfg.walk.sim.seed)?;
            let pattern = generator.sample_ray_angles(cfg.downsample);
            (pattern, Some(generator))
        } else {
            (lidar_model.generate().downsample(cfg.downsample), None)
        };

        Ok(Self {
            walk,
            cfg,
            bridge,
            tracer,
            pattern,
            livox,
            mount,
        })
    }

    pub fn walk(&self) -> &WalkTask {
        &self.walk
    }

    pub fn config(&self) -> &LidarConfig {
        &self.cfg
    }

    pub fn num_rays(&self) -> usize {
        self.pattern.len()
    }

    pub fn pattern(&self) -> &RayPattern {
        &self.pattern
    }

    /// Mirror the vectorized state into the reference representation.
    /// One call per simulation step.
    pub fn synchronize(&mut self, state: &BatchState) -> Result<&SceneState, EnvError> {
        Ok(self.bridge.synchronize(state.dof_view())?)
    }

    /// Reset every environment to the configured keyframe pose.
    pub fn reset(&mut self, state: &mut BatchState) -> Result<(), EnvError> {
        let keyframe = self.cfg.walk.keyframe.clone();
        self.bridge
            .load_keyframe(state, self.walk.batch_model(), keyframe.as_str())?;
        Ok(())
    }

    /// One batched scan against the static geometry snapshot, from the
    /// live sensor-mount pose.
    pub fn scan(&mut self, state: &BatchState) -> Result<ScanResult, EnvError> {
        if self.cfg.dynamic {
            if let Some(generator) = self.livox.as_mut() {
                self.pattern = generator.sample_ray_angles(self.cfg.downsample);
            }
        }

        // Mount pose comes from the live vectorized state, never from the
        // snapshot: robots move, backgrounds don't.
        let poses = self.mount.poses(self.walk.batch_model(), state);
        let (positions, rotations) = poses.into_iter().unzip();
        let mount = MountPose::new(positions, rotations);

        Ok(self.tracer.scan(&mount, &self.pattern)?)
    }

    /// Composite observation: the walk task's raw observation plus the
    /// lidar hit points.
    pub fn observe(&mut self, state: &BatchState) -> Result<CompositeObservation, EnvError> {
        let state_obs = self.walk.observe(state);
        let scan = self.scan(state)?;
        Ok(CompositeObservation {
            lidar_points: scan.local_points().to_vec(),
            num_rays: scan.num_rays(),
            state_obs,
        })
    }

    /// The bridge's view of the scene, for callers that need reference-
    /// frame poses after a [`synchronize`](Self::synchronize).
    pub fn reference_state(&self) -> &SceneState {
        self.bridge.state()
    }

    /// Single-environment convenience used by tooling: synchronize from a
    /// flat buffer.
    pub fn synchronize_single(&mut self, dof_pos: &[f64]) -> Result<&SceneState, EnvError> {
        Ok(self.bridge.synchronize(DofView::from(dof_pos))?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
