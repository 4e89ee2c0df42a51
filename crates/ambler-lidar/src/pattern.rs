//! Ray-pattern generation.
//!
//! A pattern is two equal-length flat sequences of angles in the sensor's
//! local frame: `theta` (azimuth) and `phi` (elevation). The Livox family
//! shares one rosette-scan generator parameterized per model; the spinning
//! and dome sensors each have a fixed grid generator.

use std::f32::consts::PI;
use std::str::FromStr;

use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use ambler_core::error::ConfigError;

// ---------------------------------------------------------------------------
// RayPattern
// ---------------------------------------------------------------------------

/// Per-scan ray directions as flat `(theta, phi)` angle arrays (radians).
#[derive(Debug, Clone, PartialEq)]
pub struct RayPattern {
    theta: Vec<f32>,
    phi: Vec<f32>,
}

impl RayPattern {
    /// Build from equal-length angle arrays. Panics on a length mismatch;
    /// generators are the only producers and always emit pairs.
    pub fn new(theta: Vec<f32>, phi: Vec<f32>) -> Self {
        assert_eq!(
            theta.len(),
            phi.len(),
            "RayPattern: theta and phi must have equal length"
        );
        Self { theta, phi }
    }

    pub fn len(&self) -> usize {
        self.theta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.theta.is_empty()
    }

    pub fn theta(&self) -> &[f32] {
        &self.theta
    }

    pub fn phi(&self) -> &[f32] {
        &self.phi
    }

    /// Keep every `stride`-th ray, starting from the first. A stride of 1
    /// returns the pattern unchanged.
    pub fn downsample(&self, stride: usize) -> Self {
        assert!(stride >= 1, "downsample stride must be >= 1");
        Self {
            theta: self.theta.iter().copied().step_by(stride).collect(),
            phi: self.phi.iter().copied().step_by(stride).collect(),
        }
    }

    /// Unit direction of each ray in the sensor's local frame.
    pub fn local_dirs(&self) -> Vec<Vector3<f64>> {
        self.theta
            .iter()
            .zip(self.phi.iter())
            .map(|(&t, &p)| {
                let (t, p) = (f64::from(t), f64::from(p));
                Vector3::new(p.cos() * t.cos(), p.cos() * t.sin(), p.sin())
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// LidarModel
// ---------------------------------------------------------------------------

/// Supported sensor models. The Livox family shares [`LivoxGenerator`];
/// the others are fixed patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LidarModel {
    Avia,
    Mid40,
    Mid70,
    Mid360,
    Tele,
    Airy96,
    Hdl64,
    Vlp32,
    Os128,
    /// Dense grid over the upper hemisphere; mostly for tests and tooling.
    Custom,
}

impl LidarModel {
    /// True for the non-repetitive rosette-scan family.
    pub const fn is_livox(self) -> bool {
        matches!(
            self,
            Self::Avia | Self::Mid40 | Self::Mid70 | Self::Mid360 | Self::Tele
        )
    }

    /// Materialize this model's pattern. Livox models get one fixed frame;
    /// use [`LivoxGenerator`] directly for per-scan regeneration.
    pub fn generate(self) -> RayPattern {
        match self {
            Self::Avia | Self::Mid40 | Self::Mid70 | Self::Mid360 | Self::Tele => {
                LivoxGenerator::new(self)
                    .expect("livox family checked above")
                    .sample_ray_angles(1)
            }
            Self::Airy96 => generate_airy96(),
            Self::Hdl64 => generate_hdl64(),
            Self::Vlp32 => generate_vlp32(),
            Self::Os128 => generate_os128(),
            Self::Custom => generate_grid_pattern(360, 64, (0.0, PI / 2.0)),
        }
    }
}

impl FromStr for LidarModel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s {
            "avia" => Ok(Self::Avia),
            "mid40" => Ok(Self::Mid40),
            "mid70" => Ok(Self::Mid70),
            "mid360" => Ok(Self::Mid360),
            "tele" => Ok(Self::Tele),
            "airy" => Ok(Self::Airy96),
            "HDL64" | "hdl64" => Ok(Self::Hdl64),
            "vlp32" => Ok(Self::Vlp32),
            "os128" => Ok(Self::Os128),
            "custom" => Ok(Self::Custom),
            other => Err(ConfigError::UnknownLidarModel(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// LivoxGenerator
// ---------------------------------------------------------------------------

/// Rosette parameters: horizontal FOV, elevation range, rays per frame.
struct RosetteParams {
    half_h_fov: f32,
    phi_min: f32,
    phi_max: f32,
    rays: usize,
}

const fn deg(d: f32) -> f32 {
    d * PI / 180.0
}

fn rosette_params(model: LidarModel) -> Option<RosetteParams> {
    let p = match model {
        LidarModel::Avia => RosetteParams {
            half_h_fov: deg(70.4 / 2.0),
            phi_min: deg(-77.2 / 2.0),
            phi_max: deg(77.2 / 2.0),
            rays: 24_000,
        },
        LidarModel::Mid40 => RosetteParams {
            half_h_fov: deg(38.4 / 2.0),
            phi_min: deg(-38.4 / 2.0),
            phi_max: deg(38.4 / 2.0),
            rays: 10_000,
        },
        LidarModel::Mid70 => RosetteParams {
            half_h_fov: deg(70.4 / 2.0),
            phi_min: deg(-70.4 / 2.0),
            phi_max: deg(70.4 / 2.0),
            rays: 10_000,
        },
        LidarModel::Mid360 => RosetteParams {
            half_h_fov: PI,
            phi_min: deg(-7.0),
            phi_max: deg(52.0),
            rays: 20_000,
        },
        LidarModel::Tele => RosetteParams {
            half_h_fov: deg(14.5 / 2.0),
            phi_min: deg(-16.2 / 2.0),
            phi_max: deg(16.2 / 2.0),
            rays: 24_000,
        },
        _ => return None,
    };
    Some(p)
}

/// Non-repetitive rosette-scan generator shared by the Livox family.
///
/// Two incommensurate prism frequencies trace a rose curve over the FOV;
/// each call advances the phase so consecutive frames never repeat.
pub struct LivoxGenerator {
    model: LidarModel,
    rng: ChaCha8Rng,
    frame: u64,
}

// Prism rotation rates (rev/s). The ratio is deliberately irrational-ish
// so the scan pattern precesses instead of retracing itself.
const F1: f64 = 7294.0;
const F2: f64 = 4664.0;
const SAMPLE_DT: f64 = 1.0 / 24_000.0;

impl LivoxGenerator {
    /// Fails for non-Livox models: the rosette parameters only exist for
    /// the named commercial family.
    pub fn new(model: LidarModel) -> Result<Self, ConfigError> {
        if !model.is_livox() {
            return Err(ConfigError::UnknownLidarModel(format!("{model:?}")));
        }
        Ok(Self {
            model,
            rng: ChaCha8Rng::seed_from_u64(0),
            frame: 0,
        })
    }

    /// Seeded variant for reproducible scan sequences.
    pub fn with_seed(model: LidarModel, seed: u64) -> Result<Self, ConfigError> {
        let mut g = Self::new(model)?;
        g.rng = ChaCha8Rng::seed_from_u64(seed);
        Ok(g)
    }

    /// Sample one frame of ray angles, already downsampled by `stride`.
    pub fn sample_ray_angles(&mut self, stride: usize) -> RayPattern {
        let params = rosette_params(self.model).expect("constructor enforces livox family");
        let phase: f64 = self.rng.gen_range(0.0..std::f64::consts::TAU);
        let t0 = self.frame as f64 * params.rays as f64 * SAMPLE_DT;
        self.frame += 1;

        let n = params.rays;
        let mut theta = Vec::with_capacity(n);
        let mut phi = Vec::with_capacity(n);
        for i in 0..n {
            let t = t0 + i as f64 * SAMPLE_DT;
            let a = std::f64::consts::TAU * F1 * t + phase;
            let b = std::f64::consts::TAU * F2 * t;
            let x = 0.5 * (a.sin() + b.sin());
            let y = 0.5 * (a.cos() + b.cos());
            theta.push(params.half_h_fov * x as f32);
            let span = params.phi_max - params.phi_min;
            phi.push(params.phi_min + span * (0.5 + 0.5 * y as f32));
        }

        RayPattern::new(theta, phi).downsample(stride.max(1))
    }
}

// ---------------------------------------------------------------------------
// Fixed patterns
// ---------------------------------------------------------------------------

/// Grid of `n_theta` azimuth steps over the full circle by `n_phi`
/// elevation channels over `phi_range`, azimuth-major order.
pub fn generate_grid_pattern(n_theta: usize, n_phi: usize, phi_range: (f32, f32)) -> RayPattern {
    let mut theta = Vec::with_capacity(n_theta * n_phi);
    let mut phi = Vec::with_capacity(n_theta * n_phi);
    for ti in 0..n_theta {
        let t = -PI + (ti as f32) * (2.0 * PI / n_theta as f32);
        for pi in 0..n_phi {
            let frac = if n_phi > 1 {
                pi as f32 / (n_phi - 1) as f32
            } else {
                0.0
            };
            theta.push(t);
            phi.push(phi_range.0 + frac * (phi_range.1 - phi_range.0));
        }
    }
    RayPattern::new(theta, phi)
}

/// 96-channel dome sensor: +-45 degrees elevation, 384 azimuth steps.
pub fn generate_airy96() -> RayPattern {
    generate_grid_pattern(384, 96, (deg(-45.0), deg(45.0)))
}

/// 64-channel spinning sensor: +2 to -24.8 degrees, 0.4-degree azimuth step.
pub fn generate_hdl64() -> RayPattern {
    generate_grid_pattern(900, 64, (deg(2.0), deg(-24.8)))
}

/// 32-channel spinning sensor: +15 to -25 degrees, 0.4-degree azimuth step.
pub fn generate_vlp32() -> RayPattern {
    generate_grid_pattern(900, 32, (deg(15.0), deg(-25.0)))
}

/// 128-channel spinning sensor: +-22.5 degrees, 1024 azimuth steps.
pub fn generate_os128() -> RayPattern {
    generate_grid_pattern(1024, 128, (deg(22.5), deg(-22.5)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
