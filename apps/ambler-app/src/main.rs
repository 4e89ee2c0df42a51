//! ambler command-line interface.
//!
//! Three modes of operation:
//! - `envs`: list registered environments and their RL presets
//! - `scan`: load a scene, run one lidar scan, print distance statistics
//! - `info`: print workspace crate versions

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use ambler_env::{EnvError, LidarConfig, LidarWalkTask, env_names};
use ambler_lidar::TracerBackend;
use ambler_rl::rl_config;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Quadruped locomotion environments with simulated lidar.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered environments and their RL presets.
    Envs,

    /// Run one lidar scan against a scene and print statistics.
    Scan {
        /// Scene description file (MJCF).
        #[arg(short, long)]
        scene: PathBuf,

        /// Sensor model (mid360, avia, hdl64, vlp32, os128, airy, custom, ...).
        #[arg(short, long, default_value = "mid360")]
        model: String,

        /// Tracer backend. Falls back to AMBLER_LIDAR_BACKEND, then "batched".
        #[arg(short, long)]
        backend: Option<String>,

        /// Keep every n-th ray.
        #[arg(short, long, default_value_t = 1)]
        downsample: usize,

        /// Number of parallel environments.
        #[arg(short, long, default_value_t = 1)]
        envs: usize,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn run_envs() {
    println!("registered environments:");
    for name in env_names() {
        let rl = rl_config(name).expect("every env has an RL preset");
        println!(
            "  {name:<30} num_envs={} rollouts={} lr={}",
            rl.num_envs, rl.rollouts, rl.learning_rate
        );
    }
}

fn run_scan(
    scene: PathBuf,
    model: String,
    backend: TracerBackend,
    downsample: usize,
    envs: usize,
) -> Result<(), EnvError> {
    let mut cfg = LidarConfig {
        lidar_model: model,
        downsample,
        backend,
        ..LidarConfig::default()
    };
    cfg.walk.model_file = scene;

    let mut task = LidarWalkTask::new(cfg, envs)?;
    let mut state = task.walk().make_state();
    if task.walk().shared_model().nkey > 0 {
        task.reset(&mut state)?;
    }

    let result = task.scan(&state)?;
    let distances = result.distances();
    let min = distances.iter().copied().fold(f32::INFINITY, f32::min);
    let max = distances.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mean = distances.iter().sum::<f32>() / distances.len() as f32;

    println!(
        "scan: envs={} rays={} backend={}",
        result.num_envs(),
        result.num_rays(),
        match task.config().backend {
            TracerBackend::Batched => "batched",
            TracerBackend::Cached => "cached",
        }
    );
    println!("distances: min={min:.3} mean={mean:.3} max={max:.3}");
    Ok(())
}

fn run_info() {
    println!("ambler v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  ambler-core    {}", env!("CARGO_PKG_VERSION"));
    println!("  ambler-mjcf    {}", env!("CARGO_PKG_VERSION"));
    println!("  ambler-sim     {}", env!("CARGO_PKG_VERSION"));
    println!("  ambler-vec     {}", env!("CARGO_PKG_VERSION"));
    println!("  ambler-bridge  {}", env!("CARGO_PKG_VERSION"));
    println!("  ambler-lidar   {}", env!("CARGO_PKG_VERSION"));
    println!("  ambler-env     {}", env!("CARGO_PKG_VERSION"));
    println!("  ambler-rl      {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("edition: 2024");
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Envs) | None => {
            run_envs();
            ExitCode::SUCCESS
        }
        Some(Commands::Info) => {
            run_info();
            ExitCode::SUCCESS
        }
        Some(Commands::Scan {
            scene,
            model,
            backend,
            downsample,
            envs,
        }) => {
            // The environment variable is consulted exactly once, here at
            // startup; everything downstream sees only the config value.
            let backend_str = backend
                .or_else(|| std::env::var("AMBLER_LIDAR_BACKEND").ok())
                .unwrap_or_else(|| "batched".to_string());
            let backend = match backend_str.parse::<TracerBackend>() {
                Ok(b) => b,
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::FAILURE;
                }
            };

            match run_scan(scene, model, backend, downsample, envs) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("error: {e}");
                    eprintln!();
                    eprintln!("a scene description (MJCF) is required, e.g.:");
                    eprintln!("  ambler scan --scene demos/go2_flat.xml --model mid360");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
