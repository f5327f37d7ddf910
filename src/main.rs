//! mocap-retarget - Offline motion capture retargeting
//!
//! Main entry point for the CLI application.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mocap_retarget::{
    config::Config,
    keypoints::{io, KeypointFrame},
    retarget::{DepthOrigin, JointMapping, Retargeter},
    skeleton::csv::read_skeleton,
    smoothing::smooth_sequence,
};

/// Directory of raw estimator output, one subdirectory per subject
const ORDERED_DIR: &str = "ordered";
const SMOOTH_DIR: &str = "smooth";
const MOTION_DIR: &str = "motion";

/// mocap-retarget - Convert pose keypoints into MMD motion
#[derive(Parser, Debug)]
#[command(name = "mocap-retarget", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pre-smooth every subject under <dir>/ordered into <dir>/smooth
    Smooth {
        /// Working directory
        dir: PathBuf,
    },
    /// Convert every smoothed subject under <dir>/smooth into <dir>/motion
    Motion {
        /// Working directory
        dir: PathBuf,

        /// Rig skeleton exported as PMX-editor CSV
        #[arg(short, long)]
        skeleton: PathBuf,

        /// Solve finger bones
        #[arg(long)]
        hand: bool,

        /// Only head bones and facial morphs
        #[arg(long)]
        face_only: bool,

        /// Keep the root at floor height
        #[arg(long)]
        upper_body: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", mocap_retarget::NAME, mocap_retarget::VERSION);

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    match args.command {
        Command::Smooth { dir } => {
            config.validate()?;
            run_smooth(&dir, &config)
        }
        Command::Motion {
            dir,
            skeleton,
            hand,
            face_only,
            upper_body,
        } => {
            // CLI flags override the config toggles
            config.output.hand |= hand;
            config.output.upper_body_only |= upper_body;
            if face_only {
                config.output.body = false;
                config.output.face = true;
            }
            config.validate()?;
            run_motion(&dir, &skeleton, &config)
        }
    }
}

/// `<dir>/ordered/<subject>/frame_<n>.json` → `<dir>/smooth/<nnn>/smooth_<n>.json`
fn run_smooth(dir: &Path, config: &Config) -> anyhow::Result<()> {
    let subjects = io::subject_dirs(&dir.join(ORDERED_DIR))?;
    info!("Smoothing {} subjects", subjects.len());

    for (index, subject) in subjects.iter().enumerate() {
        let mut frames = io::load_sequence(subject, io::RAW_PREFIX)
            .with_context(|| format!("loading {}", subject.display()))?;
        smooth_sequence(&mut frames, config.smoothing.keypoints);

        let out = dir.join(SMOOTH_DIR).join(format!("{:03}", index));
        io::write_sequence(&out, io::SMOOTH_PREFIX, &frames)?;
        info!("No.{:03}: {} frames → {}", index, frames.len(), out.display());
    }

    Ok(())
}

/// `<dir>/smooth/<subject>` → `<dir>/motion/<subject>.json`
fn run_motion(dir: &Path, skeleton_path: &Path, config: &Config) -> anyhow::Result<()> {
    let skeleton = read_skeleton(skeleton_path)?;
    let retargeter = Retargeter::new(&skeleton, JointMapping::standard(), config);

    let subjects = io::subject_dirs(&dir.join(SMOOTH_DIR))?;
    let out_dir = dir.join(MOTION_DIR);
    std::fs::create_dir_all(&out_dir)?;
    info!("Converting {} subjects", subjects.len());

    let mut origin: Option<DepthOrigin> = None;
    for subject in &subjects {
        let name = subject
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Subject {}", name);

        let frames: Vec<KeypointFrame> = io::load_sequence(subject, io::SMOOTH_PREFIX)?
            .iter()
            .map(|(frame, record)| KeypointFrame::from_record(*frame, record))
            .collect();

        let (doc, report) = retargeter
            .retarget(&frames, origin)
            .with_context(|| format!("converting subject {}", name))?;
        origin = report.depth_origin().or(origin);

        let path = out_dir.join(format!("{}.json", name));
        io::write_json(&path, &doc.export())?;
        info!("Subject {} written to {}", name, path.display());
    }

    Ok(())
}
