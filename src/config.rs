//! Configuration parsing and management for mocap-retarget

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, MocapError};
use crate::smoothing::OneEuroParams;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub root: RootConfig,
    pub smoothing: SmoothingConfig,
    pub tuning: TuningConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MocapError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> Result<Self, MocapError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, MocapError> {
        let paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("config/default.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), MocapError> {
        if !self.output.body && !self.output.face {
            return Err(invalid("output", "At least one of body or face must be enabled"));
        }

        if self.root.center_scale <= 0.0 {
            return Err(invalid("root.center_scale", "Scale must be greater than 0"));
        }
        if self.root.near < 0.0 || self.root.far <= self.root.near {
            return Err(invalid("root.far", "Clip planes must satisfy 0 <= near < far"));
        }

        for (field, params) in [
            ("smoothing.keypoints", &self.smoothing.keypoints),
            ("smoothing.root", &self.smoothing.root),
        ] {
            if params.freq <= 0.0 || params.min_cutoff <= 0.0 || params.d_cutoff <= 0.0 {
                return Err(invalid(field, "Frequency and cutoffs must be greater than 0"));
            }
        }

        let t = &self.tuning;
        if t.trunk_tolerance <= 0.0 || t.limb_tolerance <= 0.0 {
            return Err(invalid("tuning", "Continuity tolerances must be greater than 0"));
        }
        if t.flip_gap == 0 {
            return Err(invalid("tuning.flip_gap", "Flip gap must be at least 1 frame"));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> MocapError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// What the motion conversion produces
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Body bone rotations, root trajectory and leg IK
    pub body: bool,
    /// Facial morphs and eye rotation
    pub face: bool,
    /// Finger bones
    pub hand: bool,
    /// Keep the vertical root offset at zero
    pub upper_body_only: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            body: true,
            face: true,
            hand: false,
            upper_body_only: false,
        }
    }
}

/// Camera model used for the root trajectory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    /// Scale from keypoint units to rig units
    pub center_scale: f32,
    /// Near clip plane; 0 reproduces the singular-projection fallback
    pub near: f32,
    pub far: f32,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            center_scale: 30.0,
            near: 0.0,
            far: 50000.0,
        }
    }
}

/// One Euro parameters for each smoothing stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Pre-smoothing of the keypoint sequences
    pub keypoints: OneEuroParams,
    /// Root trajectory after reconstruction
    pub root: OneEuroParams,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            keypoints: OneEuroParams::new(30.0, 0.5, 0.05, 0.5),
            root: OneEuroParams::new(30.0, 0.1, 0.05, 0.1),
        }
    }
}

/// Retargeting thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Continuity tolerance per frame of gap for 上半身 / 下半身
    pub trunk_tolerance: f32,
    /// Continuity tolerance per frame of gap for every other bone
    pub limb_tolerance: f32,
    /// Largest x displacement of a joint between nearby frames
    pub displacement_limit: f32,
    /// Frames within this gap are compared for flips and displacement
    pub flip_gap: u32,
    /// Minimum side displacement counted as a flip
    pub flip_threshold: f32,
    /// Largest vertical root change per frame of gap
    pub offset_jump: f32,
    /// Ankle twist (degrees) above which a foot is not used for floor contact
    pub floor_ankle_twist: f32,
    /// Toe IK twist (degrees) below which a low foot is planted
    pub ik_plant_twist: f32,
    /// Leg IK height below which a foot is planted
    pub ik_plant_height: f32,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            trunk_tolerance: 0.2,
            limb_tolerance: 0.04,
            displacement_limit: 0.1,
            flip_gap: 2,
            flip_threshold: 0.15,
            offset_jump: 0.25,
            floor_ankle_twist: 30.0,
            ik_plant_twist: 20.0,
            ik_plant_height: 1.0,
        }
    }
}
