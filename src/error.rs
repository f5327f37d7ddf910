//! Error types for mocap-retarget

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for mocap-retarget
#[derive(Error, Debug)]
pub enum MocapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Skeleton error: {0}")]
    Skeleton(#[from] SkeletonError),

    #[error("Retarget error: {0}")]
    Retarget(#[from] RetargetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Keypoint sequence input errors
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Failed to read frame {}: {message}", path.display())]
    ReadFrame { path: PathBuf, message: String },

    #[error("Failed to parse frame {}: {message}", path.display())]
    ParseFrame { path: PathBuf, message: String },

    #[error("Failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    #[error("No frames found in {}", .0.display())]
    NoFrames(PathBuf),
}

/// Skeleton definition errors
#[derive(Error, Debug)]
pub enum SkeletonError {
    #[error("Failed to read skeleton definition: {0}")]
    Read(String),

    #[error("Malformed skeleton row {row}: {message}")]
    Row { row: usize, message: String },

    #[error("Unknown bone referenced: {0}")]
    UnknownBone(String),

    #[error("Required bone missing: {0}")]
    MissingBone(String),
}

/// Errors raised while building a subject's motion
#[derive(Error, Debug)]
pub enum RetargetError {
    #[error("No frames to retarget")]
    EmptySequence,

    #[error("No usable upright frame (every frame was flagged as flipped)")]
    NoUprightFrame,

    #[error("Bone {bone} has no IK definition")]
    MissingIk { bone: String },
}

/// Result type alias for mocap-retarget operations
pub type Result<T> = std::result::Result<T, MocapError>;
