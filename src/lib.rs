//! mocap-retarget - offline keypoint → MMD motion conversion
//!
//! Turns per-frame 3D pose keypoints (plus optional 2D face landmarks) into
//! keyframed bone rotations, a root trajectory, leg IK targets and facial
//! morph weights for an MMD-style rig:
//! - `smoothing` pre-filters the raw keypoint sequences
//! - `retarget` solves bone rotations, root motion and leg IK
//! - `face` derives morph weights from face landmarks
//! - `motion` holds the result until it is serialized

pub mod config;
pub mod error;
pub mod face;
pub mod keypoints;
pub mod motion;
pub mod retarget;
pub mod skeleton;
pub mod smoothing;

pub use config::Config;
pub use error::{MocapError, Result};
pub use motion::MotionDocument;
pub use retarget::{DepthOrigin, JointMapping, Retargeter, SubjectReport};
pub use skeleton::Skeleton;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
