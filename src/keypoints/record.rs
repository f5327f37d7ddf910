//! On-disk shape of one keypoint frame (`frame_<n>.json` / `smooth_<n>.json`).
//!
//! Joint and landmark maps stay string-keyed here so that the smoothing stage
//! can pass through names the retargeter does not use.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthRecord {
    pub depth: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBoxRecord {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Intrinsics estimated upstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OthersRecord {
    /// Camera center in image pixels
    pub center: Point2,
    /// Sensor width, consumed as the vertical field of view in degrees
    pub sensor_width: f32,
    pub focal_length_in_px: f32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraRecord {
    pub scale: f32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One frame as written by the pose-estimation stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameRecord {
    /// Joint name → 3D position
    pub joints: BTreeMap<String, Point3>,
    /// 68-point face layout, 1-based index as string → 2D position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faces: Option<BTreeMap<String, Point2>>,
    /// `"left"` / `"right"` pupil → 2D position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eyes: Option<BTreeMap<String, Point2>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<DepthRecord>,
    pub image: ImageRecord,
    pub bbox: BBoxRecord,
    /// Joint name → projected 2D image position
    pub proj_joints: BTreeMap<String, Point2>,
    pub others: OthersRecord,
    pub camera: CameraRecord,
    /// Anything else the upstream stage wrote
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
