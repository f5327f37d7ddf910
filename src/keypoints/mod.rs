//! Keypoint frames: the per-frame pose estimates consumed by the retargeter.

pub mod face;
pub mod io;
pub mod joint;
pub mod record;

use std::collections::HashMap;

use glam::{Vec2, Vec3};

pub use face::{EyeContour, FaceLandmark};
pub use joint::Joint;
pub use record::FrameRecord;

/// Pupil centers in image coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pupils {
    pub left: Vec2,
    pub right: Vec2,
}

/// Camera parameters attached to one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraParams {
    pub scale: f32,
    pub focal_length_px: f32,
    pub sensor_width: f32,
    /// Camera center in image pixels
    pub center: Vec2,
    /// Projected midpoint of the pelvis and spine-base joints, image pixels
    pub projected_pelvis: Vec2,
    pub depth: f32,
}

/// Immutable, typed view of one frame's keypoints.
///
/// Missing joints and landmarks read as the zero vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeypointFrame {
    pub frame: u32,
    pub joints: HashMap<Joint, Vec3>,
    /// 68-point face landmarks keyed by 1-based index; `None` when no face was found
    pub faces: Option<HashMap<u8, Vec2>>,
    pub pupils: Option<Pupils>,
    pub bbox_origin: Vec2,
    pub bbox_size: Vec2,
    pub image_size: Vec2,
    pub camera: CameraParams,
}

impl KeypointFrame {
    pub fn new(frame: u32) -> Self {
        Self {
            frame,
            ..Default::default()
        }
    }

    /// Builder used mostly by synthetic sequences.
    pub fn with_joint(mut self, joint: Joint, position: Vec3) -> Self {
        self.joints.insert(joint, position);
        self
    }

    pub fn has_joint(&self, joint: Joint) -> bool {
        self.joints.contains_key(&joint)
    }

    /// Joint position; `pelvis2` falls back to the hip midpoint.
    pub fn joint(&self, joint: Joint) -> Vec3 {
        if let Some(&p) = self.joints.get(&joint) {
            return p;
        }
        if joint == Joint::Pelvis2 {
            return (self.joint(Joint::RightHip) + self.joint(Joint::LeftHip)) / 2.0;
        }
        Vec3::ZERO
    }

    pub fn has_face(&self) -> bool {
        self.faces.is_some()
    }

    pub fn landmark(&self, landmark: FaceLandmark) -> Vec2 {
        self.faces
            .as_ref()
            .and_then(|faces| faces.get(&landmark.index()))
            .copied()
            .unwrap_or(Vec2::ZERO)
    }

    /// Build the typed view of a record. Unknown joint names and non-numeric
    /// face keys are ignored.
    pub fn from_record(frame: u32, record: &FrameRecord) -> Self {
        let joints = record
            .joints
            .iter()
            .filter_map(|(name, p)| Joint::from_name(name).map(|j| (j, Vec3::new(p.x, p.y, p.z))))
            .collect();

        let faces = record.faces.as_ref().map(|faces| {
            faces
                .iter()
                .filter_map(|(key, p)| key.parse::<u8>().ok().map(|i| (i, Vec2::new(p.x, p.y))))
                .collect()
        });

        let pupils = record.eyes.as_ref().map(|eyes| {
            let get = |side: &str| {
                eyes.get(side)
                    .map(|p| Vec2::new(p.x, p.y))
                    .unwrap_or(Vec2::ZERO)
            };
            Pupils {
                left: get("left"),
                right: get("right"),
            }
        });

        let projected = |name: &str| {
            record
                .proj_joints
                .get(name)
                .map(|p| Vec2::new(p.x, p.y))
                .unwrap_or(Vec2::ZERO)
        };

        Self {
            frame,
            joints,
            faces,
            pupils,
            bbox_origin: Vec2::new(record.bbox.x, record.bbox.y),
            bbox_size: Vec2::new(record.bbox.width, record.bbox.height),
            image_size: Vec2::new(record.image.width, record.image.height),
            camera: CameraParams {
                scale: record.camera.scale,
                focal_length_px: record.others.focal_length_in_px,
                sensor_width: record.others.sensor_width,
                center: Vec2::new(record.others.center.x, record.others.center.y),
                projected_pelvis: (projected("pelvis") + projected("spine1")) / 2.0,
                depth: record.depth.map(|d| d.depth).unwrap_or(0.0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use record::{Point2, Point3};

    #[test]
    fn test_missing_joint_is_zero() {
        let frame = KeypointFrame::new(0);
        assert_eq!(frame.joint(Joint::Head), Vec3::ZERO);
        assert_eq!(frame.landmark(FaceLandmark::MouthTop), Vec2::ZERO);
    }

    #[test]
    fn test_pelvis2_falls_back_to_hip_midpoint() {
        let frame = KeypointFrame::new(0)
            .with_joint(Joint::LeftHip, Vec3::new(1.0, 0.0, 0.0))
            .with_joint(Joint::RightHip, Vec3::new(-1.0, 2.0, 0.0));
        assert_eq!(frame.joint(Joint::Pelvis2), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_from_record() {
        let mut record = FrameRecord::default();
        record
            .joints
            .insert("left_hip".into(), Point3 { x: 1.0, y: 2.0, z: 3.0 });
        record
            .joints
            .insert("left_foot".into(), Point3 { x: 9.0, y: 9.0, z: 9.0 });
        record.proj_joints.insert("pelvis".into(), Point2 { x: 10.0, y: 20.0 });
        record.proj_joints.insert("spine1".into(), Point2 { x: 30.0, y: 40.0 });
        let mut faces = std::collections::BTreeMap::new();
        faces.insert("52".to_string(), Point2 { x: 5.0, y: 6.0 });
        record.faces = Some(faces);

        let frame = KeypointFrame::from_record(7, &record);
        assert_eq!(frame.frame, 7);
        assert_eq!(frame.joints.len(), 1);
        assert_eq!(frame.joint(Joint::LeftHip), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(frame.camera.projected_pelvis, Vec2::new(20.0, 30.0));
        assert_eq!(frame.landmark(FaceLandmark::MouthTop), Vec2::new(5.0, 6.0));
        assert!(frame.pupils.is_none());
    }
}
