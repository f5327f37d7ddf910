//! Temporal pre-smoothing of keypoint sequences.
//!
//! Every scalar channel of a subject's records (each joint axis, face
//! landmark axis, pupil axis and the depth estimate) gets its own
//! [`OneEuroFilter`], fed in frame order with the frame number as timestamp.

pub mod one_euro;

use std::collections::HashMap;

use tracing::debug;

pub use one_euro::{OneEuroFilter, OneEuroParams};

use crate::keypoints::record::FrameRecord;

/// Which record map a channel lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Source {
    Joint,
    Face,
    Eye,
    Depth,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ChannelKey {
    source: Source,
    name: String,
    axis: u8,
}

/// Bank of filters keyed by channel, created on first sight
struct FilterBank {
    params: OneEuroParams,
    filters: HashMap<ChannelKey, OneEuroFilter>,
}

impl FilterBank {
    fn new(params: OneEuroParams) -> Self {
        Self {
            params,
            filters: HashMap::new(),
        }
    }

    fn apply(&mut self, source: Source, name: &str, axis: u8, value: &mut f32, frame: u32) {
        let params = self.params;
        let filter = self
            .filters
            .entry(ChannelKey {
                source,
                name: name.to_string(),
                axis,
            })
            .or_insert_with(|| OneEuroFilter::new(params));
        *value = filter.filter(*value, frame as f32);
    }
}

/// Smooth a subject's records in place. `frames` must be sorted by frame number.
pub fn smooth_sequence(frames: &mut [(u32, FrameRecord)], params: OneEuroParams) {
    let mut bank = FilterBank::new(params);

    for (frame, record) in frames.iter_mut() {
        let frame = *frame;
        for (name, p) in record.joints.iter_mut() {
            bank.apply(Source::Joint, name, 0, &mut p.x, frame);
            bank.apply(Source::Joint, name, 1, &mut p.y, frame);
            bank.apply(Source::Joint, name, 2, &mut p.z, frame);
        }
        if let Some(faces) = record.faces.as_mut() {
            for (name, p) in faces.iter_mut() {
                bank.apply(Source::Face, name, 0, &mut p.x, frame);
                bank.apply(Source::Face, name, 1, &mut p.y, frame);
            }
        }
        if let Some(eyes) = record.eyes.as_mut() {
            for (name, p) in eyes.iter_mut() {
                bank.apply(Source::Eye, name, 0, &mut p.x, frame);
                bank.apply(Source::Eye, name, 1, &mut p.y, frame);
            }
        }
        if let Some(depth) = record.depth.as_mut() {
            bank.apply(Source::Depth, "depth", 0, &mut depth.depth, frame);
        }
    }

    debug!(
        "Smoothed {} frames over {} channels",
        frames.len(),
        bank.filters.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::record::{DepthRecord, Point2, Point3};
    use std::collections::BTreeMap;

    const PARAMS: OneEuroParams = OneEuroParams::new(30.0, 0.5, 0.05, 0.5);

    fn record(x: f32, depth: f32) -> FrameRecord {
        let mut r = FrameRecord::default();
        r.joints.insert("pelvis".into(), Point3 { x, y: 1.0, z: -2.0 });
        let mut faces = BTreeMap::new();
        faces.insert("31".to_string(), Point2 { x: 100.0, y: 200.0 });
        r.faces = Some(faces);
        r.depth = Some(DepthRecord { depth });
        r
    }

    #[test]
    fn test_constant_sequence_unchanged() {
        let mut frames: Vec<(u32, FrameRecord)> =
            [0u32, 1, 2, 4, 5].iter().map(|&f| (f, record(0.5, 3.0))).collect();
        smooth_sequence(&mut frames, PARAMS);
        for (_, r) in &frames {
            assert_eq!(r.joints["pelvis"], Point3 { x: 0.5, y: 1.0, z: -2.0 });
            assert_eq!(r.faces.as_ref().unwrap()["31"], Point2 { x: 100.0, y: 200.0 });
            assert_eq!(r.depth.unwrap().depth, 3.0);
        }
    }

    #[test]
    fn test_jump_is_damped_per_channel() {
        let mut frames = vec![(0, record(0.0, 3.0)), (1, record(1.0, 3.0))];
        smooth_sequence(&mut frames, PARAMS);
        let x = frames[1].1.joints["pelvis"].x;
        assert!(x > 0.0 && x < 1.0, "x = {}", x);
        // untouched channels stay constant
        assert_eq!(frames[1].1.depth.unwrap().depth, 3.0);
    }

    #[test]
    fn test_channel_appearing_late_starts_fresh() {
        let mut first = FrameRecord::default();
        first.joints.insert("head".into(), Point3 { x: 0.0, y: 0.0, z: 0.0 });
        let mut second = first.clone();
        second.joints.insert("nose".into(), Point3 { x: 9.0, y: 9.0, z: 9.0 });
        let mut frames = vec![(0, first), (1, second)];
        smooth_sequence(&mut frames, PARAMS);
        assert_eq!(frames[1].1.joints["nose"], Point3 { x: 9.0, y: 9.0, z: 9.0 });
    }
}
