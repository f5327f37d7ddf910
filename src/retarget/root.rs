//! Root trajectory: horizontal / depth offsets on センター and vertical
//! offset on グルーブ.

use std::collections::BTreeSet;

use glam::Vec3;
use tracing::debug;

use super::camera::root_seed;
use super::limits::{angle_degrees, twist_degrees};
use crate::config::Config;
use crate::error::{Result, RetargetError};
use crate::keypoints::KeypointFrame;
use crate::motion::{BoneKeyframe, MotionDocument};
use crate::skeleton::names::{self, Side};
use crate::skeleton::{BoneId, Skeleton};
use crate::smoothing::OneEuroFilter;

/// Depth seed of the first processed frame of a run. Every subject's depth
/// offsets are measured from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthOrigin(pub f32);

/// Unsmoothed root samples of one subject plus the vertical offsets dropped
/// as outliers.
#[derive(Debug, Clone, Default)]
pub struct RootTrajectory {
    /// `(frame, (x, vertical, depth))` before smoothing
    pub raw: Vec<(u32, Vec3)>,
    pub discarded: Vec<u32>,
    pub origin: Option<DepthOrigin>,
}

/// Sum of the hip and knee rotation angles at `frame`, degrees.
pub fn leg_bend_degrees(doc: &MotionDocument, frame: u32) -> f32 {
    [Side::Right, Side::Left]
        .iter()
        .flat_map(|side| [side.bone(names::LEG), side.bone(names::KNEE)])
        .map(|bone| angle_degrees(doc.bone_at(&bone, frame).rotation))
        .sum()
}

/// The non-flipped frame with the least bent legs; the earliest one wins
/// ties.
pub fn select_upright<'a>(
    doc: &MotionDocument,
    frames: &'a [KeypointFrame],
    flipped: &BTreeSet<u32>,
) -> Result<&'a KeypointFrame> {
    let mut best: Option<(&KeypointFrame, f32)> = None;
    for frame in frames.iter().filter(|f| !flipped.contains(&f.frame)) {
        let score = leg_bend_degrees(doc, frame.frame);
        if best.map_or(true, |(_, s)| score < s) {
            best = Some((frame, score));
        }
    }
    best.map(|(frame, _)| frame)
        .ok_or_else(|| RetargetError::NoUprightFrame.into())
}

/// Lowest toe height at `frame` among feet whose ankle twist about +X stays
/// under `max_twist`.
fn lowest_contact(
    doc: &MotionDocument,
    skeleton: &Skeleton,
    toe_chains: &[(Side, Vec<BoneId>)],
    frame: u32,
    max_twist: f32,
) -> Option<f32> {
    toe_chains
        .iter()
        .filter(|(side, _)| {
            let ankle = doc.bone_at(&side.bone(names::ANKLE), frame);
            twist_degrees(ankle.rotation, Vec3::X) < max_twist
        })
        .filter_map(|(_, chain)| {
            skeleton
                .world_positions(chain, doc.pose_at(frame))
                .last()
                .map(|p| p.y)
        })
        .reduce(f32::min)
}

/// Fill センター and グルーブ for every non-flipped frame, then smooth them.
///
/// `origin` is the depth origin carried over from earlier subjects; when
/// `None` it is latched from the first frame processed here.
pub fn reconstruct_root(
    doc: &mut MotionDocument,
    skeleton: &Skeleton,
    frames: &[KeypointFrame],
    flipped: &BTreeSet<u32>,
    upright: &KeypointFrame,
    origin: Option<DepthOrigin>,
    config: &Config,
) -> Result<RootTrajectory> {
    let root = &config.root;
    let tuning = &config.tuning;

    let toe_chains = Side::BOTH
        .iter()
        .map(|&side| {
            let toe = skeleton.require(&side.bone(names::TOE))?;
            Ok((side, skeleton.chain_to_root(toe)))
        })
        .collect::<Result<Vec<_>>>()?;

    let upright_seed = root_seed(upright, root.center_scale, root.near, root.far);
    let mut trajectory = RootTrajectory {
        origin,
        ..Default::default()
    };

    for keypoints in frames.iter().filter(|f| !flipped.contains(&f.frame)) {
        let frame = keypoints.frame;
        let seed = root_seed(keypoints, root.center_scale, root.near, root.far);
        let origin = trajectory.origin.get_or_insert(DepthOrigin(seed.z)).0;

        let depth = seed.z - origin;
        doc.insert_bone(
            names::CENTER,
            frame,
            BoneKeyframe::from_position(Vec3::new(seed.x, 0.0, depth)),
        );

        let mut vertical = seed.y - upright_seed.y;
        doc.insert_bone(
            names::GROOVE,
            frame,
            BoneKeyframe::from_position(Vec3::new(0.0, vertical, 0.0)),
        );
        if let Some(lowest) =
            lowest_contact(doc, skeleton, &toe_chains, frame, tuning.floor_ankle_twist)
        {
            vertical -= lowest;
        }
        if config.output.upper_body_only {
            vertical = 0.0;
        }
        doc.insert_bone(
            names::GROOVE,
            frame,
            BoneKeyframe::from_position(Vec3::new(0.0, vertical, 0.0)),
        );
        trajectory.raw.push((frame, Vec3::new(seed.x, vertical, depth)));

        if let Some(prev) = doc.prev_keyed(names::GROOVE, frame) {
            let prev_vertical = doc.bone_at(names::GROOVE, prev).position.y;
            let limit = tuning.offset_jump * (frame - prev) as f32;
            if (vertical - prev_vertical).abs() > limit {
                debug!(
                    "Dropping vertical offset at frame {}: {:.3} -> {:.3}",
                    frame, prev_vertical, vertical
                );
                doc.remove_bone(names::GROOVE, frame);
                trajectory.discarded.push(frame);
            }
        }
    }

    smooth_channel(doc, names::CENTER, flipped, config, &[0, 2]);
    smooth_channel(doc, names::GROOVE, flipped, config, &[1]);

    Ok(trajectory)
}

/// One Euro over the given position axes of every stored entry of `bone`.
fn smooth_channel(
    doc: &mut MotionDocument,
    bone: &str,
    flipped: &BTreeSet<u32>,
    config: &Config,
    axes: &[usize],
) {
    let mut filters: Vec<OneEuroFilter> = axes
        .iter()
        .map(|_| OneEuroFilter::new(config.smoothing.root))
        .collect();

    for frame in doc.bone_frames(bone) {
        if flipped.contains(&frame) {
            continue;
        }
        let Some(keyframe) = doc.bone_mut(bone, frame) else {
            continue;
        };
        for (filter, &axis) in filters.iter_mut().zip(axes) {
            keyframe.position[axis] = filter.filter(keyframe.position[axis], frame as f32);
        }
    }
}
