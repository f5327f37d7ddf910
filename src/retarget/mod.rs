//! Keypoint sequence → motion document.
//!
//! [`Retargeter::retarget`] runs two passes over one subject's frames:
//!
//! 1. per frame, in order: flip detection, per-bone rotations from the
//!    joint mapping (gated by displacement and checked for continuity) and
//!    face morphs;
//! 2. over the whole sequence: joint-limit clamping, upright frame
//!    selection, root trajectory and leg IK.
//!
//! Subjects are processed one after another; the depth origin found by the
//! first one is handed back in [`SubjectReport`] and passed to the next.

pub mod camera;
pub mod flip;
pub mod leg_ik;
pub mod limits;
pub mod mapping;
pub mod orientation;
pub mod root;

use std::collections::BTreeSet;

use glam::Vec3;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, RetargetError};
use crate::face;
use crate::keypoints::KeypointFrame;
use crate::motion::{BoneKeyframe, MotionDocument};
use crate::skeleton::names::{self, Side};
use crate::skeleton::Skeleton;

pub use mapping::{BasisRecipe, JointMapping, MappingEntry};
pub use root::{DepthOrigin, RootTrajectory};

/// What happened to one subject
#[derive(Debug, Clone, Default)]
pub struct SubjectReport {
    /// Reference frame of the vertical offset; `None` without body output
    pub upright_frame: Option<u32>,
    /// Frames treated as mirror flips and left without body keys
    pub flipped: BTreeSet<u32>,
    pub root: RootTrajectory,
    /// 足ＩＫ keyframes written, both legs
    pub ik_frames: usize,
}

impl SubjectReport {
    /// Depth origin to hand to the next subject
    pub fn depth_origin(&self) -> Option<DepthOrigin> {
        self.root.origin
    }
}

pub struct Retargeter<'a> {
    skeleton: &'a Skeleton,
    mapping: &'a JointMapping,
    config: &'a Config,
}

impl<'a> Retargeter<'a> {
    pub fn new(skeleton: &'a Skeleton, mapping: &'a JointMapping, config: &'a Config) -> Self {
        Self {
            skeleton,
            mapping,
            config,
        }
    }

    /// Convert one subject's frames (ascending frame numbers).
    ///
    /// `origin` is the depth origin of an earlier subject, if any.
    pub fn retarget(
        &self,
        frames: &[KeypointFrame],
        origin: Option<DepthOrigin>,
    ) -> Result<(MotionDocument, SubjectReport)> {
        if frames.is_empty() {
            return Err(RetargetError::EmptySequence.into());
        }

        let mut doc = MotionDocument::new();
        let mut report = SubjectReport {
            root: RootTrajectory {
                origin,
                ..Default::default()
            },
            ..Default::default()
        };

        report.flipped = self.solve_frames(&mut doc, frames);
        if !report.flipped.is_empty() {
            info!("{} flipped frames: {:?}", report.flipped.len(), report.flipped);
        }

        if self.config.output.body {
            self.finish_body(&mut doc, frames, origin, &mut report)?;
        }

        info!(
            "Motion ready: {} bone keyframes, {} morph keyframes",
            doc.bone_keyframe_count(),
            doc.morph_keyframe_count()
        );
        Ok((doc, report))
    }

    /// Whether `entry` is solved under the current output toggles.
    fn wants(&self, entry: &MappingEntry) -> bool {
        let output = &self.config.output;
        entry.recipe.is_some()
            && (output.hand || !entry.is_hand)
            && (output.body || entry.is_head)
            && self.skeleton.contains(entry.bone)
    }

    /// Pass 1. Returns the frames flagged as flips.
    fn solve_frames(&self, doc: &mut MotionDocument, frames: &[KeypointFrame]) -> BTreeSet<u32> {
        let output = &self.config.output;
        let tuning = &self.config.tuning;
        let mut flipped = BTreeSet::new();
        let mut prev_loaded: Option<&KeypointFrame> = None;
        let mut prev_accepted: Option<&KeypointFrame> = None;

        for keypoints in frames {
            let frame = keypoints.frame;
            let near_previous =
                prev_loaded.is_some_and(|p| frame.saturating_sub(p.frame) <= tuning.flip_gap);
            prev_loaded = Some(keypoints);

            if let Some(prev) = prev_accepted.filter(|_| near_previous) {
                if flip::is_flipped(prev, keypoints, tuning.flip_threshold) {
                    debug!("Frame {} flipped against frame {}", frame, prev.frame);
                    flipped.insert(frame);
                    continue;
                }
            }

            for entry in self.mapping.entries() {
                if !self.wants(entry) {
                    continue;
                }

                if let Some(prev) = prev_accepted {
                    let jumped = prev.has_joint(entry.joint)
                        && frame.saturating_sub(prev.frame) <= tuning.flip_gap
                        && (keypoints.joint(entry.joint).x - prev.joint(entry.joint).x).abs()
                            > tuning.displacement_limit;
                    if jumped {
                        continue;
                    }
                }

                let Some(candidate) = orientation::solve_local_rotation(
                    entry,
                    keypoints,
                    self.mapping,
                    self.skeleton,
                    doc,
                    frame,
                ) else {
                    continue;
                };

                let trunk = entry.bone == names::UPPER_BODY || entry.bone == names::LOWER_BODY;
                let tolerance = if trunk {
                    tuning.trunk_tolerance
                } else {
                    tuning.limb_tolerance
                };
                let keyed = match doc.prev_keyed(entry.bone, frame) {
                    Some(prev) => orientation::is_continuous(
                        candidate,
                        doc.bone_at(entry.bone, prev).rotation,
                        frame - prev,
                        tolerance,
                    ),
                    None => true,
                };
                if !keyed && trunk {
                    debug!("Frame {}: {} discontinuous, flagged as flip", frame, entry.bone);
                    flipped.insert(frame);
                }

                doc.insert_bone(
                    entry.bone,
                    frame,
                    BoneKeyframe::from_rotation(candidate).with_keyed(keyed),
                );
            }
            prev_accepted = Some(keypoints);

            if output.face && keypoints.has_face() {
                face::apply(doc, frame, &face::solve(keypoints));
            }
        }

        flipped
    }

    /// Clamp every limited bone to its local-axis ranges; keyed flags kept.
    fn clamp_limits(&self, doc: &mut MotionDocument, frames: &[KeypointFrame]) {
        for entry in self.mapping.entries() {
            let Some(axis_limits) = entry.limits else {
                continue;
            };
            let Some(id) = self.skeleton.id(entry.bone).filter(|_| self.wants(entry)) else {
                continue;
            };
            let z_reference = if entry.is_right() { Vec3::NEG_Z } else { Vec3::Z };
            let basis = limits::local_frame(self.skeleton.local_x_axis(id), z_reference);

            for keypoints in frames {
                if let Some(k) = doc.bone_mut(entry.bone, keypoints.frame) {
                    k.rotation = limits::clamp_rotation(k.rotation, basis, &axis_limits);
                }
            }
        }
    }

    /// Pass 2.
    fn finish_body(
        &self,
        doc: &mut MotionDocument,
        frames: &[KeypointFrame],
        origin: Option<DepthOrigin>,
        report: &mut SubjectReport,
    ) -> Result<()> {
        self.clamp_limits(doc, frames);

        let root_bones = [
            names::CENTER.to_string(),
            names::GROOVE.to_string(),
            Side::Left.bone(names::LEG_IK),
            Side::Right.bone(names::LEG_IK),
        ];
        for keypoints in frames.iter().filter(|f| !report.flipped.contains(&f.frame)) {
            for bone in &root_bones {
                doc.insert_bone(bone, keypoints.frame, BoneKeyframe::identity());
            }
        }

        let upright = root::select_upright(doc, frames, &report.flipped)?;
        info!("Upright frame: {}", upright.frame);
        report.upright_frame = Some(upright.frame);

        report.root = root::reconstruct_root(
            doc,
            self.skeleton,
            frames,
            &report.flipped,
            upright,
            origin,
            self.config,
        )?;
        if !report.root.discarded.is_empty() {
            info!(
                "Discarded {} vertical offsets: {:?}",
                report.root.discarded.len(),
                report.root.discarded
            );
        }

        for side in Side::BOTH {
            report.ik_frames += leg_ik::convert_leg(
                doc,
                self.skeleton,
                side,
                &report.flipped,
                &self.config.tuning,
            )?;
        }

        Ok(())
    }
}
