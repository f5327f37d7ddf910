//! FK leg pose → 足ＩＫ position and rotation.

use std::collections::BTreeSet;

use glam::{Mat4, Vec3};
use tracing::debug;

use super::limits::{angle_degrees, swing_twist};
use super::orientation::rotation_to;
use crate::config::TuningConfig;
use crate::error::{Result, RetargetError};
use crate::motion::{BoneKeyframe, MotionDocument};
use crate::skeleton::names::{self, Side};
use crate::skeleton::{BoneId, Skeleton};

/// Bone chains of one leg, each root first
struct LegChains {
    leg_ik: BoneId,
    ankle_fk: Vec<BoneId>,
    leg_ik_chain: Vec<BoneId>,
    toe_ik_chain: Vec<BoneId>,
    toe_fk: Vec<BoneId>,
    /// Ankle rest position relative to the 足ＩＫ parent
    ankle_offset: Vec3,
}

impl LegChains {
    fn new(skeleton: &Skeleton, side: Side) -> Result<Self> {
        let ankle = skeleton.require(&side.bone(names::ANKLE))?;
        let leg_ik = skeleton.require(&side.bone(names::LEG_IK))?;
        let toe_ik_name = side.bone(names::TOE_IK);
        let toe_ik = skeleton.require(&toe_ik_name)?;
        let toe = skeleton
            .bone(toe_ik)
            .ik
            .as_ref()
            .map(|ik| ik.target)
            .ok_or(RetargetError::MissingIk { bone: toe_ik_name })?;

        let parent_rest = skeleton
            .bone(leg_ik)
            .parent
            .map_or(Vec3::ZERO, |p| skeleton.bone(p).position);

        Ok(Self {
            leg_ik,
            ankle_fk: skeleton.chain_to_root(ankle),
            leg_ik_chain: skeleton.chain_to_root(leg_ik),
            toe_ik_chain: skeleton.chain_to_root(toe_ik),
            toe_fk: skeleton.chain_to_root(toe),
            ankle_offset: skeleton.bone(ankle).position - parent_rest,
        })
    }
}

fn last_point(skeleton: &Skeleton, chain: &[BoneId], doc: &MotionDocument, frame: u32) -> Vec3 {
    skeleton
        .world_positions(chain, doc.pose_at(frame))
        .last()
        .copied()
        .unwrap_or(Vec3::ZERO)
}

/// Convert one leg's FK pose into 足ＩＫ keyframes for every non-flipped
/// frame that carries a hip, knee or ankle entry. Returns the number of
/// frames converted.
///
/// A low foot whose rotation about the leg's lateral axis is small is
/// planted: its height moves onto グルーブ and only the swing part of the
/// rotation is kept. Afterwards the IK is raised by any remaining negative
/// toe height.
pub fn convert_leg(
    doc: &mut MotionDocument,
    skeleton: &Skeleton,
    side: Side,
    flipped: &BTreeSet<u32>,
    tuning: &TuningConfig,
) -> Result<usize> {
    let chains = LegChains::new(skeleton, side)?;
    let leg_ik_name = side.bone(names::LEG_IK);
    let lateral = match side {
        Side::Left => Vec3::X,
        Side::Right => Vec3::NEG_X,
    };

    let fk_bones = [names::LEG, names::KNEE, names::ANKLE].map(|suffix| side.bone(suffix));
    let frames = doc.bone_frames_any(&fk_bones.each_ref().map(String::as_str));

    let mut converted = 0;
    for frame in frames {
        if flipped.contains(&frame) {
            continue;
        }

        let ankle_world = last_point(skeleton, &chains.ankle_fk, doc, frame);
        let toe_fk_world = last_point(skeleton, &chains.toe_fk, doc, frame);
        let parent_chain = &chains.leg_ik_chain[..chains.leg_ik_chain.len() - 1];
        let parent_matrix = skeleton
            .world_transforms(parent_chain, doc.pose_at(frame))
            .last()
            .copied()
            .unwrap_or(Mat4::IDENTITY);

        let mut keyframe = BoneKeyframe::from_position(
            parent_matrix
                .inverse()
                .transform_point3(ankle_world - chains.ankle_offset),
        );
        doc.insert_bone(&leg_ik_name, frame, keyframe);

        // toe offset in 足ＩＫ space, unrotated vs. as the FK ankle places it
        let toe_ik_transforms = skeleton.world_transforms(&chains.toe_ik_chain, doc.pose_at(frame));
        let leg_ik_matrix = chains
            .toe_ik_chain
            .iter()
            .position(|&id| id == chains.leg_ik)
            .map_or(Mat4::IDENTITY, |i| toe_ik_transforms[i]);
        let toe_ik_world = toe_ik_transforms
            .last()
            .map_or(Vec3::ZERO, |m| m.transform_point3(Vec3::ZERO));
        let to_local = leg_ik_matrix.inverse();
        keyframe.rotation = rotation_to(
            to_local.transform_point3(toe_ik_world),
            to_local.transform_point3(toe_fk_world),
        );

        let (twist, swing) = swing_twist(keyframe.rotation, lateral);
        if keyframe.position.y < tuning.ik_plant_height
            && angle_degrees(twist) < tuning.ik_plant_twist
        {
            if let Some(groove) = doc.bone_mut(names::GROOVE, frame) {
                groove.position.y -= keyframe.position.y;
            }
            keyframe.position.y = 0.0;
            keyframe.rotation = swing;
        }
        doc.insert_bone(&leg_ik_name, frame, keyframe);

        let toe_height = last_point(skeleton, &chains.toe_ik_chain, doc, frame).y;
        if toe_height < 0.0 {
            keyframe.position.y -= toe_height;
            doc.insert_bone(&leg_ik_name, frame, keyframe);
        }

        converted += 1;
    }

    debug!("{}: {} frames converted", leg_ik_name, converted);
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::test_rig;
    use glam::Quat;

    /// Left leg keyed at frame 0 with the root lowered by 0.5
    fn lowered_doc(ankle: Quat) -> MotionDocument {
        let mut doc = MotionDocument::new();
        doc.insert_bone(
            names::GROOVE,
            0,
            BoneKeyframe::from_position(Vec3::new(0.0, -0.5, 0.0)),
        );
        doc.insert_bone("左足", 0, BoneKeyframe::identity());
        doc.insert_bone("左ひざ", 0, BoneKeyframe::identity());
        doc.insert_bone("左足首", 0, BoneKeyframe::from_rotation(ankle));
        doc
    }

    fn toe_ik_height(rig: &Skeleton, doc: &MotionDocument) -> f32 {
        let chain = rig.chain_to_root(rig.id("左つま先ＩＫ").unwrap());
        last_point(rig, &chain, doc, 0).y
    }

    #[test]
    fn test_planted_foot_moves_height_to_groove() {
        let rig = test_rig();
        let mut doc = lowered_doc(Quat::IDENTITY);
        let n = convert_leg(&mut doc, &rig, Side::Left, &BTreeSet::new(), &TuningConfig::default())
            .unwrap();
        assert_eq!(n, 1);

        let ik = doc.bone("左足ＩＫ", 0).unwrap();
        assert_eq!(ik.position.y, 0.0);
        assert!(ik.position.x.abs() < 1e-5);
        assert!(ik.rotation.abs_diff_eq(Quat::IDENTITY, 1e-5));
        assert!(doc.bone(names::GROOVE, 0).unwrap().position.y.abs() < 1e-5);
        assert!(toe_ik_height(&rig, &doc) >= -1e-4);
    }

    #[test]
    fn test_negative_toe_is_raised() {
        let rig = test_rig();
        // toe swung down below the floor; too much lateral rotation to plant
        let mut doc = lowered_doc(Quat::from_rotation_x(-60f32.to_radians()));
        convert_leg(&mut doc, &rig, Side::Left, &BTreeSet::new(), &TuningConfig::default())
            .unwrap();

        let ik = doc.bone("左足ＩＫ", 0).unwrap();
        assert!(ik.position.y > 0.0);
        let height = toe_ik_height(&rig, &doc);
        assert!(height >= -1e-4, "toe height {}", height);
        assert!(height < 1e-3);
        // groove untouched
        assert_eq!(doc.bone(names::GROOVE, 0).unwrap().position.y, -0.5);
    }

    #[test]
    fn test_flipped_frames_skipped() {
        let rig = test_rig();
        let mut doc = lowered_doc(Quat::IDENTITY);
        let flipped: BTreeSet<u32> = [0].into_iter().collect();
        let n = convert_leg(&mut doc, &rig, Side::Left, &flipped, &TuningConfig::default()).unwrap();
        assert_eq!(n, 0);
        assert!(doc.bone("左足ＩＫ", 0).is_none());
    }

    #[test]
    fn test_missing_toe_ik_definition() {
        let mut rig = test_rig();
        let toe_ik = rig.id("右つま先ＩＫ").unwrap();
        rig.bone_mut(toe_ik).ik = None;
        let mut doc = MotionDocument::new();
        let err = convert_leg(&mut doc, &rig, Side::Right, &BTreeSet::new(), &TuningConfig::default());
        assert!(matches!(
            err,
            Err(crate::error::MocapError::Retarget(RetargetError::MissingIk { .. }))
        ));
    }
}
