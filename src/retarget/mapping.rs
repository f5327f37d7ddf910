//! Joint → bone mapping table.
//!
//! Each entry names the rig bone driven by a keypoint joint, the keypoint
//! pairs that define its orientation basis, and the ancestor bones whose
//! rotations have to be removed to get a parent-relative rotation. Entries
//! are kept in solve order: every ancestor is solved before its children.

use std::collections::HashMap;
use std::sync::OnceLock;

use glam::Vec3;

use crate::keypoints::Joint;
use crate::skeleton::{AxisLimits, Skeleton};

/// Keypoint pairs spanning an orientation basis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisRecipe {
    /// Direction and up pairs; basis is (direction, direction × up)
    Four {
        direction: (Joint, Joint),
        up: (Joint, Joint),
    },
    /// Direction, up and cross pairs; basis is (direction, up × cross)
    Six {
        direction: (Joint, Joint),
        up: (Joint, Joint),
        cross: (Joint, Joint),
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub joint: Joint,
    pub bone: &'static str,
    pub recipe: Option<BasisRecipe>,
    /// Ancestor bones, outermost first
    pub ancestors: &'static [&'static str],
    /// Rotation limits in degrees about the bone's local axes
    pub limits: Option<AxisLimits>,
    pub is_hand: bool,
    pub is_head: bool,
}

impl MappingEntry {
    pub fn new(joint: Joint, bone: &'static str) -> Self {
        Self {
            joint,
            bone,
            recipe: None,
            ancestors: &[],
            limits: None,
            is_hand: false,
            is_head: false,
        }
    }

    fn six(
        mut self,
        [a, b, c, d, e, f]: [Joint; 6],
        ancestors: &'static [&'static str],
    ) -> Self {
        self.recipe = Some(BasisRecipe::Six {
            direction: (a, b),
            up: (c, d),
            cross: (e, f),
        });
        self.ancestors = ancestors;
        self
    }

    fn hand(mut self) -> Self {
        self.is_hand = true;
        self
    }

    fn head(mut self) -> Self {
        self.is_head = true;
        self
    }

    pub fn with_limits(mut self, limits: AxisLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn with_recipe(mut self, recipe: BasisRecipe) -> Self {
        self.recipe = Some(recipe);
        self
    }

    /// Right-side joints mirror their limit axes
    pub fn is_right(&self) -> bool {
        self.joint.name().starts_with("right")
    }
}

/// Immutable lookup of [`MappingEntry`] by joint, preserving solve order
#[derive(Debug, Clone)]
pub struct JointMapping {
    entries: Vec<MappingEntry>,
    by_joint: HashMap<Joint, usize>,
}

impl JointMapping {
    pub fn new(entries: Vec<MappingEntry>) -> Self {
        let by_joint = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.joint, i))
            .collect();
        Self { entries, by_joint }
    }

    /// The table for the standard rig, built on first use
    pub fn standard() -> &'static JointMapping {
        static TABLE: OnceLock<JointMapping> = OnceLock::new();
        TABLE.get_or_init(|| JointMapping::new(standard_entries()))
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn get(&self, joint: Joint) -> Option<&MappingEntry> {
        self.by_joint.get(&joint).map(|&i| &self.entries[i])
    }

    pub fn bone_for(&self, joint: Joint) -> Option<&'static str> {
        self.get(joint).map(|e| e.bone)
    }

    /// Rest position of the bone mapped to `joint`; zero when unmapped or
    /// absent from the skeleton.
    pub fn rest_position(&self, skeleton: &Skeleton, joint: Joint) -> Vec3 {
        self.bone_for(joint)
            .map(|bone| skeleton.position(bone))
            .unwrap_or(Vec3::ZERO)
    }
}

const TRUNK: &[&str] = &["上半身", "上半身2"];

/// Ancestor chain of a hand bone: trunk, arm, wrist, then any finger bones
macro_rules! chain {
    (right $(, $extra:literal)*) => {
        &["上半身", "上半身2", "右肩", "右腕", "右ひじ", "右手首" $(, $extra)*]
    };
    (left $(, $extra:literal)*) => {
        &["上半身", "上半身2", "左肩", "左腕", "左ひじ", "左手首" $(, $extra)*]
    };
}

/// Finger entries: proximal, middle and distal bone of one finger.
///
/// `up` is the pair spanning the palm (index → pinky, or thumb → pinky).
fn finger(
    entries: &mut Vec<MappingEntry>,
    joints: [Joint; 4],
    bones: [&'static str; 3],
    up: (Joint, Joint),
    chains: [&'static [&'static str]; 3],
) {
    for i in 0..3 {
        let (from, to) = (joints[i], joints[i + 1]);
        entries.push(
            MappingEntry::new(from, bones[i])
                .six([from, to, up.0, up.1, from, to], chains[i])
                .hand(),
        );
    }
}

fn standard_entries() -> Vec<MappingEntry> {
    use Joint::*;

    let mut e = vec![
        MappingEntry::new(Spine1, "上半身")
            .six([Pelvis, Spine1, LeftShoulder, RightShoulder, Pelvis, Spine1], &[]),
        MappingEntry::new(Spine2, "上半身2")
            .six([Spine1, Spine2, LeftShoulder, RightShoulder, Spine1, Spine2], &["上半身"]),
        MappingEntry::new(Spine3, "首根元"),
        MappingEntry::new(Neck, "首")
            .six([Neck, Nose, LeftEye, RightEye, Neck, Nose], TRUNK)
            .head(),
        MappingEntry::new(Head, "頭")
            .six([Nose, Head, LeftEye, RightEye, Nose, Head], &["上半身", "上半身2", "首"])
            .head(),
        MappingEntry::new(Pelvis, "下半身")
            .six([Spine1, Pelvis, LeftHip, RightHip, Pelvis, Pelvis2], &[]),
        MappingEntry::new(Nose, "鼻"),
        MappingEntry::new(RightEye, "右目"),
        MappingEntry::new(LeftEye, "左目"),
        MappingEntry::new(RightEar, "右耳"),
        MappingEntry::new(LeftEar, "左耳"),
        MappingEntry::new(RightShoulder, "右肩").six(
            [Spine3, RightShoulder, Spine1, Spine3, RightShoulder, LeftShoulder],
            TRUNK,
        ),
        MappingEntry::new(LeftShoulder, "左肩").six(
            [Spine3, LeftShoulder, Spine1, Spine3, LeftShoulder, RightShoulder],
            TRUNK,
        ),
        MappingEntry::new(RightArm, "右腕").six(
            [RightShoulder, RightElbow, Spine3, RightShoulder, RightShoulder, RightElbow],
            &["上半身", "上半身2", "右肩"],
        ),
        MappingEntry::new(LeftArm, "左腕").six(
            [LeftShoulder, LeftElbow, Spine3, LeftShoulder, LeftShoulder, LeftElbow],
            &["上半身", "上半身2", "左肩"],
        ),
        MappingEntry::new(RightElbow, "右ひじ").six(
            [RightElbow, RightWrist, Spine3, RightShoulder, RightElbow, RightWrist],
            &["上半身", "上半身2", "右肩", "右腕"],
        ),
        MappingEntry::new(LeftElbow, "左ひじ").six(
            [LeftElbow, LeftWrist, Spine3, LeftShoulder, LeftElbow, LeftWrist],
            &["上半身", "上半身2", "左肩", "左腕"],
        ),
        MappingEntry::new(RightWrist, "右手首")
            .six(
                [RightWrist, RightMiddle1, RightIndex1, RightPinky1, RightWrist, RightMiddle1],
                &["上半身", "上半身2", "右肩", "右腕", "右ひじ"],
            )
            .hand(),
        MappingEntry::new(LeftWrist, "左手首")
            .six(
                [LeftWrist, LeftMiddle1, LeftIndex1, LeftPinky1, LeftWrist, LeftMiddle1],
                &["上半身", "上半身2", "左肩", "左腕", "左ひじ"],
            )
            .hand(),
        MappingEntry::new(Pelvis2, "尾てい骨"),
        MappingEntry::new(RightHip, "右足").six(
            [RightHip, RightKnee, Pelvis2, RightHip, RightHip, RightKnee],
            &["下半身"],
        ),
        MappingEntry::new(LeftHip, "左足").six(
            [LeftHip, LeftKnee, Pelvis2, LeftHip, LeftHip, LeftKnee],
            &["下半身"],
        ),
        MappingEntry::new(RightKnee, "右ひざ").six(
            [RightKnee, RightAnkle, Pelvis2, RightHip, RightKnee, RightAnkle],
            &["下半身", "右足"],
        ),
        MappingEntry::new(LeftKnee, "左ひざ").six(
            [LeftKnee, LeftAnkle, Pelvis2, LeftHip, LeftKnee, LeftAnkle],
            &["下半身", "左足"],
        ),
        MappingEntry::new(RightAnkle, "右足首").six(
            [RightAnkle, RightBigToe, RightBigToe, RightSmallToe, RightAnkle, RightBigToe],
            &["下半身", "右足", "右ひざ"],
        ),
        MappingEntry::new(LeftAnkle, "左足首").six(
            [LeftAnkle, LeftBigToe, LeftBigToe, LeftSmallToe, LeftAnkle, LeftBigToe],
            &["下半身", "左足", "左ひざ"],
        ),
        MappingEntry::new(RightBigToe, "右足親指"),
        MappingEntry::new(RightSmallToe, "右足小指"),
        MappingEntry::new(LeftBigToe, "左足親指"),
        MappingEntry::new(LeftSmallToe, "左足小指"),
    ];

    finger(
        &mut e,
        [RightThumb1, RightThumb2, RightThumb3, RightThumb],
        ["右親指０", "右親指１", "右親指２"],
        (RightThumb1, RightPinky1),
        [
            chain!(right),
            chain!(right, "右親指０"),
            chain!(right, "右親指０", "右親指１"),
        ],
    );
    finger(
        &mut e,
        [LeftThumb1, LeftThumb2, LeftThumb3, LeftThumb],
        ["左親指０", "左親指１", "左親指２"],
        (LeftThumb1, LeftPinky1),
        [
            chain!(left),
            chain!(left, "左親指０"),
            chain!(left, "左親指０", "左親指１"),
        ],
    );
    finger(
        &mut e,
        [RightIndex1, RightIndex2, RightIndex3, RightIndex],
        ["右人指１", "右人指２", "右人指３"],
        (RightIndex1, RightPinky1),
        [
            chain!(right),
            chain!(right, "右人指１"),
            chain!(right, "右人指１", "右人指２"),
        ],
    );
    finger(
        &mut e,
        [LeftIndex1, LeftIndex2, LeftIndex3, LeftIndex],
        ["左人指１", "左人指２", "左人指３"],
        (LeftIndex1, LeftPinky1),
        [
            chain!(left),
            chain!(left, "左人指１"),
            chain!(left, "左人指１", "左人指２"),
        ],
    );
    finger(
        &mut e,
        [RightMiddle1, RightMiddle2, RightMiddle3, RightMiddle],
        ["右中指１", "右中指２", "右中指３"],
        (RightIndex1, RightPinky1),
        [
            chain!(right),
            chain!(right, "右中指１"),
            chain!(right, "右中指１", "右中指２"),
        ],
    );
    finger(
        &mut e,
        [LeftMiddle1, LeftMiddle2, LeftMiddle3, LeftMiddle],
        ["左中指１", "左中指２", "左中指３"],
        (LeftIndex1, LeftPinky1),
        [
            chain!(left),
            chain!(left, "左中指１"),
            chain!(left, "左中指１", "左中指２"),
        ],
    );
    finger(
        &mut e,
        [RightRing1, RightRing2, RightRing3, RightRing],
        ["右薬指１", "右薬指２", "右薬指３"],
        (RightIndex1, RightPinky1),
        [
            chain!(right),
            chain!(right, "右薬指１"),
            chain!(right, "右薬指１", "右薬指２"),
        ],
    );
    finger(
        &mut e,
        [LeftRing1, LeftRing2, LeftRing3, LeftRing],
        ["左薬指１", "左薬指２", "左薬指３"],
        (LeftIndex1, LeftPinky1),
        [
            chain!(left),
            chain!(left, "左薬指１"),
            chain!(left, "左薬指１", "左薬指２"),
        ],
    );
    finger(
        &mut e,
        [RightPinky1, RightPinky2, RightPinky3, RightPinky],
        ["右小指１", "右小指２", "右小指３"],
        (RightIndex1, RightPinky1),
        [
            chain!(right),
            chain!(right, "右小指１"),
            chain!(right, "右小指１", "右小指２"),
        ],
    );
    finger(
        &mut e,
        [LeftPinky1, LeftPinky2, LeftPinky3, LeftPinky],
        ["左小指１", "左小指２", "左小指３"],
        (LeftIndex1, LeftPinky1),
        [
            chain!(left),
            chain!(left, "左小指１"),
            chain!(left, "左小指１", "左小指２"),
        ],
    );

    for (joint, bone) in [
        (RightThumb, "右親指先"),
        (LeftThumb, "左親指先"),
        (RightIndex, "右人差指先"),
        (LeftIndex, "左人差指先"),
        (RightMiddle, "右中指先"),
        (LeftMiddle, "左中指先"),
        (RightRing, "右薬指先"),
        (LeftRing, "左薬指先"),
        (RightPinky, "右小指先"),
        (LeftPinky, "左小指先"),
    ] {
        e.push(MappingEntry::new(joint, bone).hand());
    }

    e
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_ancestor_solved_first() {
        let table = JointMapping::standard();
        for (i, entry) in table.entries().iter().enumerate() {
            for ancestor in entry.ancestors {
                let pos = table
                    .entries()
                    .iter()
                    .position(|e| e.bone == *ancestor && e.recipe.is_some());
                assert!(
                    matches!(pos, Some(p) if p < i),
                    "{} needs {} solved first",
                    entry.bone,
                    ancestor
                );
            }
        }
    }

    #[test]
    fn test_one_entry_per_joint() {
        let table = JointMapping::standard();
        assert_eq!(table.entries().len(), Joint::ALL.len());
        for &joint in Joint::ALL {
            assert!(table.get(joint).is_some(), "{:?} unmapped", joint);
        }
    }

    #[test]
    fn test_flags() {
        let table = JointMapping::standard();
        assert!(table.get(Joint::Head).unwrap().is_head);
        assert!(table.get(Joint::Neck).unwrap().is_head);
        assert!(!table.get(Joint::Spine1).unwrap().is_head);
        assert!(table.get(Joint::LeftWrist).unwrap().is_hand);
        assert!(table.get(Joint::RightPinky3).unwrap().is_hand);
        assert!(!table.get(Joint::LeftElbow).unwrap().is_hand);
        assert!(table.get(Joint::RightKnee).unwrap().is_right());
        assert!(table.entries().iter().all(|e| e.limits.is_none()));
    }

    #[test]
    fn test_hand_bases_stay_on_their_side() {
        let table = JointMapping::standard();
        for entry in table.entries().iter().filter(|e| e.is_hand) {
            let side = if entry.is_right() { "right" } else { "left" };
            let joints = match entry.recipe {
                Some(BasisRecipe::Six {
                    direction,
                    up,
                    cross,
                }) => vec![direction.0, direction.1, up.0, up.1, cross.0, cross.1],
                Some(BasisRecipe::Four { direction, up }) => {
                    vec![direction.0, direction.1, up.0, up.1]
                }
                None => Vec::new(),
            };
            for joint in joints {
                assert!(
                    joint.name().starts_with(side),
                    "{} uses {}",
                    entry.bone,
                    joint.name()
                );
            }
        }
    }

    #[test]
    fn test_rest_position_lookup() {
        let rig = crate::skeleton::test_rig();
        let table = JointMapping::standard();
        assert_eq!(table.rest_position(&rig, Joint::LeftKnee), Vec3::new(1.0, 5.0, 0.0));
        // mapped but missing from the rig
        assert_eq!(table.rest_position(&rig, Joint::LeftEar), Vec3::ZERO);
    }
}
