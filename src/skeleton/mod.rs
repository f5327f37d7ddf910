//! Rest skeleton of the target rig.
//!
//! Bones live in an arena addressed by [`BoneId`]; parent, tail and IK
//! references are stored as ids so the hierarchy stays a plain tree of
//! indices. The skeleton is built once (usually from a CSV export, see
//! [`csv`]) and then only read.

pub mod csv;
pub mod names;

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};
use tracing::debug;

use crate::error::{Result, SkeletonError};
use names::Side;

/// Stable handle of a bone in a [`Skeleton`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(pub usize);

/// Per-axis rotation limits of one IK link, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLimits {
    pub min: Vec3,
    pub max: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IkLink {
    pub bone: BoneId,
    pub limits: Option<AxisLimits>,
}

/// IK solver definition attached to an IK bone
#[derive(Debug, Clone, PartialEq)]
pub struct IkDef {
    pub target: BoneId,
    pub loop_count: u32,
    /// Per-iteration angle limit, radians
    pub limit_angle: f32,
    /// Link chain, effector side first
    pub links: Vec<IkLink>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub english_name: String,
    /// Rest position in model space
    pub position: Vec3,
    pub parent: Option<BoneId>,
    /// Display target, used to derive the local axis
    pub tail: Option<BoneId>,
    pub layer: i32,
    pub ik: Option<IkDef>,
}

impl Bone {
    pub fn new(name: impl Into<String>, position: Vec3, parent: Option<BoneId>) -> Self {
        Self {
            name: name.into(),
            english_name: String::new(),
            position,
            parent,
            tail: None,
            layer: 0,
            ik: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    by_name: HashMap<String, BoneId>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a bone. A bone with the same name is replaced in place and
    /// keeps its id.
    pub fn add(&mut self, bone: Bone) -> BoneId {
        if let Some(&id) = self.by_name.get(&bone.name) {
            self.bones[id.0] = bone;
            return id;
        }
        let id = BoneId(self.bones.len());
        self.by_name.insert(bone.name.clone(), id);
        self.bones.push(bone);
        id
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> impl Iterator<Item = (BoneId, &Bone)> {
        self.bones.iter().enumerate().map(|(i, b)| (BoneId(i), b))
    }

    pub fn bone(&self, id: BoneId) -> &Bone {
        &self.bones[id.0]
    }

    pub fn bone_mut(&mut self, id: BoneId) -> &mut Bone {
        &mut self.bones[id.0]
    }

    pub fn id(&self, name: &str) -> Option<BoneId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&Bone> {
        self.id(name).map(|id| self.bone(id))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Id of a bone the caller cannot work without
    pub fn require(&self, name: &str) -> Result<BoneId> {
        self.id(name)
            .ok_or_else(|| SkeletonError::MissingBone(name.to_string()).into())
    }

    /// Rest position by name, zero when the bone does not exist.
    pub fn position(&self, name: &str) -> Vec3 {
        self.get(name).map(|b| b.position).unwrap_or(Vec3::ZERO)
    }

    pub fn children(&self, id: BoneId) -> impl Iterator<Item = BoneId> + '_ {
        self.bones()
            .filter(move |(_, b)| b.parent == Some(id))
            .map(|(child, _)| child)
    }

    /// Ancestors of `id` followed by `id` itself, root first.
    pub fn chain_to_root(&self, id: BoneId) -> Vec<BoneId> {
        let mut chain = vec![id];
        let mut current = self.bone(id).parent;
        while let Some(parent) = current {
            // guards against a malformed cyclic definition
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = self.bone(parent).parent;
        }
        chain.reverse();
        chain
    }

    /// Unit vector from the bone toward its tail bone, or toward the first
    /// child at a different position. Falls back to +X.
    pub fn local_x_axis(&self, id: BoneId) -> Vec3 {
        let bone = self.bone(id);
        let tail = bone
            .tail
            .map(|t| self.bone(t).position)
            .filter(|p| *p != bone.position)
            .or_else(|| {
                self.children(id)
                    .map(|c| self.bone(c).position)
                    .find(|p| *p != bone.position)
            });
        tail.and_then(|p| (p - bone.position).try_normalize())
            .unwrap_or(Vec3::X)
    }

    /// Forward kinematics along `chain` (root first).
    ///
    /// `pose` yields each bone's local rotation and position offset. A bone's
    /// local transform is the translation from its parent's rest position
    /// (plus offset) followed by its rotation; the first bone of the chain is
    /// translated from the origin.
    pub fn world_transforms<F>(&self, chain: &[BoneId], mut pose: F) -> Vec<Mat4>
    where
        F: FnMut(&Bone) -> (Quat, Vec3),
    {
        let mut world = Vec::with_capacity(chain.len());
        let mut parent: Option<(Mat4, Vec3)> = None;

        for &id in chain {
            let bone = self.bone(id);
            let (rotation, offset) = pose(bone);
            let (base, relative) = match parent {
                Some((matrix, parent_pos)) => (matrix, bone.position - parent_pos),
                None => (Mat4::IDENTITY, bone.position),
            };
            let matrix =
                base * Mat4::from_translation(relative + offset) * Mat4::from_quat(rotation);
            world.push(matrix);
            parent = Some((matrix, bone.position));
        }

        world
    }

    /// World positions of every bone in `chain` under `pose`.
    pub fn world_positions<F>(&self, chain: &[BoneId], pose: F) -> Vec<Vec3>
    where
        F: FnMut(&Bone) -> (Quat, Vec3),
    {
        self.world_transforms(chain, pose)
            .iter()
            .map(|m| m.transform_point3(Vec3::ZERO))
            .collect()
    }

    /// Add the helper bones the joint mapping needs but rig exports lack.
    /// Bones that already exist are left alone.
    pub fn synthesize_helpers(&mut self) {
        let mut added = Vec::new();

        if !self.contains(names::NECK_BASE) {
            let left = self.get(&Side::Left.bone(names::SHOULDER)).map(|b| b.position);
            let right = self.get(&Side::Right.bone(names::SHOULDER)).map(|b| b.position);
            if let (Some(left), Some(right)) = (left, right) {
                let mut position = (left + right) / 2.0 + Vec3::new(0.0, -0.1, 0.0);
                position.x = 0.0;
                let parent = self
                    .id(names::UPPER_BODY2)
                    .or_else(|| self.id(names::UPPER_BODY));
                let mut bone = Bone::new(names::NECK_BASE, position, parent);
                bone.english_name = "base of neck".into();
                bone.tail = parent;
                self.add(bone);
                added.push(names::NECK_BASE);
            }
        }

        if let Some(head) = self.get(names::HEAD).map(|b| b.position) {
            if !self.contains(names::NOSE) {
                if let Some(neck) = self.id(names::NECK) {
                    let mut bone =
                        Bone::new(names::NOSE, Vec3::new(0.0, head.y, head.z - 0.5), Some(neck));
                    bone.english_name = "nose".into();
                    bone.tail = self.id(names::HEAD);
                    self.add(bone);
                    added.push(names::NOSE);
                }
            }
            if !self.contains(names::HEAD_TOP) {
                if let Some(nose) = self.id(names::NOSE) {
                    let mut bone =
                        Bone::new(names::HEAD_TOP, Vec3::new(0.0, head.y + 1.0, 0.0), Some(nose));
                    bone.english_name = "top of head".into();
                    self.add(bone);
                    added.push(names::HEAD_TOP);
                }
            }
        }

        if !self.contains(names::TAILBONE) {
            let left = self.get(&Side::Left.bone(names::LEG)).map(|b| b.position);
            let right = self.get(&Side::Right.bone(names::LEG)).map(|b| b.position);
            if let (Some(left), Some(right)) = (left, right) {
                let parent = self.id(names::LOWER_BODY);
                self.add(Bone::new(names::TAILBONE, (left + right) / 2.0, parent));
                added.push(names::TAILBONE);
            }
        }

        for side in Side::BOTH {
            let toe = self.get(&side.bone(names::TOE)).map(|b| b.position);
            let ankle = self.id(&side.bone(names::ANKLE));
            let (Some(toe), Some(ankle)) = (toe, ankle) else {
                continue;
            };
            // the big toe sits on the inner side of each foot
            let inward = match side {
                Side::Left => -0.5,
                Side::Right => 0.5,
            };
            for (suffix, dx) in [(names::BIG_TOE, inward), (names::SMALL_TOE, -inward)] {
                let name = side.bone(suffix);
                if !self.contains(&name) {
                    self.add(Bone::new(name, toe + Vec3::new(dx, 0.0, 0.0), Some(ankle)));
                }
            }
        }

        if !added.is_empty() {
            debug!("Synthesized helper bones: {:?}", added);
        }
    }
}

/// Small symmetric rig used by unit tests across the crate.
#[cfg(test)]
pub(crate) fn test_rig() -> Skeleton {
    use names::*;

    let mut s = Skeleton::new();
    let root = s.add(Bone::new(ROOT, Vec3::ZERO, None));
    let center = s.add(Bone::new(CENTER, Vec3::new(0.0, 8.0, 0.0), Some(root)));
    let groove = s.add(Bone::new(GROOVE, Vec3::new(0.0, 8.2, 0.0), Some(center)));
    let upper = s.add(Bone::new(UPPER_BODY, Vec3::new(0.0, 10.0, 0.0), Some(groove)));
    let upper2 = s.add(Bone::new(UPPER_BODY2, Vec3::new(0.0, 11.5, 0.0), Some(upper)));
    let neck = s.add(Bone::new(NECK, Vec3::new(0.0, 15.0, 0.0), Some(upper2)));
    let head = s.add(Bone::new(HEAD, Vec3::new(0.0, 16.0, 0.0), Some(neck)));
    s.bone_mut(neck).tail = Some(head);
    s.add(Bone::new("左目", Vec3::new(0.3, 16.5, -0.6), Some(head)));
    s.add(Bone::new("右目", Vec3::new(-0.3, 16.5, -0.6), Some(head)));
    s.add(Bone::new(BOTH_EYES, Vec3::new(0.0, 17.5, -0.6), Some(head)));
    let lower = s.add(Bone::new(LOWER_BODY, Vec3::new(0.0, 9.5, 0.0), Some(groove)));

    for side in Side::BOTH {
        let sx = match side {
            Side::Left => 1.0,
            Side::Right => -1.0,
        };
        let shoulder = s.add(Bone::new(
            side.bone(SHOULDER),
            Vec3::new(0.5 * sx, 14.5, 0.0),
            Some(upper2),
        ));
        let arm = s.add(Bone::new(side.bone("腕"), Vec3::new(1.5 * sx, 14.2, 0.0), Some(shoulder)));
        let elbow = s.add(Bone::new(side.bone("ひじ"), Vec3::new(3.5 * sx, 12.5, 0.0), Some(arm)));
        s.add(Bone::new(side.bone("手首"), Vec3::new(5.0 * sx, 11.0, 0.0), Some(elbow)));

        let leg = s.add(Bone::new(side.bone(LEG), Vec3::new(sx, 9.0, 0.0), Some(lower)));
        let knee = s.add(Bone::new(side.bone(KNEE), Vec3::new(sx, 5.0, 0.0), Some(leg)));
        let ankle = s.add(Bone::new(side.bone(ANKLE), Vec3::new(sx, 1.0, 0.0), Some(knee)));
        let toe = s.add(Bone::new(side.bone(TOE), Vec3::new(sx, 0.0, -1.5), Some(ankle)));
        s.bone_mut(leg).tail = Some(knee);
        s.bone_mut(knee).tail = Some(ankle);
        s.bone_mut(ankle).tail = Some(toe);

        let leg_ik = s.add(Bone::new(side.bone(LEG_IK), Vec3::new(sx, 1.0, 0.0), Some(root)));
        s.bone_mut(leg_ik).ik = Some(IkDef {
            target: ankle,
            loop_count: 40,
            limit_angle: 2.0_f32.to_radians(),
            links: vec![
                IkLink {
                    bone: knee,
                    limits: Some(AxisLimits {
                        min: Vec3::new(-180.0, 0.0, 0.0),
                        max: Vec3::new(-0.5, 0.0, 0.0),
                    }),
                },
                IkLink {
                    bone: leg,
                    limits: None,
                },
            ],
        });
        let toe_ik = s.add(Bone::new(side.bone(TOE_IK), Vec3::new(sx, 0.0, -1.5), Some(leg_ik)));
        s.bone_mut(toe_ik).ik = Some(IkDef {
            target: toe,
            loop_count: 3,
            limit_angle: 4.0_f32.to_radians(),
            links: vec![IkLink {
                bone: ankle,
                limits: None,
            }],
        });
    }

    s.synthesize_helpers();
    s
}
