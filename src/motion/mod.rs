//! In-memory motion document: bone and morph keyframes of one subject.
//!
//! Channels are keyed by bone / morph name and hold one entry per frame.
//! Bone entries carry a `keyed` flag: keyed entries are authoritative, the
//! others only exist to be read back at their own frame and are skipped by
//! neighbour lookup and by the export.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use serde::Serialize;

use crate::skeleton::Bone;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneKeyframe {
    /// Parent-relative rotation
    pub rotation: Quat,
    /// Position offset (root and IK bones only)
    pub position: Vec3,
    pub keyed: bool,
}

impl BoneKeyframe {
    pub fn new(rotation: Quat, position: Vec3) -> Self {
        Self {
            rotation,
            position,
            keyed: true,
        }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self::new(rotation, Vec3::ZERO)
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(Quat::IDENTITY, position)
    }

    /// Identity rotation, zero offset, keyed
    pub fn identity() -> Self {
        Self::new(Quat::IDENTITY, Vec3::ZERO)
    }

    pub fn with_keyed(mut self, keyed: bool) -> Self {
        self.keyed = keyed;
        self
    }
}

/// One bone keyframe in the export shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoneFrameExport {
    pub name: String,
    pub frame: u32,
    pub position: Vec3,
    pub rotation: Quat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MorphFrameExport {
    pub name: String,
    pub frame: u32,
    pub value: f32,
}

/// Keyed entries only, ordered by channel name then frame
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MotionExport {
    pub bones: Vec<BoneFrameExport>,
    pub morphs: Vec<MorphFrameExport>,
}

#[derive(Debug, Clone, Default)]
pub struct MotionDocument {
    bones: BTreeMap<String, BTreeMap<u32, BoneKeyframe>>,
    morphs: BTreeMap<String, BTreeMap<u32, f32>>,
}

impl MotionDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or overwrite) a bone entry.
    pub fn insert_bone(&mut self, name: &str, frame: u32, keyframe: BoneKeyframe) {
        self.bones
            .entry(name.to_string())
            .or_default()
            .insert(frame, keyframe);
    }

    pub fn bone(&self, name: &str, frame: u32) -> Option<&BoneKeyframe> {
        self.bones.get(name).and_then(|channel| channel.get(&frame))
    }

    pub fn bone_mut(&mut self, name: &str, frame: u32) -> Option<&mut BoneKeyframe> {
        self.bones
            .get_mut(name)
            .and_then(|channel| channel.get_mut(&frame))
    }

    pub fn remove_bone(&mut self, name: &str, frame: u32) -> Option<BoneKeyframe> {
        self.bones
            .get_mut(name)
            .and_then(|channel| channel.remove(&frame))
    }

    /// Frames holding an entry for `name`, ascending
    pub fn bone_frames(&self, name: &str) -> Vec<u32> {
        self.bones
            .get(name)
            .map(|channel| channel.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Frames holding an entry for any of `names`, ascending and deduplicated
    pub fn bone_frames_any(&self, names: &[&str]) -> Vec<u32> {
        let mut frames: Vec<u32> = names.iter().flat_map(|n| self.bone_frames(n)).collect();
        frames.sort_unstable();
        frames.dedup();
        frames
    }

    /// Latest keyed frame strictly before `frame`
    pub fn prev_keyed(&self, name: &str, frame: u32) -> Option<u32> {
        self.bones.get(name).and_then(|channel| {
            channel
                .range(..frame)
                .rev()
                .find(|(_, k)| k.keyed)
                .map(|(&f, _)| f)
        })
    }

    /// Earliest keyed frame strictly after `frame`
    pub fn next_keyed(&self, name: &str, frame: u32) -> Option<u32> {
        self.bones.get(name).and_then(|channel| {
            channel
                .range(frame.saturating_add(1)..)
                .find(|(_, k)| k.keyed)
                .map(|(&f, _)| f)
        })
    }

    /// Value of a bone channel at any frame.
    ///
    /// An entry stored at `frame` is returned as is. Otherwise the value is
    /// interpolated between the surrounding keyed entries (slerp / lerp),
    /// clamped to the nearest one outside the keyed range, and identity for
    /// a channel without keyed entries. Derived values are never keyed.
    pub fn bone_at(&self, name: &str, frame: u32) -> BoneKeyframe {
        if let Some(exact) = self.bone(name, frame) {
            return *exact;
        }

        let prev = self
            .prev_keyed(name, frame)
            .and_then(|f| self.bone(name, f).map(|k| (f, *k)));
        let next = self
            .next_keyed(name, frame)
            .and_then(|f| self.bone(name, f).map(|k| (f, *k)));

        let value = match (prev, next) {
            (Some((pf, p)), Some((nf, n))) => {
                let t = (frame - pf) as f32 / (nf - pf) as f32;
                BoneKeyframe::new(
                    p.rotation.slerp(n.rotation, t).normalize(),
                    p.position.lerp(n.position, t),
                )
            }
            (Some((_, k)), None) | (None, Some((_, k))) => k,
            (None, None) => BoneKeyframe::identity(),
        };
        value.with_keyed(false)
    }

    /// Pose callback for forward kinematics at `frame`, reading every bone
    /// through [`bone_at`](Self::bone_at).
    pub fn pose_at(&self, frame: u32) -> impl Fn(&Bone) -> (Quat, Vec3) + '_ {
        move |bone: &Bone| {
            let k = self.bone_at(&bone.name, frame);
            (k.rotation, k.position)
        }
    }

    pub fn insert_morph(&mut self, name: &str, frame: u32, value: f32) {
        self.morphs
            .entry(name.to_string())
            .or_default()
            .insert(frame, value);
    }

    pub fn morph(&self, name: &str, frame: u32) -> Option<f32> {
        self.morphs.get(name).and_then(|c| c.get(&frame)).copied()
    }

    pub fn bone_keyframe_count(&self) -> usize {
        self.bones.values().map(BTreeMap::len).sum()
    }

    pub fn morph_keyframe_count(&self) -> usize {
        self.morphs.values().map(BTreeMap::len).sum()
    }

    /// Finalize for the serializer: keyed bone entries and every morph entry.
    pub fn export(&self) -> MotionExport {
        let bones = self
            .bones
            .iter()
            .flat_map(|(name, channel)| {
                channel
                    .iter()
                    .filter(|(_, k)| k.keyed)
                    .map(move |(&frame, k)| BoneFrameExport {
                        name: name.clone(),
                        frame,
                        position: k.position,
                        rotation: k.rotation,
                    })
            })
            .collect();
        let morphs = self
            .morphs
            .iter()
            .flat_map(|(name, channel)| {
                channel.iter().map(move |(&frame, &value)| MorphFrameExport {
                    name: name.clone(),
                    frame,
                    value,
                })
            })
            .collect();
        MotionExport { bones, morphs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_empty_channel_is_identity() {
        let doc = MotionDocument::new();
        let k = doc.bone_at("頭", 5);
        assert_eq!(k.rotation, Quat::IDENTITY);
        assert_eq!(k.position, Vec3::ZERO);
        assert!(!k.keyed);
    }

    #[test]
    fn test_exact_entry_wins_even_unkeyed() {
        let mut doc = MotionDocument::new();
        let q = Quat::from_rotation_y(0.3);
        doc.insert_bone("頭", 0, BoneKeyframe::identity());
        doc.insert_bone("頭", 4, BoneKeyframe::from_rotation(q).with_keyed(false));
        doc.insert_bone("頭", 8, BoneKeyframe::identity());
        assert_eq!(doc.bone_at("頭", 4).rotation, q);
        assert!(!doc.bone_at("頭", 4).keyed);
    }

    #[test]
    fn test_interpolates_between_keyed_neighbours() {
        let mut doc = MotionDocument::new();
        doc.insert_bone("センター", 0, BoneKeyframe::from_position(Vec3::ZERO));
        // unkeyed entries are skipped by neighbour lookup
        doc.insert_bone(
            "センター",
            2,
            BoneKeyframe::from_position(Vec3::splat(100.0)).with_keyed(false),
        );
        doc.insert_bone(
            "センター",
            4,
            BoneKeyframe::new(Quat::from_rotation_x(FRAC_PI_2), Vec3::new(4.0, 0.0, -8.0)),
        );

        let k = doc.bone_at("センター", 1);
        assert!(k.position.abs_diff_eq(Vec3::new(1.0, 0.0, -2.0), 1e-6));
        let expected = Quat::from_rotation_x(FRAC_PI_2 / 4.0);
        assert!(k.rotation.dot(expected).abs() > 1.0 - 1e-5);
    }

    #[test]
    fn test_nearest_outside_keyed_range() {
        let mut doc = MotionDocument::new();
        doc.insert_bone("首", 3, BoneKeyframe::from_rotation(Quat::from_rotation_z(0.2)));
        doc.insert_bone("首", 6, BoneKeyframe::from_rotation(Quat::from_rotation_z(0.4)));
        assert_eq!(doc.bone_at("首", 0).rotation, Quat::from_rotation_z(0.2));
        assert_eq!(doc.bone_at("首", 10).rotation, Quat::from_rotation_z(0.4));
    }

    #[test]
    fn test_prev_next_keyed() {
        let mut doc = MotionDocument::new();
        doc.insert_bone("首", 1, BoneKeyframe::identity());
        doc.insert_bone("首", 2, BoneKeyframe::identity().with_keyed(false));
        doc.insert_bone("首", 5, BoneKeyframe::identity());
        assert_eq!(doc.prev_keyed("首", 5), Some(1));
        assert_eq!(doc.prev_keyed("首", 1), None);
        assert_eq!(doc.next_keyed("首", 1), Some(5));
        assert_eq!(doc.next_keyed("首", 5), None);
        assert_eq!(doc.prev_keyed("頭", 5), None);
    }

    #[test]
    fn test_remove_and_frames() {
        let mut doc = MotionDocument::new();
        doc.insert_bone("左足", 1, BoneKeyframe::identity());
        doc.insert_bone("左ひざ", 3, BoneKeyframe::identity());
        doc.insert_bone("左足", 3, BoneKeyframe::identity());
        assert_eq!(doc.bone_frames_any(&["左足", "左ひざ", "左足首"]), vec![1, 3]);
        assert!(doc.remove_bone("左足", 1).is_some());
        assert_eq!(doc.bone_frames("左足"), vec![3]);
        assert!(doc.remove_bone("左足", 1).is_none());
    }

    #[test]
    fn test_export_skips_unkeyed() {
        let mut doc = MotionDocument::new();
        doc.insert_bone("首", 0, BoneKeyframe::identity());
        doc.insert_bone("首", 1, BoneKeyframe::identity().with_keyed(false));
        doc.insert_morph("あ", 0, 0.5);
        let export = doc.export();
        assert_eq!(export.bones.len(), 1);
        assert_eq!(export.bones[0].frame, 0);
        assert_eq!(export.morphs.len(), 1);
        assert_eq!(export.morphs[0].value, 0.5);

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["bones"][0]["name"], "首");
        assert_eq!(json["bones"][0]["rotation"].as_array().unwrap().len(), 4);
    }
}
