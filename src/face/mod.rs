//! Facial morph weights from 2D landmarks.
//!
//! Everything here is a pure function of one frame. Ratios are not guarded
//! against degenerate denominators; every weight goes through [`unit`] on
//! the way out instead.

pub mod morphs;

use glam::{EulerRot, Quat, Vec2};

use crate::keypoints::{EyeContour, FaceLandmark, KeypointFrame};
use crate::motion::{BoneKeyframe, MotionDocument};
use crate::skeleton::names::BOTH_EYES;
use FaceLandmark::*;

/// Clamp to [0, 1]; NaN becomes 0.
pub fn unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Linear remap of `v` from `[old_min, old_max]` onto `[new_min, new_max]`
fn remap(v: f32, old_min: f32, old_max: f32, new_min: f32, new_max: f32) -> f32 {
    (v - old_min) * (new_max - new_min) / (old_max - old_min) + new_min
}

/// Weights of one frame plus the shared eye rotation
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMorphs {
    pub weights: Vec<(&'static str, f32)>,
    pub gaze: Quat,
}

impl FaceMorphs {
    pub fn weight(&self, name: &str) -> Option<f32> {
        self.weights.iter().find(|(n, _)| *n == name).map(|(_, w)| *w)
    }
}

/// Eyebrow height, frown and asymmetry.
pub fn eyebrow_morphs(frame: &KeypointFrame) -> [(&'static str, f32); 5] {
    let p = |l| frame.landmark(l);

    let nose_width = (p(LeftNostril).x - p(RightNostril).x).abs();
    let frown_ratio = (p(LeftEyebrow1).x - p(RightEyebrow1).x).abs() / nose_width;

    let brow_length = (p(LeftEyebrow1).distance(p(LeftEyebrow5))
        + p(RightEyebrow1).distance(p(RightEyebrow5)))
        / 2.0;

    let gap = |eye_l, brow_l, eye_r, brow_r| {
        (p(eye_l).distance(p(brow_l)) + p(eye_r).distance(p(brow_r))) / 2.0 / brow_length
    };
    let outer_ratio = gap(LeftEye1, LeftEyebrow1, RightEye1, RightEyebrow1);
    let center_ratio = gap(LeftEye2, LeftEyebrow3, RightEye2, RightEyebrow3);
    let inner_ratio = gap(LeftEye4, LeftEyebrow5, RightEye4, RightEyebrow5);

    let updown = center_ratio - 0.5;
    let (up, down) = if updown >= 0.2 {
        (unit(updown.abs() + 0.3), 0.0)
    } else {
        (0.0, unit(updown.abs() + 0.3))
    };

    let (angry, cheerful) = if outer_ratio >= inner_ratio {
        (unit(outer_ratio - inner_ratio), 0.0)
    } else {
        (0.0, unit(inner_ratio - outer_ratio))
    };

    [
        (morphs::BROW_UP, up),
        (morphs::BROW_DOWN, down),
        (morphs::BROW_TROUBLED, unit(0.8 - frown_ratio)),
        (morphs::BROW_ANGRY, angry),
        (morphs::BROW_CHEERFUL, cheerful),
    ]
}

/// Mouth corner smile/frown and vowel shapes.
pub fn mouth_morphs(frame: &KeypointFrame) -> [(&'static str, f32); 6] {
    let p = |l| frame.landmark(l);
    let mean3 = |a, b, c| (p(a) + p(b) + p(c)) / 3.0;

    let nose_width = (p(LeftNostril).x - p(RightNostril).x).abs();
    let corner_center = (p(LeftMouthCorner) + p(RightMouthCorner)) / 2.0;
    let width_ratio = (p(LeftMouthCorner).x - p(RightMouthCorner).x).abs() / nose_width;

    let top_mouth = mean3(RightMouthUpper, MouthTop, LeftMouthUpper);
    let top_lip = mean3(RightLipUpper, LipTop, LeftLipUpper);
    let bottom_mouth = mean3(RightMouthLower, MouthBottom, LeftMouthLower);
    let bottom_lip = mean3(RightLipLower, LipBottom, LeftLipLower);

    let outer_gap = bottom_mouth.y - top_mouth.y;
    let open_ratio = (bottom_lip.y - top_lip.y) / outer_gap;
    let smile_ratio = (bottom_mouth.y - corner_center.y) / outer_gap;

    let (frown, grin) = if smile_ratio >= 0.0 {
        (0.0, unit(smile_ratio.abs()))
    } else {
        (unit(smile_ratio.abs()), 0.0)
    };

    let wide = (1.0 - smile_ratio.min(0.7)).min(open_ratio);
    let (i, u, a, o) = if width_ratio > 1.3 {
        ((1.5 / width_ratio).min(1.0) * open_ratio, 0.0, wide, 0.0)
    } else {
        (0.0, (1.2 / width_ratio) * open_ratio, 0.0, wide)
    };

    [
        (morphs::MOUTH_FROWN, frown),
        (morphs::MOUTH_GRIN, grin),
        (morphs::MOUTH_I, unit(i)),
        (morphs::MOUTH_U, unit(u)),
        (morphs::MOUTH_A, unit(a)),
        (morphs::MOUTH_O, unit(o)),
    ]
}

/// Openness split of one eye, before cross-eye normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeState {
    /// Plain closure
    pub blink: f32,
    /// Closure with the lower lid raised
    pub smile: f32,
    /// Gaze as (pitch, yaw) in degrees
    pub gaze: Vec2,
}

pub fn eye_state(frame: &KeypointFrame, contour: &EyeContour, pupil: Option<Vec2>) -> EyeState {
    let [e1, e2, e3, e4, e5, e6] = contour.points.map(|l| frame.landmark(l));

    let corner_center = (e1 + e4) / 2.0;
    let top = (e2 + e3) / 2.0;
    let bottom = (e5 + e6) / 2.0;

    let aspect = e4.distance(e1) / top.distance(bottom);
    let closure = remap(aspect, 0.0, 12.0, 0.0, 1.0).sin().min(1.0);

    let smile_ratio = (bottom.y - corner_center.y) / (bottom.y - top.y);
    if smile_ratio > 1.0 {
        // corners above the upper lid: treat as a plain blink
        return EyeState {
            blink: 1.0,
            smile: 0.0,
            gaze: Vec2::ZERO,
        };
    }

    let mut gaze = Vec2::ZERO;
    if let Some(pupil) = pupil.filter(|p| *p != Vec2::ZERO) {
        let (min_x, max_x) = (e1.x.min(e4.x), e1.x.max(e4.x));
        let horizontal = (pupil.x - min_x) / (max_x - min_x);
        let vertical = (pupil.y - top.y) / (bottom.y - top.y);
        if horizontal.abs() <= 1.0 && vertical.abs() <= 1.0 {
            gaze = Vec2::new(
                -remap(vertical, 0.0, 1.0, -15.0, 15.0),
                -remap(horizontal, 0.0, 1.0, -30.0, 20.0),
            );
        }
    }

    EyeState {
        blink: closure * (1.0 - smile_ratio),
        smile: closure * smile_ratio,
        gaze,
    }
}

/// Combine both eyes into the six eye morphs.
///
/// Each eye's smile drives its ウィンク morph and its blink drives its
/// ウィンク２ morph; the subject's left eye drives the rig's right-eye
/// morphs. The value shared by both ウィンク morphs becomes まばたき and is
/// taken off both ウィンク２ morphs. The value shared by both ウィンク２ morphs
/// becomes 笑い and is taken off both ウィンク morphs.
pub fn blend_eyes(left: EyeState, right: EyeState) -> ([(&'static str, f32); 6], Quat) {
    let (wink_r, wink_l) = (unit(left.smile), unit(right.smile));
    let (wink2_r, wink2_l) = (unit(left.blink), unit(right.blink));

    let shared_wink = wink_r.min(wink_l);
    let shared_wink2 = wink2_r.min(wink2_l);

    let weights = [
        (morphs::WINK_RIGHT, unit(wink_r - shared_wink2)),
        (morphs::WINK_LEFT, unit(wink_l - shared_wink2)),
        (morphs::WINK2_RIGHT, unit(wink2_r - shared_wink)),
        (morphs::WINK2_LEFT, unit(wink2_l - shared_wink)),
        (morphs::BLINK, unit(shared_wink)),
        (morphs::SMILE_EYES, unit(shared_wink2)),
    ];

    let gaze = (left.gaze + right.gaze) / 2.0;
    let rotation = Quat::from_euler(
        EulerRot::YXZ,
        gaze.y.to_radians(),
        gaze.x.to_radians(),
        0.0,
    );
    (weights, rotation)
}

/// All face morphs of one frame.
pub fn solve(frame: &KeypointFrame) -> FaceMorphs {
    let pupils = frame.pupils;
    let left = eye_state(frame, &EyeContour::LEFT, pupils.map(|p| p.left));
    let right = eye_state(frame, &EyeContour::RIGHT, pupils.map(|p| p.right));
    let (eyes, gaze) = blend_eyes(left, right);

    let mut weights = Vec::with_capacity(17);
    weights.extend(eyes);
    weights.extend(mouth_morphs(frame));
    weights.extend(eyebrow_morphs(frame));
    FaceMorphs { weights, gaze }
}

/// Write one frame's morphs and eye rotation into `doc`.
pub fn apply(doc: &mut MotionDocument, frame: u32, morphs: &FaceMorphs) {
    for &(name, weight) in &morphs.weights {
        doc.insert_morph(name, frame, weight);
    }
    doc.insert_bone(BOTH_EYES, frame, BoneKeyframe::from_rotation(morphs.gaze));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::Pupils;
    use std::collections::HashMap;

    /// A neutral, front-facing face in image coordinates (y down)
    fn neutral_face() -> HashMap<FaceLandmark, Vec2> {
        let mut m = HashMap::new();
        // eyebrows
        for (i, l) in [LeftEyebrow1, LeftEyebrow2, LeftEyebrow3, LeftEyebrow4, LeftEyebrow5]
            .into_iter()
            .enumerate()
        {
            m.insert(l, Vec2::new(110.0 + 10.0 * i as f32, 80.0));
        }
        for (i, l) in [RightEyebrow1, RightEyebrow2, RightEyebrow3, RightEyebrow4, RightEyebrow5]
            .into_iter()
            .enumerate()
        {
            m.insert(l, Vec2::new(90.0 - 10.0 * i as f32, 80.0));
        }
        // eyes: outer corner, upper lid x2, inner corner, lower lid x2
        let eye = |cx: f32, dir: f32| {
            [
                Vec2::new(cx + 15.0 * dir, 100.0),
                Vec2::new(cx + 5.0 * dir, 95.0),
                Vec2::new(cx - 5.0 * dir, 95.0),
                Vec2::new(cx - 15.0 * dir, 100.0),
                Vec2::new(cx - 5.0 * dir, 105.0),
                Vec2::new(cx + 5.0 * dir, 105.0),
            ]
        };
        for (l, p) in EyeContour::LEFT.points.iter().zip(eye(130.0, 1.0)) {
            m.insert(*l, p);
        }
        for (l, p) in EyeContour::RIGHT.points.iter().zip(eye(70.0, -1.0)) {
            m.insert(*l, p);
        }
        m.insert(LeftNostril, Vec2::new(115.0, 140.0));
        m.insert(RightNostril, Vec2::new(85.0, 140.0));
        // mouth, closed
        m.insert(LeftMouthCorner, Vec2::new(125.0, 170.0));
        m.insert(RightMouthCorner, Vec2::new(75.0, 170.0));
        for (l, x) in [(RightMouthUpper, 90.0), (MouthTop, 100.0), (LeftMouthUpper, 110.0)] {
            m.insert(l, Vec2::new(x, 162.0));
        }
        for (l, x) in [(RightMouthLower, 90.0), (MouthBottom, 100.0), (LeftMouthLower, 110.0)] {
            m.insert(l, Vec2::new(x, 178.0));
        }
        for (l, x) in [(RightLipUpper, 90.0), (LipTop, 100.0), (LeftLipUpper, 110.0)] {
            m.insert(l, Vec2::new(x, 169.0));
        }
        for (l, x) in [(RightLipLower, 90.0), (LipBottom, 100.0), (LeftLipLower, 110.0)] {
            m.insert(l, Vec2::new(x, 171.0));
        }
        m
    }

    fn frame_from(landmarks: &HashMap<FaceLandmark, Vec2>) -> KeypointFrame {
        let faces = landmarks.iter().map(|(l, p)| (l.index(), *p)).collect();
        KeypointFrame {
            faces: Some(faces),
            ..KeypointFrame::new(0)
        }
    }

    fn assert_all_unit(morphs: &FaceMorphs) {
        for (name, w) in &morphs.weights {
            assert!((0.0..=1.0).contains(w), "{} = {}", name, w);
        }
    }

    #[test]
    fn test_unit_clamp() {
        assert_eq!(unit(f32::NAN), 0.0);
        assert_eq!(unit(-3.0), 0.0);
        assert_eq!(unit(3.0), 1.0);
        assert_eq!(unit(f32::INFINITY), 1.0);
        assert_eq!(unit(0.25), 0.25);
    }

    #[test]
    fn test_neutral_face_in_range() {
        let morphs = solve(&frame_from(&neutral_face()));
        assert_all_unit(&morphs);
        assert_eq!(morphs.weights.len(), 17);
        // both eyes identical: the shared values move to the both-eye morphs
        assert_eq!(morphs.weight(morphs::WINK_RIGHT), Some(0.0));
        assert_eq!(morphs.weight(morphs::WINK_LEFT), Some(0.0));
        assert!(morphs.weight(morphs::BLINK).unwrap() > 0.0);
    }

    #[test]
    fn test_empty_face_in_range() {
        // every landmark at the origin: all ratios are 0/0
        let morphs = solve(&KeypointFrame {
            faces: Some(HashMap::new()),
            ..KeypointFrame::new(0)
        });
        assert_all_unit(&morphs);
    }

    #[test]
    fn test_scrambled_faces_in_range() {
        // deterministic pseudo-random landmark clouds
        let mut seed = 12345u32;
        let mut next = || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            (seed >> 8) as f32 / (1u32 << 24) as f32 * 400.0 - 100.0
        };
        for _ in 0..200 {
            let mut landmarks = neutral_face();
            for p in landmarks.values_mut() {
                *p = Vec2::new(next(), next());
            }
            let mut frame = frame_from(&landmarks);
            frame.pupils = Some(Pupils {
                left: Vec2::new(next(), next()),
                right: Vec2::new(next(), next()),
            });
            assert_all_unit(&solve(&frame));
        }
    }

    #[test]
    fn test_open_mouth_wide_is_a() {
        let mut face = neutral_face();
        for l in [RightLipLower, LipBottom, LeftLipLower] {
            face.get_mut(&l).unwrap().y = 177.0;
        }
        for l in [RightLipUpper, LipTop, LeftLipUpper] {
            face.get_mut(&l).unwrap().y = 163.0;
        }
        let morphs = mouth_morphs(&frame_from(&face));
        let get = |n: &str| morphs.iter().find(|(m, _)| *m == n).unwrap().1;
        // width ratio 50/30 > 1.3: "i"/"a" side
        assert!((get(morphs::MOUTH_A) - 0.5).abs() < 1e-5);
        assert!(get(morphs::MOUTH_I) > 0.7);
        assert_eq!(get(morphs::MOUTH_U), 0.0);
        assert_eq!(get(morphs::MOUTH_O), 0.0);
    }

    fn eye(blink: f32, smile: f32) -> EyeState {
        EyeState {
            blink,
            smile,
            gaze: Vec2::ZERO,
        }
    }

    fn eye_weight(weights: &[(&'static str, f32)], name: &str) -> f32 {
        weights.iter().find(|(m, _)| *m == name).unwrap().1
    }

    #[test]
    fn test_shared_values_cross_subtracted() {
        let (weights, gaze) = blend_eyes(eye(0.2, 0.6), eye(0.5, 0.3));
        let expected = [
            (morphs::WINK_RIGHT, 0.4),
            (morphs::WINK_LEFT, 0.1),
            (morphs::WINK2_RIGHT, 0.0),
            (morphs::WINK2_LEFT, 0.2),
            (morphs::BLINK, 0.3),
            (morphs::SMILE_EYES, 0.2),
        ];
        for (name, value) in expected {
            let w = eye_weight(&weights, name);
            assert!((w - value).abs() < 1e-6, "{} = {}, expected {}", name, w, value);
        }
        assert_eq!(gaze, Quat::IDENTITY);
    }

    #[test]
    fn test_both_eyes_closed() {
        let (weights, _) = blend_eyes(eye(1.0, 0.0), eye(1.0, 0.0));
        assert_eq!(eye_weight(&weights, morphs::WINK2_RIGHT), 1.0);
        assert_eq!(eye_weight(&weights, morphs::WINK2_LEFT), 1.0);
        assert_eq!(eye_weight(&weights, morphs::SMILE_EYES), 1.0);
        assert_eq!(eye_weight(&weights, morphs::BLINK), 0.0);
        assert_eq!(eye_weight(&weights, morphs::WINK_RIGHT), 0.0);
        assert_eq!(eye_weight(&weights, morphs::WINK_LEFT), 0.0);
    }

    #[test]
    fn test_corners_above_lid_is_full_blink() {
        let mut face = neutral_face();
        for l in [LeftEye1, LeftEye4] {
            face.get_mut(&l).unwrap().y = 90.0;
        }
        let state = eye_state(&frame_from(&face), &EyeContour::LEFT, None);
        assert_eq!(state.blink, 1.0);
        assert_eq!(state.smile, 0.0);
    }

    #[test]
    fn test_pupil_gaze() {
        let face = neutral_face();
        let frame = frame_from(&face);
        // left eye spans x 115..145, lids at y 95..105
        let centered = eye_state(&frame, &EyeContour::LEFT, Some(Vec2::new(130.0, 100.0)));
        assert!((centered.gaze.x - 0.0).abs() < 1e-4);
        assert!((centered.gaze.y - 5.0).abs() < 1e-4);
        // far outside the eye: ignored
        let outside = eye_state(&frame, &EyeContour::LEFT, Some(Vec2::new(500.0, 100.0)));
        assert_eq!(outside.gaze, Vec2::ZERO);
    }

    #[test]
    fn test_apply_writes_morphs_and_eyes() {
        let mut doc = MotionDocument::new();
        let morphs = solve(&frame_from(&neutral_face()));
        apply(&mut doc, 7, &morphs);
        assert!(doc.morph(morphs::MOUTH_A, 7).is_some());
        assert!(doc.bone(BOTH_EYES, 7).is_some());
    }
}
