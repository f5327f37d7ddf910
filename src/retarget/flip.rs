//! Left/right mirror-flip detection between consecutive frames.

use crate::keypoints::{Joint, KeypointFrame};

/// Joint pairs whose side of the pelvis is checked
const PAIRS: [(Joint, Joint); 2] = [
    (Joint::LeftHip, Joint::RightHip),
    (Joint::LeftShoulder, Joint::RightShoulder),
];

/// Sign as -1, 0 or 1 (zero stays zero, unlike `f32::signum`)
fn sign(v: f32) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// True when `current` looks like a left/right mirror of `previous`.
///
/// For either the hip or the shoulder pair: both joints switched side of the
/// pelvis on the X axis, both moved more than `threshold`, and the pair is
/// still more than `threshold` apart.
pub fn is_flipped(previous: &KeypointFrame, current: &KeypointFrame, threshold: f32) -> bool {
    let prev_pelvis = previous.joint(Joint::Pelvis).x;
    let pelvis = current.joint(Joint::Pelvis).x;

    PAIRS.iter().any(|&(left, right)| {
        let (pl, pr) = (previous.joint(left).x, previous.joint(right).x);
        let (l, r) = (current.joint(left).x, current.joint(right).x);

        sign(pl - prev_pelvis) != sign(l - pelvis)
            && sign(pr - prev_pelvis) != sign(r - pelvis)
            && (l - pl).abs() > threshold
            && (r - pr).abs() > threshold
            && (l - r).abs() > threshold
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn frame(hip_x: f32, shoulder_x: f32) -> KeypointFrame {
        KeypointFrame::new(0)
            .with_joint(Joint::Pelvis, Vec3::ZERO)
            .with_joint(Joint::LeftHip, Vec3::new(hip_x, 0.0, 0.0))
            .with_joint(Joint::RightHip, Vec3::new(-hip_x, 0.0, 0.0))
            .with_joint(Joint::LeftShoulder, Vec3::new(shoulder_x, 0.5, 0.0))
            .with_joint(Joint::RightShoulder, Vec3::new(-shoulder_x, 0.5, 0.0))
    }

    #[test]
    fn test_mirrored_pose_is_flipped() {
        // each joint moves 0.2 and the pair stays 0.2 apart
        let prev = frame(0.1, 0.1);
        let current = frame(-0.1, -0.1);
        assert!(is_flipped(&prev, &current, 0.15));
    }

    #[test]
    fn test_small_displacement_is_not_flipped() {
        // signs invert but every joint only moves 0.05
        let prev = frame(0.025, 0.025);
        let current = frame(-0.025, -0.025);
        assert!(!is_flipped(&prev, &current, 0.15));
    }

    #[test]
    fn test_same_side_is_not_flipped() {
        let prev = frame(0.1, 0.2);
        let current = frame(0.4, 0.5);
        assert!(!is_flipped(&prev, &current, 0.15));
    }

    #[test]
    fn test_shoulders_alone_can_flag() {
        let prev = frame(0.1, 0.2);
        let current = frame(0.1, -0.2);
        assert!(is_flipped(&prev, &current, 0.15));
    }

    #[test]
    fn test_sign_of_zero() {
        assert_eq!(sign(0.0), 0);
        assert_eq!(sign(-0.0), 0);
        assert_eq!(sign(2.0), 1);
        assert_eq!(sign(-2.0), -1);
    }
}
