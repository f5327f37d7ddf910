//! Rotation decomposition about local axes and joint-limit clamping.

use glam::{EulerRot, Mat3, Quat, Vec3};

use crate::skeleton::AxisLimits;

/// Rotation angle of `q` in degrees, in [0, 180].
pub fn angle_degrees(q: Quat) -> f32 {
    2.0 * q.w.abs().min(1.0).acos().to_degrees()
}

/// Split `q` into `(twist, swing)` about `axis` so that `q = swing * twist`.
///
/// The twist is a rotation about `axis`, returned with `w ≥ 0`; the swing
/// carries the rest. A zero axis yields `(identity, q)`.
pub fn swing_twist(q: Quat, axis: Vec3) -> (Quat, Quat) {
    let Some(axis) = axis.try_normalize() else {
        return (Quat::IDENTITY, q);
    };
    let swing = Quat::from_rotation_arc(axis, (q * axis).normalize());
    let mut twist = (swing.inverse() * q).normalize();
    if twist.w < 0.0 {
        twist = -twist;
    }
    (twist, swing)
}

/// Magnitude in degrees of `q`'s twist about `axis`, in [0, 180].
pub fn twist_degrees(q: Quat, axis: Vec3) -> f32 {
    angle_degrees(swing_twist(q, axis).0)
}

/// Orthonormal local frame of a bone: +X along the bone, +Z close to the
/// given reference, +Y completing a right-handed basis.
pub fn local_frame(x_axis: Vec3, z_reference: Vec3) -> Mat3 {
    let x = x_axis.try_normalize().unwrap_or(Vec3::X);
    let y = z_reference
        .cross(x)
        .try_normalize()
        .unwrap_or_else(|| x.any_orthonormal_vector());
    Mat3::from_cols(x, y, x.cross(y))
}

/// Euler angles of `q` expressed in `frame`, composed as Y·X·Z, in degrees
/// ordered `(x, y, z)`.
pub fn local_euler_degrees(q: Quat, frame: Mat3) -> Vec3 {
    let basis = Quat::from_mat3(&frame);
    let local = basis.inverse() * q * basis;
    let (y, x, z) = local.to_euler(EulerRot::YXZ);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

/// Clamp each local Euler angle of `q` into `limits` and recompose.
pub fn clamp_rotation(q: Quat, frame: Mat3, limits: &AxisLimits) -> Quat {
    let angles = local_euler_degrees(q, frame).clamp(limits.min, limits.max);
    let basis = Quat::from_mat3(&frame);
    let local = Quat::from_euler(
        EulerRot::YXZ,
        angles.y.to_radians(),
        angles.x.to_radians(),
        angles.z.to_radians(),
    );
    (basis * local * basis.inverse()).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same_rotation(a: Quat, b: Quat) -> bool {
        a.dot(b).abs() > 1.0 - 1e-5
    }

    #[test]
    fn test_angle_degrees() {
        assert!((angle_degrees(Quat::from_rotation_y(30f32.to_radians())) - 30.0).abs() < 1e-3);
        assert_eq!(angle_degrees(Quat::IDENTITY), 0.0);
        // q and -q describe the same rotation
        let q = Quat::from_rotation_x(0.3);
        assert!((angle_degrees(-q) - angle_degrees(q)).abs() < 1e-4);
    }

    #[test]
    fn test_swing_twist_recomposes() {
        let q = Quat::from_rotation_y(0.4) * Quat::from_rotation_x(0.7);
        let (twist, swing) = swing_twist(q, Vec3::X);
        assert!(same_rotation(swing * twist, q));
        // twist axis is X
        assert!(twist.y.abs() < 1e-6 && twist.z.abs() < 1e-6);
        // swing keeps X perpendicular motion only
        assert!((swing * Vec3::X).abs_diff_eq(q * Vec3::X, 1e-5));
        assert!((twist_degrees(q, Vec3::X) - 0.7f32.to_degrees()).abs() < 1e-2);
    }

    #[test]
    fn test_pure_twist_and_pure_swing() {
        let twist_only = Quat::from_rotation_x(0.5);
        assert!((twist_degrees(twist_only, Vec3::X) - 0.5f32.to_degrees()).abs() < 1e-2);
        assert!((twist_degrees(twist_only, Vec3::NEG_X) - 0.5f32.to_degrees()).abs() < 1e-2);

        let swing_only = Quat::from_rotation_z(0.5);
        assert!(twist_degrees(swing_only, Vec3::X) < 1e-2);
    }

    #[test]
    fn test_local_frame_is_orthonormal() {
        let frame = local_frame(Vec3::new(1.0, -1.0, 0.0), Vec3::Z);
        assert!((frame.determinant() - 1.0).abs() < 1e-5);
        assert!(frame.x_axis.abs_diff_eq(Vec3::new(1.0, -1.0, 0.0).normalize(), 1e-6));
        assert!(frame.z_axis.abs_diff_eq(Vec3::Z, 1e-6));
        // reference parallel to the bone
        let frame = local_frame(Vec3::Z, Vec3::Z);
        assert!((frame.determinant() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_clamp_within_limits_is_unchanged() {
        let frame = local_frame(Vec3::X, Vec3::Z);
        let q = Quat::from_rotation_y(0.2) * Quat::from_rotation_x(0.3);
        let limits = AxisLimits {
            min: Vec3::splat(-90.0),
            max: Vec3::splat(90.0),
        };
        assert!(same_rotation(clamp_rotation(q, frame, &limits), q));
    }

    #[test]
    fn test_clamp_limits_each_axis() {
        let frame = local_frame(Vec3::X, Vec3::Z);
        let q = Quat::from_rotation_x(80f32.to_radians());
        let limits = AxisLimits {
            min: Vec3::new(-10.0, 0.0, 0.0),
            max: Vec3::new(30.0, 0.0, 0.0),
        };
        let clamped = clamp_rotation(q, frame, &limits);
        assert!(same_rotation(clamped, Quat::from_rotation_x(30f32.to_radians())));

        // axis locked at zero
        let q = Quat::from_rotation_z(0.5);
        assert!(same_rotation(clamp_rotation(q, frame, &limits), Quat::IDENTITY));
    }

    #[test]
    fn test_clamp_in_rotated_frame() {
        // bone pointing down -Y: its local X is world -Y
        let frame = local_frame(Vec3::NEG_Y, Vec3::Z);
        let q = Quat::from_axis_angle(Vec3::NEG_Y, 60f32.to_radians());
        let limits = AxisLimits {
            min: Vec3::new(-20.0, -180.0, -180.0),
            max: Vec3::new(20.0, 180.0, 180.0),
        };
        let clamped = clamp_rotation(q, frame, &limits);
        assert!(same_rotation(
            clamped,
            Quat::from_axis_angle(Vec3::NEG_Y, 20f32.to_radians())
        ));
    }
}
