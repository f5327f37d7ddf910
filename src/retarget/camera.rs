//! Pinhole camera model used to place the root.
//!
//! Matrices are column-major `DMat4` acting on column vectors (`M * v`),
//! so `P * V` applies the view transform first. The conventions match the
//! usual right-handed OpenGL setup: `look_at_rh` for the view and a clip
//! space with z in [-1, 1] for the projection.

use glam::{DMat4, DVec2, DVec3, DVec4, Vec2, Vec3};

use crate::keypoints::KeypointFrame;

/// Determinants below this are treated as singular
const SINGULAR_EPSILON: f64 = 1e-12;

/// Window-space rectangle `(x, y, width, height)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub origin: DVec2,
    pub size: DVec2,
}

impl Viewport {
    /// Square viewport at the origin
    pub fn square(side: f64) -> Self {
        Self {
            origin: DVec2::ZERO,
            size: DVec2::splat(side),
        }
    }
}

/// View matrix of a camera at the image center, `focal_px` in front of the
/// image plane, looking at `(center.x, center.y, depth)` with +Y up.
pub fn view_matrix(image_size: Vec2, focal_px: f32, center: Vec2, depth: f32) -> DMat4 {
    let eye = DVec3::new(
        image_size.x as f64 / 2.0,
        image_size.y as f64 / 2.0,
        focal_px as f64,
    );
    let target = DVec3::new(center.x as f64, center.y as f64, depth as f64);
    DMat4::look_at_rh(eye, target, DVec3::Y)
}

/// Perspective projection with vertical field of view `fov_y_deg`.
///
/// Degenerate parameters (equal planes, zero aspect or zero field of view)
/// leave the identity. `near` may be zero, which yields a singular matrix.
pub fn projection_matrix(fov_y_deg: f32, aspect: f32, near: f32, far: f32) -> DMat4 {
    let (near, far, aspect) = (near as f64, far as f64, aspect as f64);
    let half = (fov_y_deg as f64 / 2.0).to_radians();
    let sine = half.sin();
    if near == far || aspect == 0.0 || sine == 0.0 || !aspect.is_finite() {
        return DMat4::IDENTITY;
    }
    let f = half.cos() / sine;
    let depth = near - far;
    DMat4::from_cols(
        DVec4::new(f / aspect, 0.0, 0.0, 0.0),
        DVec4::new(0.0, f, 0.0, 0.0),
        DVec4::new(0.0, 0.0, (near + far) / depth, -1.0),
        DVec4::new(0.0, 0.0, 2.0 * near * far / depth, 0.0),
    )
}

/// Inverse of `m`, or identity when `m` is singular.
pub fn inverse_or_identity(m: DMat4) -> DMat4 {
    let det = m.determinant();
    if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
        DMat4::IDENTITY
    } else {
        m.inverse()
    }
}

/// Map a window-space point back through `projection * view`.
pub fn unproject(window: DVec3, view: DMat4, projection: DMat4, viewport: Viewport) -> DVec3 {
    let inverse = inverse_or_identity(projection * view);
    let ndc = DVec4::new(
        (window.x - viewport.origin.x) / viewport.size.x * 2.0 - 1.0,
        (window.y - viewport.origin.y) / viewport.size.y * 2.0 - 1.0,
        window.z * 2.0 - 1.0,
        1.0,
    );
    let mut obj = inverse * ndc;
    if obj.w.abs() < f64::EPSILON {
        obj.w = 1.0;
    }
    obj.truncate() / obj.w
}

/// Forward mapping, the counterpart of [`unproject`]
pub fn project(point: DVec3, view: DMat4, projection: DMat4, viewport: Viewport) -> DVec3 {
    let clip = projection * view * point.extend(1.0);
    let ndc = clip.truncate() / clip.w;
    DVec3::new(
        viewport.origin.x + (ndc.x + 1.0) / 2.0 * viewport.size.x,
        viewport.origin.y + (ndc.y + 1.0) / 2.0 * viewport.size.y,
        (ndc.z + 1.0) / 2.0,
    )
}

/// Root seed of one frame.
///
/// The projected pelvis midpoint, recentered horizontally on the image, is
/// unprojected against a square viewport of side `10 * center_scale`. X/Y
/// come from the unprojection; Z is `depth * center_scale`.
pub fn root_seed(frame: &KeypointFrame, center_scale: f32, near: f32, far: f32) -> Vec3 {
    let camera = &frame.camera;
    let view = view_matrix(frame.image_size, camera.focal_length_px, camera.center, camera.depth);
    let aspect = if frame.image_size.y != 0.0 {
        frame.image_size.x / frame.image_size.y
    } else {
        0.0
    };
    let projection = projection_matrix(camera.sensor_width, aspect, near, far);
    let viewport = Viewport::square(center_scale as f64 * 10.0);

    let window = DVec3::new(
        (camera.projected_pelvis.x - frame.image_size.x / 2.0) as f64,
        camera.projected_pelvis.y as f64,
        1.0,
    );
    let unprojected = unproject(window, view, projection, viewport);

    Vec3::new(
        unprojected.x as f32,
        unprojected.y as f32,
        camera.depth * center_scale,
    )
}
