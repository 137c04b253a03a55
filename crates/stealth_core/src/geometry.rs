//! Heading and angle helpers

use glam::{Quat, Vec3};

/// World up axis
pub const UP: Vec3 = Vec3::Y;

/// Unsigned angle between two vectors in degrees, in `[0, 180]`
///
/// Returns 0 when either vector has zero length.
pub fn angle_between_degrees(a: Vec3, b: Vec3) -> f32 {
    let mag_a = a.length();
    let mag_b = b.length();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    let cos_angle = (a.dot(b) / (mag_a * mag_b)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

/// Unit heading for a yaw angle in degrees (0 faces +Z, 90 faces +X)
#[inline]
pub fn heading_from_yaw(yaw_degrees: f32) -> Vec3 {
    Quat::from_rotation_y(yaw_degrees.to_radians()) * Vec3::Z
}

/// Rotate a heading around the up axis by `degrees`
#[inline]
pub fn rotate_about_up(forward: Vec3, degrees: f32) -> Vec3 {
    Quat::from_axis_angle(UP, degrees.to_radians()) * forward
}

/// Linear blend between two headings with `t` clamped to `[0, 1]`
///
/// The result is renormalized; if the blend collapses to zero (opposite
/// headings at `t = 0.5`) the starting heading is kept.
pub fn blend_heading(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    let blended = from.lerp(to, t.clamp(0.0, 1.0));
    let normalized = blended.normalize_or_zero();
    if normalized == Vec3::ZERO {
        from
    } else {
        normalized
    }
}

/// Drop the vertical component
#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
