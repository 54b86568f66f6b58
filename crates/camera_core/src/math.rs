//! Shared angle and easing helpers used by every system.

use glam::Vec3;

/// Wrap an angle into (-PI, PI].
#[must_use]
pub fn wrap_angle(a: f32) -> f32 {
    let mut x = a;
    while x > std::f32::consts::PI {
        x -= std::f32::consts::TAU;
    }
    while x < -std::f32::consts::PI {
        x += std::f32::consts::TAU;
    }
    x
}

/// Interpolate between two angles along the shorter arc.
#[must_use]
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    wrap_angle(from + wrap_angle(to - from) * t)
}

/// Smoother-step curve (zero first and second derivative at both ends).
#[must_use]
pub fn smoother_step(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Asymmetric slow-fast-slow ease for dolly moves: a gentler start and a
/// longer settle than `smoother_step`.
#[must_use]
pub fn dolly_ease(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let a = t * t;
    let b = (1.0 - t) * (1.0 - t) * (1.0 - t);
    a / (a + b)
}

/// Unit look direction for a yaw (XY plane, from +X) and pitch (toward +Z).
#[must_use]
pub fn dir_from_yaw_pitch(yaw: f32, pitch: f32) -> Vec3 {
    let (sy, cy) = yaw.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    Vec3::new(cp * cy, cp * sy, sp)
}

/// Yaw and pitch of a direction vector; zero-length input yields (0, 0).
#[must_use]
pub fn yaw_pitch_from_dir(dir: Vec3) -> (f32, f32) {
    let horiz = dir.truncate().length();
    if horiz < 1e-8 && dir.z.abs() < 1e-8 {
        return (0.0, 0.0);
    }
    (dir.y.atan2(dir.x), dir.z.atan2(horiz))
}

/// Yaw/pitch aiming from `eye` at `at`.
#[must_use]
pub fn look_at_angles(eye: Vec3, at: Vec3) -> (f32, f32) {
    yaw_pitch_from_dir(at - eye)
}

/// Frame-rate independent exponential smoothing factor.
#[must_use]
pub fn smoothing_t(rate_per_s: f32, dt: f32) -> f32 {
    1.0 - (-rate_per_s * dt.max(0.0)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_small_angles() {
        assert!((wrap_angle(0.5) - 0.5).abs() < 1e-6);
        assert!((wrap_angle(std::f32::consts::TAU + 0.5) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn lerp_angle_takes_shorter_arc() {
        // 170deg -> -170deg should pass through 180, not 0
        let a = 170f32.to_radians();
        let b = -170f32.to_radians();
        let mid = lerp_angle(a, b, 0.5);
        assert!(mid.abs() > 3.0, "mid={mid}");
    }

    #[test]
    fn eases_hit_endpoints() {
        for f in [smoother_step, dolly_ease] {
            assert!(f(0.0).abs() < 1e-6);
            assert!((f(1.0) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn dir_round_trips_angles() {
        let (yaw, pitch) = (1.1f32, -0.4f32);
        let d = dir_from_yaw_pitch(yaw, pitch);
        let (y2, p2) = yaw_pitch_from_dir(d);
        assert!((yaw - y2).abs() < 1e-5);
        assert!((pitch - p2).abs() < 1e-5);
    }
}
