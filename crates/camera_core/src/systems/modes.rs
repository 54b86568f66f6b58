//! Follow-mode solver: stateless ideal-pose formulas, one per mode.
//!
//! `solve` is a pure function of the subject transform and the shot config;
//! smoothing, avoidance, and transitions are layered on by the rig. Unknown
//! mode tags never reach this point: the enum is closed and the serde layer
//! defaults to over-shoulder on load.

use crate::math::look_at_angles;
use crate::state::Pose;
use data_runtime::configs::follow_camera::FollowCameraConfig;
use data_runtime::FollowMode;
use glam::Vec3;

const UP: Vec3 = Vec3::Z;

/// Horizontal unit direction from `v`, falling back to +X when degenerate.
fn horizontal_dir(v: Vec3) -> Vec3 {
    let h = Vec3::new(v.x, v.y, 0.0);
    if h.length_squared() > 1e-12 {
        h.normalize()
    } else {
        Vec3::X
    }
}

/// Right-hand lateral direction for a horizontal forward.
fn right_of(forward: Vec3) -> Vec3 {
    horizontal_dir(forward).cross(UP)
}

/// Chase distance: ideal plus a speed-scaled bonus, capped.
fn chase_distance(cfg: &FollowCameraConfig, speed: f32) -> f32 {
    cfg.ideal_distance + (speed.max(0.0) * cfg.speed_distance_factor).min(cfg.max_speed_distance)
}

fn behind_target(target: Vec3, along: Vec3, distance: f32, height: f32) -> Vec3 {
    target - horizontal_dir(along) * distance + UP * height
}

fn aimed_at_subject(position: Vec3, target: Vec3, look_height: f32) -> Pose {
    let (yaw, pitch) = look_at_angles(position, target + UP * look_height);
    Pose::new(position, yaw, pitch)
}

/// Compute the ideal pose for `mode` from the subject transform.
///
/// `current_yaw` feeds the modes that advance or hold an external yaw
/// (orbit_follow, free_roam, aerial, vertical side_scroller); `dt` only
/// matters for orbit_follow's angular advance.
#[must_use]
pub fn solve(
    mode: FollowMode,
    target_pos: Vec3,
    target_forward: Vec3,
    target_velocity: Vec3,
    cfg: &FollowCameraConfig,
    current_yaw: f32,
    dt: f32,
) -> Pose {
    let look_h = cfg.framing.look_height;
    match mode {
        FollowMode::SideScroller => solve_side_scroller(target_pos, cfg, current_yaw),
        FollowMode::OverShoulder => {
            let pos = behind_target(target_pos, target_forward, cfg.ideal_distance, cfg.ideal_height)
                + right_of(target_forward) * cfg.framing.shoulder_offset;
            aimed_at_subject(pos, target_pos, look_h)
        }
        FollowMode::Chase | FollowMode::ChaseSide => {
            let speed = target_velocity.truncate().length();
            let along = if speed > 1e-4 {
                target_velocity
            } else {
                target_forward
            };
            let mut pos = behind_target(target_pos, along, chase_distance(cfg, speed), cfg.ideal_height);
            if mode == FollowMode::ChaseSide {
                pos += right_of(along) * cfg.framing.shoulder_offset;
            }
            aimed_at_subject(pos, target_pos, look_h)
        }
        FollowMode::OrbitFollow => {
            let yaw = current_yaw + cfg.orbit_speed * dt;
            let pos = orbit_position(target_pos, yaw, cfg.ideal_distance, cfg.ideal_height);
            aimed_at_subject(pos, target_pos, look_h)
        }
        FollowMode::Lead => {
            let pos = target_pos
                + horizontal_dir(target_forward) * cfg.lead_distance
                + UP * cfg.ideal_height;
            aimed_at_subject(pos, target_pos, look_h)
        }
        FollowMode::Aerial => {
            let altitude = cfg.ideal_distance.clamp(cfg.min_height, cfg.max_height);
            let pos = target_pos + UP * altitude;
            // Straight down; yaw carried over so the framing does not spin.
            Pose::new(pos, current_yaw, -std::f32::consts::FRAC_PI_2)
        }
        FollowMode::FreeRoam => {
            let pos = orbit_position(target_pos, current_yaw, cfg.ideal_distance, cfg.ideal_height);
            aimed_at_subject(pos, target_pos, look_h)
        }
    }
}

/// Camera position on a circle around the subject such that a camera there
/// looking at the subject has the given yaw.
#[must_use]
pub fn orbit_position(target: Vec3, yaw: f32, distance: f32, height: f32) -> Vec3 {
    let (sy, cy) = yaw.sin_cos();
    target - Vec3::new(cy, sy, 0.0) * distance.max(0.1) + UP * height
}

fn solve_side_scroller(target_pos: Vec3, cfg: &FollowCameraConfig, current_yaw: f32) -> Pose {
    let f = cfg.framing;
    match f.fixed_axis {
        // Vertical pin: hover at the fixed altitude, look straight down.
        2 => Pose::new(
            Vec3::new(target_pos.x, target_pos.y, f.fixed_axis_value),
            current_yaw,
            -std::f32::consts::FRAC_PI_2,
        ),
        1 => {
            let pos = Vec3::new(target_pos.x, f.fixed_axis_value, target_pos.z + cfg.ideal_height);
            aimed_at_subject(pos, target_pos, f.look_height)
        }
        _ => {
            let pos = Vec3::new(f.fixed_axis_value, target_pos.y, target_pos.z + cfg.ideal_height);
            aimed_at_subject(pos, target_pos, f.look_height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> FollowCameraConfig {
        FollowCameraConfig::default()
    }

    #[test]
    fn chase_distance_is_capped() {
        let c = FollowCameraConfig {
            ideal_distance: 4.0,
            speed_distance_factor: 0.5,
            max_speed_distance: 3.0,
            ..cfg()
        };
        // 4 + min(3, 10*0.5) = 7, not 9
        assert!((chase_distance(&c, 10.0) - 7.0).abs() < 1e-6);
        assert!((chase_distance(&c, 0.0) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn chase_distance_within_bounds_for_any_speed() {
        let c = cfg();
        for speed in [0.0, 0.5, 2.0, 7.0, 100.0, 1e6] {
            let d = chase_distance(&c, speed);
            assert!(d >= c.ideal_distance);
            assert!(d <= c.ideal_distance + c.max_speed_distance);
        }
    }

    #[test]
    fn lead_sits_ahead_of_subject() {
        let p = solve(
            FollowMode::Lead,
            Vec3::ZERO,
            Vec3::Y,
            Vec3::ZERO,
            &cfg(),
            0.0,
            0.016,
        );
        assert!(p.position.y > 0.0);
        // Looking back toward the subject
        assert!(p.look_dir().y < 0.0);
    }

    #[test]
    fn aerial_looks_straight_down() {
        let p = solve(
            FollowMode::Aerial,
            Vec3::new(2.0, 3.0, 0.0),
            Vec3::X,
            Vec3::ZERO,
            &cfg(),
            0.7,
            0.016,
        );
        assert!((p.pitch + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((p.position.truncate() - glam::Vec2::new(2.0, 3.0)).length() < 1e-6);
        assert!((p.yaw - 0.7).abs() < 1e-6);
    }

    #[test]
    fn orbit_follow_advances_yaw_at_configured_rate() {
        let c = FollowCameraConfig {
            orbit_speed: 1.0,
            ..cfg()
        };
        let p = solve(
            FollowMode::OrbitFollow,
            Vec3::ZERO,
            Vec3::X,
            Vec3::ZERO,
            &c,
            0.0,
            0.5,
        );
        // Camera yaw looks at the subject with the advanced angle
        assert!((crate::math::wrap_angle(p.yaw - 0.5)).abs() < 1e-3);
    }

    #[test]
    fn side_scroller_vertical_pin_looks_down() {
        let c = FollowCameraConfig {
            framing: data_runtime::configs::follow_camera::FramingCfg {
                fixed_axis: 2,
                fixed_axis_value: 12.0,
                ..Default::default()
            },
            ..cfg()
        };
        let p = solve(
            FollowMode::SideScroller,
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::X,
            Vec3::ZERO,
            &c,
            0.0,
            0.016,
        );
        assert!((p.position.z - 12.0).abs() < 1e-6);
        assert!((p.pitch + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
