//! Simulated camera-operator imperfections layered onto the ideal pose:
//! reaction-delay lag, a low-amplitude breathing bob, and a gentle pull of
//! the aim angles back toward the operator's preferred framing.

use crate::math::{smoothing_t, wrap_angle};
use crate::state::Pose;
use data_runtime::configs::follow_camera::OperatorCfg;
use glam::Vec3;

#[derive(Debug)]
pub struct OperatorBehavior {
    delayed_position: Option<Vec3>,
    clock: f32,
}

impl Default for OperatorBehavior {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorBehavior {
    #[must_use]
    pub fn new() -> Self {
        Self {
            delayed_position: None,
            clock: 0.0,
        }
    }

    /// Apply operator effects to `ideal`, advancing the internal clock.
    /// With `enabled` false or zero weight the pose passes through.
    pub fn apply(&mut self, cfg: &OperatorCfg, ideal: Pose, dt: f32) -> Pose {
        self.clock += dt.max(0.0);
        if !cfg.enabled || cfg.weight <= 0.0 {
            self.delayed_position = Some(ideal.position);
            return ideal;
        }
        let w = cfg.weight.clamp(0.0, 1.0);

        // Reaction delay: exponential pursuit of the ideal position.
        let rate = 1.0 / cfg.reaction_delay_s.max(1e-3);
        let lagged = match self.delayed_position {
            Some(prev) => prev.lerp(ideal.position, smoothing_t(rate, dt)),
            None => ideal.position,
        };
        self.delayed_position = Some(lagged);
        let mut position = ideal.position.lerp(lagged, w);

        // Breathing: a slow vertical sinusoid.
        let breath =
            (self.clock * cfg.breathing_hz * std::f32::consts::TAU).sin() * cfg.breathing_amplitude;
        position.z += breath * w;

        // Angle preference: nudge aim toward the preferred framing.
        let pull = (cfg.angle_preference_weight * w * dt).clamp(0.0, 1.0);
        let yaw = ideal.yaw + wrap_angle(cfg.preferred_yaw_deg.to_radians() - ideal.yaw) * pull;
        let pitch =
            ideal.pitch + wrap_angle(cfg.preferred_pitch_deg.to_radians() - ideal.pitch) * pull;

        Pose::new(position, yaw, pitch)
    }

    pub fn reset(&mut self) {
        self.delayed_position = None;
        self.clock = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> OperatorCfg {
        OperatorCfg {
            enabled: true,
            weight: 1.0,
            reaction_delay_s: 0.25,
            breathing_amplitude: 0.05,
            breathing_hz: 0.5,
            preferred_yaw_deg: 0.0,
            preferred_pitch_deg: -10.0,
            angle_preference_weight: 0.5,
        }
    }

    #[test]
    fn disabled_operator_passes_pose_through() {
        let mut op = OperatorBehavior::new();
        let ideal = Pose::new(Vec3::new(1.0, 2.0, 3.0), 0.3, -0.1);
        let out = op.apply(&OperatorCfg::default(), ideal, 0.016);
        assert_eq!(out, ideal);
    }

    #[test]
    fn reaction_delay_lags_behind_a_jump() {
        let mut op = OperatorBehavior::new();
        let c = cfg();
        let _ = op.apply(&c, Pose::new(Vec3::ZERO, 0.0, 0.0), 0.016);
        let out = op.apply(&c, Pose::new(Vec3::new(10.0, 0.0, 0.0), 0.0, 0.0), 0.016);
        assert!(out.position.x < 10.0);
        assert!(out.position.x > 0.0);
    }

    #[test]
    fn breathing_moves_height_both_ways() {
        let mut op = OperatorBehavior::new();
        let c = cfg();
        let ideal = Pose::new(Vec3::ZERO, 0.0, 0.0);
        let mut lo = f32::MAX;
        let mut hi = f32::MIN;
        for _ in 0..200 {
            let out = op.apply(&c, ideal, 0.02);
            lo = lo.min(out.position.z);
            hi = hi.max(out.position.z);
        }
        assert!(hi > 0.0 && lo < 0.0);
        assert!(hi <= c.breathing_amplitude + 1e-4);
    }

    #[test]
    fn aim_is_pulled_toward_preference() {
        let mut op = OperatorBehavior::new();
        let c = cfg();
        let ideal = Pose::new(Vec3::ZERO, 1.0, 0.5);
        let out = op.apply(&c, ideal, 0.1);
        assert!(out.yaw < 1.0);
        assert!(out.pitch < 0.5);
    }
}
