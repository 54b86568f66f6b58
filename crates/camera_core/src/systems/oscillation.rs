//! Anti-oscillation filter for the tracked target position.
//!
//! Small movements inside the dead zone are suppressed entirely. Direction
//! reversals are counted over a sliding time window; once the reversal rate
//! exceeds the configured limit the filter flags oscillation and applies an
//! escalating damping factor to subsequent output until motion settles.

use crate::history::History;
use data_runtime::configs::follow_camera::StabilityCfg;
use glam::Vec3;

#[derive(Debug)]
pub struct OscillationPreventer {
    cfg: StabilityCfg,
    last_output: Option<Vec3>,
    last_delta: Vec3,
    /// Timestamps of detected reversals inside the sliding window.
    reversals: History<f64>,
    damping: f32,
}

impl OscillationPreventer {
    #[must_use]
    pub fn new(cfg: StabilityCfg) -> Self {
        Self {
            cfg,
            last_output: None,
            last_delta: Vec3::ZERO,
            reversals: History::new(64),
            damping: 0.0,
        }
    }

    /// Filter a candidate target position at time `now` (seconds).
    pub fn filter(&mut self, candidate: Vec3, now: f64) -> Vec3 {
        let window = f64::from(self.cfg.window_s.max(1e-3));
        self.reversals.evict_while(|&t| now - t > window);

        let Some(prev) = self.last_output else {
            self.last_output = Some(candidate);
            return candidate;
        };

        let delta = candidate - prev;
        // Dead zone: hold the last filtered position for tiny movements.
        if delta.length() < self.cfg.movement_threshold {
            return prev;
        }

        // A reversal is a horizontal movement opposing the previous one.
        let flat = glam::Vec2::new(delta.x, delta.y);
        let prev_flat = glam::Vec2::new(self.last_delta.x, self.last_delta.y);
        if prev_flat.length_squared() > 1e-10 && flat.dot(prev_flat) < 0.0 {
            self.reversals.push(now);
        }
        self.last_delta = delta;

        self.damping = if self.is_oscillating() {
            #[allow(clippy::cast_precision_loss)]
            let over = self.reversals.len() as f32 - self.reversal_limit();
            (self.cfg.damping_step * (1.0 + over.max(0.0))).min(0.9)
        } else {
            0.0
        };

        let out = prev + delta * (1.0 - self.damping);
        self.last_output = Some(out);
        out
    }

    fn reversal_limit(&self) -> f32 {
        self.cfg.max_reversals_per_s * self.cfg.window_s
    }

    /// True once the reversal count within the window reaches the limit.
    #[must_use]
    pub fn is_oscillating(&self) -> bool {
        #[allow(clippy::cast_precision_loss)]
        let count = self.reversals.len() as f32;
        count >= self.reversal_limit()
    }

    /// Damping applied to output; 0 while not oscillating.
    #[must_use]
    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// 1 when perfectly stable, falling toward 0 as reversals accumulate.
    #[must_use]
    pub fn stability_score(&self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let count = self.reversals.len() as f32;
        (1.0 - count / self.reversal_limit().max(1e-6)).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.last_output = None;
        self.last_delta = Vec3::ZERO;
        self.reversals.clear();
        self.damping = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> StabilityCfg {
        StabilityCfg {
            movement_threshold: 0.05,
            window_s: 1.0,
            max_reversals_per_s: 3.0,
            damping_step: 0.15,
        }
    }

    #[test]
    fn dead_zone_holds_position() {
        let mut f = OscillationPreventer::new(cfg());
        let a = f.filter(Vec3::ZERO, 0.0);
        let b = f.filter(Vec3::new(0.02, 0.0, 0.0), 0.1);
        assert_eq!(a, b);
    }

    #[test]
    fn large_movement_passes_through_undamped() {
        let mut f = OscillationPreventer::new(cfg());
        let _ = f.filter(Vec3::ZERO, 0.0);
        let out = f.filter(Vec3::new(1.0, 0.0, 0.0), 0.1);
        assert!((out.x - 1.0).abs() < 1e-6);
        assert!((f.damping() - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rapid_reversals_flag_oscillation_and_damp() {
        let mut f = OscillationPreventer::new(cfg());
        let mut t = 0.0;
        let _ = f.filter(Vec3::ZERO, t);
        // Ping-pong 0 <-> 1m at 10 Hz: a reversal nearly every step
        for i in 1..=12 {
            t += 0.1;
            let x = if i % 2 == 0 { 0.0 } else { 1.0 };
            let _ = f.filter(Vec3::new(x, 0.0, 0.0), t);
        }
        assert!(f.is_oscillating());
        assert!(f.damping() > 0.0);
        assert!(f.stability_score() < 0.5);
    }

    #[test]
    fn settling_clears_the_flag() {
        let mut f = OscillationPreventer::new(cfg());
        let mut t = 0.0;
        let _ = f.filter(Vec3::ZERO, t);
        for i in 1..=12 {
            t += 0.1;
            let x = if i % 2 == 0 { 0.0 } else { 1.0 };
            let _ = f.filter(Vec3::new(x, 0.0, 0.0), t);
        }
        assert!(f.is_oscillating());
        // Hold still long enough for the window to drain
        for _ in 0..30 {
            t += 0.1;
            let _ = f.filter(Vec3::new(5.0, 5.0, 0.0), t);
        }
        assert!(!f.is_oscillating());
        assert!((f.damping() - 0.0).abs() < f32::EPSILON);
        assert!(f.stability_score() > 0.9);
    }
}
