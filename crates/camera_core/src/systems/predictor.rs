//! Motion predictor: bounded sample history, smoothed velocity, linear
//! extrapolation with a variance-derived confidence, and corner detection.

use crate::history::History;
use crate::math::wrap_angle;
use data_runtime::configs::follow_target::PredictionCfg;
use glam::Vec3;

/// Samples the predictor keeps per frame.
#[derive(Debug, Clone, Copy)]
struct Sample {
    position: Vec3,
    timestamp: f64,
    velocity: Vec3,
}

/// Output of one prediction query.
#[derive(Debug, Clone, Copy)]
pub struct PredictionResult {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Horizontal travel direction; zero when the subject is still.
    pub forward: Vec3,
    /// 1 for steady motion, approaching 0 as velocity variance grows.
    pub confidence: f32,
    pub time_horizon: f32,
    /// Set when the recent travel direction curls beyond the corner
    /// threshold; the sign is the turn direction (+ left, - right).
    pub corner: Option<f32>,
}

/// Cumulative signed direction change that flags an upcoming turn.
const CORNER_THRESHOLD_RAD: f32 = 30.0 * std::f32::consts::PI / 180.0;
/// Direction samples inspected by the corner detector.
const CORNER_WINDOW: usize = 5;
/// Blend weight toward an authoritative future-position source.
const AUTHORITY_WEIGHT: f32 = 0.7;

#[derive(Debug)]
pub struct MotionPredictor {
    cfg: PredictionCfg,
    samples: History<Sample>,
    smoothed_velocity: Vec3,
}

impl MotionPredictor {
    #[must_use]
    pub fn new(cfg: PredictionCfg) -> Self {
        Self {
            samples: History::new(cfg.history_frames),
            smoothed_velocity: Vec3::ZERO,
            cfg,
        }
    }

    /// Record one observed subject position. Timestamps must be
    /// non-decreasing; a duplicate timestamp reuses the last velocity.
    pub fn push_sample(&mut self, position: Vec3, timestamp: f64) {
        let velocity = match self.samples.latest() {
            Some(prev) => {
                #[allow(clippy::cast_possible_truncation)]
                let dt = (timestamp - prev.timestamp) as f32;
                if dt > 1e-6 {
                    (position - prev.position) / dt
                } else {
                    prev.velocity
                }
            }
            None => Vec3::ZERO,
        };
        let a = self.cfg.velocity_smoothing.clamp(0.0, 1.0);
        self.smoothed_velocity = self.smoothed_velocity.lerp(velocity, a);
        self.samples.push(Sample {
            position,
            timestamp,
            velocity,
        });
    }

    #[must_use]
    pub fn smoothed_velocity(&self) -> Vec3 {
        self.smoothed_velocity
    }

    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.smoothed_velocity = Vec3::ZERO;
    }

    /// Extrapolate the subject `time_ahead` seconds into the future.
    /// With no samples yet the result is a zero-confidence origin guess.
    #[must_use]
    pub fn predict(&self, time_ahead: f32) -> PredictionResult {
        let Some(last) = self.samples.latest() else {
            return PredictionResult {
                position: Vec3::ZERO,
                velocity: Vec3::ZERO,
                forward: Vec3::ZERO,
                confidence: 0.0,
                time_horizon: time_ahead,
                corner: None,
            };
        };
        let velocity = self.smoothed_velocity;
        let position = last.position + velocity * time_ahead;
        let forward = {
            let h = Vec3::new(velocity.x, velocity.y, 0.0);
            if h.length_squared() > 1e-8 {
                h.normalize()
            } else {
                Vec3::ZERO
            }
        };
        PredictionResult {
            position,
            velocity,
            forward,
            confidence: self.confidence(),
            time_horizon: time_ahead,
            corner: self.detect_corner(),
        }
    }

    /// Blend the velocity estimate with an authoritative future position
    /// (e.g. a baked animation track), weighted toward the authority.
    #[must_use]
    pub fn predict_with_authority(&self, time_ahead: f32, authority: Vec3) -> PredictionResult {
        let mut r = self.predict(time_ahead);
        r.position = r.position.lerp(authority, AUTHORITY_WEIGHT);
        // The authority pins position; keep at least moderate confidence.
        r.confidence = r.confidence.max(AUTHORITY_WEIGHT);
        r
    }

    /// Confidence from recent velocity variance: 1 when motion is steady,
    /// decaying toward 0 as the velocity samples scatter.
    fn confidence(&self) -> f32 {
        let n = self.samples.len();
        if n < 3 {
            return 0.5;
        }
        let take = n.min(10);
        #[allow(clippy::cast_precision_loss)]
        let inv = 1.0 / take as f32;
        let mean: Vec3 = self
            .samples
            .recent(take)
            .fold(Vec3::ZERO, |acc, s| acc + s.velocity)
            * inv;
        let variance: f32 = self
            .samples
            .recent(take)
            .map(|s| (s.velocity - mean).length_squared())
            .sum::<f32>()
            * inv;
        1.0 / (1.0 + variance)
    }

    /// Inspect the last few travel directions; a cumulative signed turn past
    /// the threshold flags a corner and its direction.
    fn detect_corner(&self) -> Option<f32> {
        let dirs: Vec<f32> = self
            .samples
            .recent(CORNER_WINDOW)
            .filter(|s| s.velocity.truncate().length_squared() > 1e-6)
            .map(|s| s.velocity.y.atan2(s.velocity.x))
            .collect();
        if dirs.len() < 2 {
            return None;
        }
        let total: f32 = dirs.windows(2).map(|w| wrap_angle(w[1] - w[0])).sum();
        if total.abs() > CORNER_THRESHOLD_RAD {
            Some(total.signum())
        } else {
            None
        }
    }
}
