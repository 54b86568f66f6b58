//! Follow-target record: which subject to track and how to predict it.

use serde::{Deserialize, Serialize};

/// Prediction tuning for the tracked subject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionCfg {
    /// Exponential smoothing factor for the velocity estimate, 0..=1.
    pub velocity_smoothing: f32,
    /// How far ahead `predict` looks by default, seconds.
    pub look_ahead_s: f32,
    /// Capacity of the position history ring buffer.
    pub history_frames: usize,
}

impl Default for PredictionCfg {
    fn default() -> Self {
        Self {
            velocity_smoothing: 0.3,
            look_ahead_s: 0.5,
            history_frames: 30,
        }
    }
}

/// Subject reference plus framing offset and prediction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowTarget {
    /// Scene object id of the tracked subject.
    pub subject_id: u64,
    /// Offset from the subject origin to the tracked point, local space.
    pub offset: [f32; 3],
    pub prediction: PredictionCfg,
}

impl Default for FollowTarget {
    fn default() -> Self {
        Self {
            subject_id: 0,
            offset: [0.0, 0.0, 0.0],
            prediction: PredictionCfg::default(),
        }
    }
}
