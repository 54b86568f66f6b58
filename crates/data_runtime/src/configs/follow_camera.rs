//! Follow-camera configuration loaded from data/config/follow_camera.toml.
//!
//! Immutable per shot. Serde round-trips are lossless; `validate()` enforces
//! the distance/height ordering invariants before a rig accepts the record.

use crate::tags::{FollowMode, ObstacleResponse, TransitionKind};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("distance bounds violated: min {min} <= ideal {ideal} <= max {max} required")]
    DistanceBounds { min: f32, ideal: f32, max: f32 },
    #[error("height bounds violated: min {min} <= ideal {ideal} <= max {max} required")]
    HeightBounds { min: f32, ideal: f32, max: f32 },
    #[error("{field} must be non-negative, got {value}")]
    NegativeField { field: &'static str, value: f32 },
}

/// Collision/obstacle handling settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionCfg {
    pub enabled: bool,
    /// Radius used to treat two hits on the same object as the same obstacle.
    pub dedup_radius: f32,
    pub default_response: ObstacleResponse,
}

impl Default for CollisionCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            dedup_radius: 0.25,
            default_response: ObstacleResponse::PushForward,
        }
    }
}

/// Mode/pose transition settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionCfg {
    pub kind: TransitionKind,
    pub duration_s: f32,
}

impl Default for TransitionCfg {
    fn default() -> Self {
        Self {
            kind: TransitionKind::Blend,
            duration_s: 0.75,
        }
    }
}

/// Framing offsets applied on top of the mode formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FramingCfg {
    /// Lateral shoulder offset (over_shoulder/chase_side), meters.
    pub shoulder_offset: f32,
    /// Height of the look-at point above the subject's origin.
    pub look_height: f32,
    /// World axis pinned by side_scroller: 0 = x, 1 = y (vertical), 2 = z.
    pub fixed_axis: u8,
    pub fixed_axis_value: f32,
}

impl Default for FramingCfg {
    fn default() -> Self {
        Self {
            shoulder_offset: 0.6,
            look_height: 1.5,
            fixed_axis: 0,
            fixed_axis_value: 10.0,
        }
    }
}

/// Simulated human-operator imperfections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatorCfg {
    pub enabled: bool,
    /// 0 disables all operator effects, 1 applies them fully.
    pub weight: f32,
    /// Reaction delay time constant, seconds.
    pub reaction_delay_s: f32,
    pub breathing_amplitude: f32,
    pub breathing_hz: f32,
    pub preferred_yaw_deg: f32,
    pub preferred_pitch_deg: f32,
    pub angle_preference_weight: f32,
}

impl Default for OperatorCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            weight: 1.0,
            reaction_delay_s: 0.25,
            breathing_amplitude: 0.03,
            breathing_hz: 0.3,
            preferred_yaw_deg: 0.0,
            preferred_pitch_deg: -10.0,
            angle_preference_weight: 0.1,
        }
    }
}

/// Anti-oscillation filter settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityCfg {
    /// Dead zone: target movement below this is ignored, meters.
    pub movement_threshold: f32,
    /// Sliding window over which direction reversals are counted, seconds.
    pub window_s: f32,
    /// Reversals per second that flips the oscillation flag.
    pub max_reversals_per_s: f32,
    /// Per-reversal damping escalation once oscillating.
    pub damping_step: f32,
}

impl Default for StabilityCfg {
    fn default() -> Self {
        Self {
            movement_threshold: 0.05,
            window_s: 1.0,
            max_reversals_per_s: 3.0,
            damping_step: 0.15,
        }
    }
}

/// Immutable-per-shot follow camera configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowCameraConfig {
    pub mode: FollowMode,

    pub min_distance: f32,
    pub ideal_distance: f32,
    pub max_distance: f32,

    pub min_height: f32,
    pub ideal_height: f32,
    pub max_height: f32,

    /// Exponential position smoothing factor per second.
    pub position_smoothing: f32,
    pub rotation_smoothing: f32,

    /// Chase: extra distance per unit of subject speed.
    pub speed_distance_factor: f32,
    /// Chase: cap on the speed-derived distance bonus.
    pub max_speed_distance: f32,

    /// orbit_follow angular rate, radians per second.
    pub orbit_speed: f32,
    /// lead mode: distance ahead of the subject along its forward.
    pub lead_distance: f32,

    pub collision: CollisionCfg,
    pub transition: TransitionCfg,
    pub framing: FramingCfg,
    pub operator: OperatorCfg,
    pub stability: StabilityCfg,
}

impl Default for FollowCameraConfig {
    fn default() -> Self {
        Self {
            mode: FollowMode::OverShoulder,
            min_distance: 1.0,
            ideal_distance: 4.0,
            max_distance: 12.0,
            min_height: 0.5,
            ideal_height: 1.8,
            max_height: 8.0,
            position_smoothing: 5.0,
            rotation_smoothing: 6.0,
            speed_distance_factor: 0.5,
            max_speed_distance: 3.0,
            orbit_speed: 0.5,
            lead_distance: 5.0,
            collision: CollisionCfg::default(),
            transition: TransitionCfg::default(),
            framing: FramingCfg::default(),
            operator: OperatorCfg::default(),
            stability: StabilityCfg::default(),
        }
    }
}

impl FollowCameraConfig {
    /// Check the ordering invariants on distance and height bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_distance <= self.ideal_distance && self.ideal_distance <= self.max_distance)
        {
            return Err(ConfigError::DistanceBounds {
                min: self.min_distance,
                ideal: self.ideal_distance,
                max: self.max_distance,
            });
        }
        if !(self.min_height <= self.ideal_height && self.ideal_height <= self.max_height) {
            return Err(ConfigError::HeightBounds {
                min: self.min_height,
                ideal: self.ideal_height,
                max: self.max_height,
            });
        }
        for (field, value) in [
            ("speed_distance_factor", self.speed_distance_factor),
            ("max_speed_distance", self.max_speed_distance),
            ("lead_distance", self.lead_distance),
            ("transition.duration_s", self.transition.duration_s),
        ] {
            if value < 0.0 {
                return Err(ConfigError::NegativeField { field, value });
            }
        }
        Ok(())
    }
}

fn data_root() -> PathBuf {
    let here = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let ws = here.join("../../data");
    if ws.is_dir() { ws } else { here.join("data") }
}

/// Load the shot config from `data/config/follow_camera.toml`, falling back
/// to defaults when the file is absent. Env overrides for quick tuning.
pub fn load_default() -> Result<FollowCameraConfig> {
    let path = data_root().join("config/follow_camera.toml");
    let mut cfg = if path.is_file() {
        let txt =
            std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        toml::from_str::<FollowCameraConfig>(&txt).context("parse follow_camera TOML")?
    } else {
        FollowCameraConfig::default()
    };
    if let Some(v) = std::env::var("CAM_IDEAL_DISTANCE")
        .ok()
        .and_then(|s| s.parse().ok())
    {
        cfg.ideal_distance = v;
    }
    if let Some(v) = std::env::var("CAM_IDEAL_HEIGHT")
        .ok()
        .and_then(|s| s.parse().ok())
    {
        cfg.ideal_height = v;
    }
    if let Ok(s) = std::env::var("CAM_MODE") {
        cfg.mode = serde_json::from_value(serde_json::Value::String(s))
            .context("parse CAM_MODE override")?;
    }
    cfg.validate().map_err(anyhow::Error::from)?;
    Ok(cfg)
}
