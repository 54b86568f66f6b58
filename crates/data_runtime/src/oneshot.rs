//! One-shot configuration: a frame-indexed timeline of discrete mode and
//! framing changes used by the offline pre-solve pipeline.
//!
//! Lookup semantics: the latest event at or before the queried frame wins.
//! Numeric framing fields persist sparsely (a later event that leaves a
//! field unset inherits the previous value); angle offsets replace rather
//! than accumulate.

use crate::tags::{FollowMode, TransitionKind};
use serde::{Deserialize, Serialize};

/// Switch the active follow mode at a given frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeChange {
    pub frame: u32,
    pub mode: FollowMode,
    pub transition: TransitionKind,
    pub duration_s: f32,
}

/// Adjust framing parameters at a given frame. Unset fields inherit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FramingChange {
    pub frame: u32,
    pub distance: Option<f32>,
    pub height: Option<f32>,
    pub shoulder_offset: Option<f32>,
    pub yaw_offset_deg: Option<f32>,
    pub pitch_offset_deg: Option<f32>,
}

/// Framing parameters resolved for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolvedFraming {
    pub distance: Option<f32>,
    pub height: Option<f32>,
    pub shoulder_offset: Option<f32>,
    pub yaw_offset_deg: f32,
    pub pitch_offset_deg: f32,
}

/// Ordered timeline for one deterministic pre-solved shot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OneShotConfig {
    pub start_frame: u32,
    pub end_frame: u32,
    pub mode_changes: Vec<ModeChange>,
    pub framing_changes: Vec<FramingChange>,
}

impl OneShotConfig {
    /// Active mode change at `frame`: the latest event at or before it.
    /// `None` before the first event (caller falls back to the shot config).
    #[must_use]
    pub fn mode_at(&self, frame: u32) -> Option<&ModeChange> {
        self.mode_changes
            .iter()
            .filter(|c| c.frame <= frame)
            .max_by_key(|c| c.frame)
    }

    /// True iff a mode change lands exactly on `frame`.
    #[must_use]
    pub fn mode_change_on(&self, frame: u32) -> Option<&ModeChange> {
        self.mode_changes.iter().find(|c| c.frame == frame)
    }

    /// Resolve framing at `frame` by folding events in frame order.
    /// Numeric fields keep the last set value; angle offsets take the last
    /// set value as-is (no accumulation across events).
    #[must_use]
    pub fn framing_at(&self, frame: u32) -> ResolvedFraming {
        let mut events: Vec<&FramingChange> = self
            .framing_changes
            .iter()
            .filter(|c| c.frame <= frame)
            .collect();
        events.sort_by_key(|c| c.frame);
        let mut out = ResolvedFraming::default();
        for ev in events {
            if ev.distance.is_some() {
                out.distance = ev.distance;
            }
            if ev.height.is_some() {
                out.height = ev.height;
            }
            if ev.shoulder_offset.is_some() {
                out.shoulder_offset = ev.shoulder_offset;
            }
            if let Some(y) = ev.yaw_offset_deg {
                out.yaw_offset_deg = y;
            }
            if let Some(p) = ev.pitch_offset_deg {
                out.pitch_offset_deg = p;
            }
        }
        out
    }

    #[must_use]
    pub fn frame_count(&self) -> u32 {
        self.end_frame.saturating_sub(self.start_frame) + 1
    }
}
