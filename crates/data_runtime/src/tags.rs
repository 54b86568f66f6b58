//! Closed enumerations shared across the camera core.
//!
//! All three are serde-tagged with snake_case names; an unknown tag on load
//! is a hard parse error (the solver itself is total over the closed sets).

use serde::{Deserialize, Serialize};

/// Follow mode selecting the ideal-pose formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FollowMode {
    SideScroller,
    /// Documented default: behind + above with a lateral shoulder offset.
    #[default]
    OverShoulder,
    Chase,
    ChaseSide,
    OrbitFollow,
    Lead,
    Aerial,
    FreeRoam,
}

/// Response applied when a solid obstruction blocks line of sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleResponse {
    #[default]
    PushForward,
    OrbitAway,
    RaiseUp,
    BackAway,
    ZoomThrough,
}

/// Blend strategy used when switching between poses or modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Hard cut: holds the start pose until progress reaches 1, then snaps.
    Cut,
    #[default]
    Blend,
    Orbit,
    Dolly,
}
