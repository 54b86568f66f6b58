//! camera_core: per-frame follow-camera controller.
//!
//! A `CameraRig` owns the per-frame state and composes the systems:
//! mode solver -> oscillation filter/motion predictor -> collision
//! avoidance -> transition blending, producing one `CameraState` per call.
//! Everything here is synchronous and single-threaded; one rig owns its
//! history buffers exclusively.
//!
//! World convention is Z-up: yaw rotates in the XY plane, pitch tilts
//! toward +Z, and "height" means the Z offset above the subject.

#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::struct_excessive_bools,
    clippy::must_use_candidate
)]

pub mod history;
pub mod math;
pub mod rig;
pub mod state;
pub mod systems;
pub mod telemetry;

pub use rig::{CameraRig, DebugSink, ObstacleQuery};
pub use state::{CameraState, Pose};
pub use systems::avoidance::ObstacleInfo;
