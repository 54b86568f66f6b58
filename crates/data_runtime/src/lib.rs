//! data_runtime: config schemas and loaders for the follow-camera core.
//!
//! Plain serde records with stable field names so shot configurations
//! round-trip losslessly through JSON/TOML. Camera and presolve crates
//! depend on this for a stable data API.

#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::struct_excessive_bools
)]

pub mod configs {
    pub mod follow_camera;
    pub mod follow_target;
}
pub mod loader;
pub mod oneshot;
pub mod tags;

pub use configs::follow_camera::FollowCameraConfig;
pub use configs::follow_target::FollowTarget;
pub use oneshot::OneShotConfig;
pub use tags::{FollowMode, ObstacleResponse, TransitionKind};
