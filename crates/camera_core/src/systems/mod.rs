//! Per-frame camera systems, composed by the rig in fixed order.

pub mod avoidance;
pub mod modes;
pub mod operator;
pub mod oscillation;
pub mod predictor;
pub mod transition;
