//! Camera rig: owns per-frame state and drives the systems in order.
//!
//! Per update: oscillation filter / motion predictor -> mode solver ->
//! collision avoidance -> operator behavior -> transition blend or
//! exponential smoothing, writing one `CameraState`.

use crate::history::History;
use crate::math::{lerp_angle, smoothing_t};
use crate::state::{CameraState, Pose};
use crate::systems::avoidance::{AvoidanceOutcome, CollisionAvoidanceResolver, ObstacleInfo};
use crate::systems::modes;
use crate::systems::operator::OperatorBehavior;
use crate::systems::oscillation::OscillationPreventer;
use crate::systems::predictor::{MotionPredictor, PredictionResult};
use crate::systems::transition::TransitionStateMachine;
use data_runtime::configs::follow_camera::ConfigError;
use data_runtime::{FollowCameraConfig, FollowMode, FollowTarget, TransitionKind};
use glam::Vec3;

/// Host-supplied obstruction query (ray/sphere cast against the scene).
pub trait ObstacleQuery {
    fn cast(&self, from: Vec3, to: Vec3) -> Vec<ObstacleInfo>;
}

/// Diagnostics handed to the debug sink each frame. Observational only;
/// nothing feeds back into the solver.
#[derive(Debug, Clone, Copy)]
pub struct RigDiagnostics {
    pub outcome: AvoidanceOutcome,
    pub prediction: PredictionResult,
    pub stability: f32,
    pub oscillating: bool,
}

pub trait DebugSink {
    fn record(&mut self, state: &CameraState, diag: &RigDiagnostics);
}

/// Default sink: trace-level log lines, nothing else.
#[derive(Debug, Default)]
pub struct TracingDebugSink;

impl DebugSink for TracingDebugSink {
    fn record(&mut self, state: &CameraState, diag: &RigDiagnostics) {
        tracing::trace!(
            pos = ?state.position,
            yaw = state.yaw,
            pitch = state.pitch,
            stability = diag.stability,
            confidence = diag.prediction.confidence,
            "camera frame"
        );
    }
}

/// Subject transform for one frame. Velocity may be omitted, in which case
/// the predictor's smoothed estimate is used.
#[derive(Debug, Clone, Copy)]
pub struct SubjectFrame {
    pub position: Vec3,
    pub forward: Vec3,
    pub velocity: Option<Vec3>,
}

/// Debug path history length, frames.
const PATH_HISTORY_FRAMES: usize = 240;

pub struct CameraRig {
    cfg: FollowCameraConfig,
    target: FollowTarget,
    mode: FollowMode,
    state: CameraState,
    predictor: MotionPredictor,
    oscillation: OscillationPreventer,
    operator: OperatorBehavior,
    avoidance: CollisionAvoidanceResolver,
    transitions: TransitionStateMachine,
    path_history: History<Vec3>,
    debug_sink: Option<Box<dyn DebugSink>>,
    last_subject: Vec3,
    last_forward: Vec3,
    clock: f64,
    initialized: bool,
}

impl CameraRig {
    /// Build a rig for a validated shot config.
    pub fn new(cfg: FollowCameraConfig, target: FollowTarget) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            mode: cfg.mode,
            predictor: MotionPredictor::new(target.prediction),
            oscillation: OscillationPreventer::new(cfg.stability),
            operator: OperatorBehavior::new(),
            avoidance: CollisionAvoidanceResolver::new(),
            transitions: TransitionStateMachine::new(),
            path_history: History::new(PATH_HISTORY_FRAMES),
            debug_sink: None,
            state: CameraState::default(),
            last_subject: Vec3::ZERO,
            last_forward: Vec3::X,
            clock: 0.0,
            initialized: false,
            cfg,
            target,
        })
    }

    pub fn set_debug_sink(&mut self, sink: Box<dyn DebugSink>) {
        self.debug_sink = Some(sink);
    }

    #[must_use]
    pub fn mode(&self) -> FollowMode {
        self.mode
    }

    #[must_use]
    pub fn state(&self) -> &CameraState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &FollowCameraConfig {
        &self.cfg
    }

    #[must_use]
    pub fn predictor(&self) -> &MotionPredictor {
        &self.predictor
    }

    /// Recent camera positions, oldest first (debug overlay feed).
    #[must_use]
    pub fn path_history(&self) -> Vec<Vec3> {
        self.path_history.iter().copied().collect()
    }

    /// Switch follow mode, blending with the given strategy (config default
    /// when `None`). Before the first update this is an instant switch.
    pub fn set_mode(&mut self, mode: FollowMode, kind: Option<TransitionKind>) {
        if mode == self.mode {
            return;
        }
        let previous = self.mode;
        self.mode = mode;
        if !self.initialized {
            return;
        }
        let kind = kind.unwrap_or(self.cfg.transition.kind);
        let ideal = modes::solve(
            mode,
            self.last_subject,
            self.last_forward,
            self.predictor.smoothed_velocity(),
            &self.cfg,
            self.state.yaw,
            0.0,
        );
        self.transitions.begin(
            self.state.pose(),
            previous,
            ideal,
            mode,
            kind,
            self.cfg.transition.duration_s,
        );
        tracing::info!(from = ?previous, to = ?mode, ?kind, "camera mode change");
    }

    /// Advance one frame. Obstacles are the host raycast's hits for this
    /// frame, in cast order.
    pub fn update(
        &mut self,
        frame: &SubjectFrame,
        obstacles: &[ObstacleInfo],
        dt: f32,
    ) -> &CameraState {
        self.clock += f64::from(dt.max(0.0));
        let subject = frame.position + Vec3::from(self.target.offset);
        self.predictor.push_sample(subject, self.clock);
        let velocity = frame
            .velocity
            .unwrap_or_else(|| self.predictor.smoothed_velocity());

        let filtered = self.oscillation.filter(subject, self.clock);
        self.last_subject = filtered;
        self.last_forward = frame.forward;

        let ideal = modes::solve(
            self.mode,
            filtered,
            frame.forward,
            velocity,
            &self.cfg,
            self.state.yaw,
            dt,
        );

        let deduped = self
            .avoidance
            .dedup(obstacles, self.cfg.collision.dedup_radius);
        let (corrected, outcome) =
            self.avoidance
                .resolve(ideal.position, filtered, &deduped, &self.cfg);
        let mut pose = if corrected == ideal.position {
            ideal
        } else {
            // Re-aim from the corrected spot; keep a straight-down pitch.
            if ideal.pitch <= -std::f32::consts::FRAC_PI_2 + 1e-3 {
                Pose::new(corrected, ideal.yaw, ideal.pitch)
            } else {
                Pose::looking_at(corrected, filtered + Vec3::Z * self.cfg.framing.look_height)
            }
        };

        pose = self.operator.apply(&self.cfg.operator, pose, dt);

        let final_pose = if self.transitions.is_transitioning() {
            self.transitions.retarget(pose);
            self.transitions.update(dt, filtered).unwrap_or(pose)
        } else if self.initialized {
            let cur = self.state.pose();
            let tp = smoothing_t(self.cfg.position_smoothing, dt);
            let tr = smoothing_t(self.cfg.rotation_smoothing, dt);
            Pose::new(
                cur.position.lerp(pose.position, tp),
                lerp_angle(cur.yaw, pose.yaw, tr),
                lerp_angle(cur.pitch, pose.pitch, tr),
            )
        } else {
            pose
        };

        self.state.apply_pose(final_pose, filtered, dt);
        self.state.obstacles = deduped;
        self.state.transitioning = self.transitions.is_transitioning();
        self.state.transition_progress = self.transitions.progress();
        self.path_history.push(final_pose.position);
        self.initialized = true;

        if let Some(sink) = self.debug_sink.as_mut() {
            let diag = RigDiagnostics {
                outcome,
                prediction: self.predictor.predict(self.target.prediction.look_ahead_s),
                stability: self.oscillation.stability_score(),
                oscillating: self.oscillation.is_oscillating(),
            };
            sink.record(&self.state, &diag);
        }
        &self.state
    }

    /// Convenience wrapper that raycasts subject -> last camera position
    /// through the host query before updating.
    pub fn update_with_query(
        &mut self,
        frame: &SubjectFrame,
        query: &dyn ObstacleQuery,
        dt: f32,
    ) -> &CameraState {
        let from = frame.position + Vec3::from(self.target.offset);
        let to = if self.initialized {
            self.state.position
        } else {
            from - frame.forward * self.cfg.ideal_distance + Vec3::Z * self.cfg.ideal_height
        };
        let hits = query.cast(from, to);
        self.update(frame, &hits, dt)
    }

    /// Drop accumulated history (teleports, shot restarts).
    pub fn reset(&mut self) {
        self.predictor.reset();
        self.oscillation.reset();
        self.operator.reset();
        self.transitions.cancel();
        self.path_history.clear();
        self.initialized = false;
    }
}

impl std::fmt::Debug for CameraRig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraRig")
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}
