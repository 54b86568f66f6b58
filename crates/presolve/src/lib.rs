//! presolve: deterministic offline camera-path baking.
//!
//! Five strictly sequential stages over a fixed frame range: scene analysis,
//! ideal path, avoidance, smoothing, baking. Frames are processed in order
//! because smoothing and transitions depend on their neighbors; there is no
//! parallel frame evaluation. A stage error aborts the run, is recorded on
//! the result, and the partial result computed so far is returned rather
//! than discarded. Cancellation is cooperative: the progress callback
//! returns `false` to stop the run.

#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::must_use_candidate
)]

use anyhow::{bail, Result};
use camera_core::math::smoother_step;
use camera_core::state::Pose;
use camera_core::systems::avoidance::CollisionAvoidanceResolver;
use camera_core::systems::{modes, transition::TransitionStateMachine};
use camera_core::ObstacleInfo;
use data_runtime::{FollowCameraConfig, FollowMode, FollowTarget, OneShotConfig};
use glam::{Quat, Vec3};
use nav_core::pathfind::{find_path, simplify_path, smooth_path};
use nav_core::NavMesh;

/// World transform sampling for a scene object at a given frame.
pub trait TransformSource {
    fn sample(&self, object_id: u64, frame: u32) -> Option<(Vec3, Quat)>;
}

/// Per-frame obstruction sampling between subject and camera.
pub trait ObstacleSampler {
    fn obstacles_at(&self, frame: u32, camera_pos: Vec3, subject_pos: Vec3) -> Vec<ObstacleInfo>;
}

/// One baked camera key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub frame: u32,
    pub position: Vec3,
    pub rotation: Quat,
}

/// Keyframe persistence collaborator (host timeline, file, etc.).
pub trait KeyframeSink {
    fn store(&mut self, keys: &[Keyframe]) -> Result<()>;
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SceneAnalysis,
    IdealPath,
    Avoidance,
    Smoothing,
    Baking,
}

impl Stage {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Stage::SceneAnalysis => "scene_analysis",
            Stage::IdealPath => "ideal_path",
            Stage::Avoidance => "avoidance",
            Stage::Smoothing => "smoothing",
            Stage::Baking => "baking",
        }
    }

    const ALL: [Stage; 5] = [
        Stage::SceneAnalysis,
        Stage::IdealPath,
        Stage::Avoidance,
        Stage::Smoothing,
        Stage::Baking,
    ];
}

/// Progress callback: stage and 0..=1 fraction; return `false` to cancel.
pub type ProgressFn<'a> = &'a mut dyn FnMut(Stage, f32) -> bool;

/// Accumulated output. Partial and retained even when a stage fails.
#[derive(Debug, Clone, Default)]
pub struct PreSolveResult {
    pub path: Vec<Vec3>,
    pub rotations: Vec<Quat>,
    /// Active follow mode per solved frame.
    pub modes: Vec<FollowMode>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub success: bool,
    pub cancelled: bool,
}

/// Moving-average window applied by the smoothing stage (odd, centered).
const DEFAULT_SMOOTHING_WINDOW: usize = 5;
/// Minimum positional jump (meters) for navmesh routing to kick in.
const ROUTE_MIN_JUMP: f32 = 3.0;

pub struct PreSolvePipeline {
    cfg: FollowCameraConfig,
    target: FollowTarget,
    shot: OneShotConfig,
    fps: f32,
    smoothing_window: usize,
    navmesh: Option<NavMesh>,
}

impl PreSolvePipeline {
    pub fn new(
        cfg: FollowCameraConfig,
        target: FollowTarget,
        shot: OneShotConfig,
    ) -> Result<Self> {
        cfg.validate().map_err(anyhow::Error::from)?;
        if shot.end_frame < shot.start_frame {
            bail!(
                "shot frame range inverted: {}..{}",
                shot.start_frame,
                shot.end_frame
            );
        }
        Ok(Self {
            cfg,
            target,
            shot,
            fps: 30.0,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            navmesh: None,
        })
    }

    #[must_use]
    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps.max(1.0);
        self
    }

    #[must_use]
    pub fn with_smoothing_window(mut self, window: usize) -> Self {
        self.smoothing_window = window.max(1) | 1; // force odd
        self
    }

    /// Enable geometry-aware routing of large mode-change jumps.
    #[must_use]
    pub fn with_navmesh(mut self, mesh: NavMesh) -> Self {
        self.navmesh = Some(mesh);
        self
    }

    /// Run all five stages. Never panics on stage failure; the error is
    /// recorded and the best-effort partial result returned.
    pub fn run(
        &self,
        scene: &dyn TransformSource,
        obstacles: &dyn ObstacleSampler,
        sink: &mut dyn KeyframeSink,
        progress: ProgressFn,
    ) -> PreSolveResult {
        let mut result = PreSolveResult {
            success: true,
            ..Default::default()
        };
        let mut subjects: Vec<Vec3> = Vec::new();

        for stage in Stage::ALL {
            let outcome = match stage {
                Stage::SceneAnalysis => self.scene_analysis(scene, obstacles, progress),
                Stage::IdealPath => self.ideal_path(scene, &mut result, &mut subjects, progress),
                Stage::Avoidance => self.avoidance(obstacles, &mut result, &subjects, progress),
                Stage::Smoothing => self.smoothing(&mut result, &subjects, progress),
                Stage::Baking => self.baking(sink, &result, progress),
            };
            match outcome {
                Ok(true) => {}
                Ok(false) => {
                    result.cancelled = true;
                    result
                        .warnings
                        .push(format!("cancelled during {}", stage.name()));
                    tracing::info!(stage = stage.name(), "presolve cancelled");
                    return result;
                }
                Err(e) => {
                    result.success = false;
                    result.errors.push(format!("{}: {e:#}", stage.name()));
                    tracing::error!(stage = stage.name(), error = %e, "presolve stage failed");
                    return result;
                }
            }
        }
        result
    }

    fn frames(&self) -> impl Iterator<Item = u32> {
        self.shot.start_frame..=self.shot.end_frame
    }

    fn frame_count(&self) -> usize {
        self.shot.frame_count() as usize
    }

    /// Stage 1: read-only survey. Verifies the subject is sampleable across
    /// the range and takes a coarse obstacle census.
    fn scene_analysis(
        &self,
        scene: &dyn TransformSource,
        obstacles: &dyn ObstacleSampler,
        progress: ProgressFn,
    ) -> Result<bool> {
        let n = self.frame_count();
        let stride = (n / 20).max(1);
        let mut hit_census = 0usize;
        for (i, frame) in self.frames().step_by(stride).enumerate() {
            let Some((pos, _)) = scene.sample(self.target.subject_id, frame) else {
                bail!(
                    "subject {} has no transform at frame {frame}",
                    self.target.subject_id
                );
            };
            let probe_from = pos + Vec3::new(0.0, -self.cfg.ideal_distance, self.cfg.ideal_height);
            hit_census += obstacles.obstacles_at(frame, probe_from, pos).len();
            let p = ((i + 1) * stride) as f32 / n as f32;
            if !progress(Stage::SceneAnalysis, p.min(1.0)) {
                return Ok(false);
            }
        }
        tracing::debug!(hit_census, "scene analysis complete");
        Ok(progress(Stage::SceneAnalysis, 1.0))
    }

    /// Stage 2: per-frame mode/framing resolution and ideal-pose solve,
    /// blending through the transition machine on change frames.
    #[allow(clippy::too_many_lines)]
    fn ideal_path(
        &self,
        scene: &dyn TransformSource,
        result: &mut PreSolveResult,
        subjects: &mut Vec<Vec3>,
        progress: ProgressFn,
    ) -> Result<bool> {
        let n = self.frame_count();
        let dt = 1.0 / self.fps;
        let mut machine = TransitionStateMachine::new();
        let mut route: Option<RouteOverride> = None;
        let mut prev_subject: Option<Vec3> = None;
        let mut prev_pose: Option<Pose> = None;
        let mut current_yaw = 0.0f32;

        for (i, frame) in self.frames().enumerate() {
            let Some((subject, rot)) = scene.sample(self.target.subject_id, frame) else {
                bail!("subject transform missing at frame {frame}");
            };
            let subject = subject + Vec3::from(self.target.offset);
            let forward = rot * Vec3::X;
            let velocity = prev_subject.map_or(Vec3::ZERO, |p| (subject - p) * self.fps);

            let mode = self
                .shot
                .mode_at(frame)
                .map_or(self.cfg.mode, |c| c.mode);
            let framing = self.shot.framing_at(frame);
            let cfg = self.frame_config(&framing);

            let mut ideal = modes::solve(mode, subject, forward, velocity, &cfg, current_yaw, dt);
            apply_angle_offsets(&mut ideal, subject, &framing);

            // Mode-change frame: open a blend (or a navmesh route for
            // large jumps when a mesh is available).
            if let (Some(change), Some(start_pose)) =
                (self.shot.mode_change_on(frame), prev_pose)
            {
                if frame > self.shot.start_frame {
                    let hold = (change.duration_s * self.fps).round().max(1.0) as u32;
                    if let Some(points) =
                        self.plan_route(start_pose.position, ideal.position)
                    {
                        route = Some(RouteOverride {
                            start_frame: frame,
                            end_frame: frame + hold,
                            points,
                        });
                        machine.cancel();
                    } else {
                        machine.begin(
                            start_pose,
                            result.modes.last().copied().unwrap_or(self.cfg.mode),
                            ideal,
                            change.mode,
                            change.transition,
                            change.duration_s,
                        );
                        route = None;
                    }
                }
            }

            let pose = if let Some(r) = route.as_ref() {
                if frame >= r.end_frame {
                    route = None;
                    ideal
                } else {
                    let span = (r.end_frame - r.start_frame).max(1) as f32;
                    let t = smoother_step((frame - r.start_frame) as f32 / span);
                    let position = sample_polyline(&r.points, t);
                    Pose::looking_at(position, subject + Vec3::Z * cfg.framing.look_height)
                }
            } else if machine.is_transitioning() {
                machine.retarget(ideal);
                machine.update(dt, subject).unwrap_or(ideal)
            } else {
                ideal
            };

            current_yaw = pose.yaw;
            prev_subject = Some(subject);
            prev_pose = Some(pose);
            subjects.push(subject);
            result.path.push(pose.position);
            result.rotations.push(pose.rotation());
            result.modes.push(mode);

            if !progress(Stage::IdealPath, (i + 1) as f32 / n as f32) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Per-frame config with sparse framing overrides folded in, clamped to
    /// the shot's configured bounds.
    fn frame_config(&self, framing: &data_runtime::oneshot::ResolvedFraming) -> FollowCameraConfig {
        let mut cfg = self.cfg.clone();
        if let Some(d) = framing.distance {
            cfg.ideal_distance = d.clamp(cfg.min_distance, cfg.max_distance);
        }
        if let Some(h) = framing.height {
            cfg.ideal_height = h.clamp(cfg.min_height, cfg.max_height);
        }
        if let Some(s) = framing.shoulder_offset {
            cfg.framing.shoulder_offset = s;
        }
        cfg
    }

    /// Route a large camera jump along the navmesh. `None` when no mesh is
    /// set, the jump is small, or pathfinding fails (caller blends instead).
    fn plan_route(&self, from: Vec3, to: Vec3) -> Option<Vec<Vec3>> {
        let mesh = self.navmesh.as_ref()?;
        if !mesh.is_generated() || from.distance(to) < ROUTE_MIN_JUMP {
            return None;
        }
        let raw = find_path(mesh, from, to);
        if raw.len() < 2 {
            return None;
        }
        let smoothed = smooth_path(&raw, 2);
        Some(simplify_path(&smoothed, mesh.cell_size() * 0.25))
    }

    /// Stage 3: reapply collision avoidance per frame, independently.
    fn avoidance(
        &self,
        obstacles: &dyn ObstacleSampler,
        result: &mut PreSolveResult,
        subjects: &[Vec3],
        progress: ProgressFn,
    ) -> Result<bool> {
        let n = result.path.len();
        let mut resolver = CollisionAvoidanceResolver::new();
        for i in 0..n {
            let frame = self.shot.start_frame + u32::try_from(i)?;
            let subject = subjects[i];
            let hits = obstacles.obstacles_at(frame, result.path[i], subject);
            let deduped = resolver.dedup(&hits, self.cfg.collision.dedup_radius);
            let (corrected, _) = resolver.resolve(result.path[i], subject, &deduped, &self.cfg);
            if corrected != result.path[i] {
                result.path[i] = corrected;
                result.rotations[i] =
                    Pose::looking_at(corrected, subject + Vec3::Z * self.cfg.framing.look_height)
                        .rotation();
            }
            if !progress(Stage::Avoidance, (i + 1) as f32 / n as f32) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Stage 4: centered moving average over positions, window clamped at
    /// the sequence boundaries; rotations re-aimed afterward.
    fn smoothing(
        &self,
        result: &mut PreSolveResult,
        subjects: &[Vec3],
        progress: ProgressFn,
    ) -> Result<bool> {
        let n = result.path.len();
        if n == 0 {
            return Ok(progress(Stage::Smoothing, 1.0));
        }
        let half = self.smoothing_window / 2;
        let src = result.path.clone();
        for i in 0..n {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            let count = (hi - lo + 1) as f32;
            let sum: Vec3 = src[lo..=hi].iter().copied().sum();
            result.path[i] = sum / count;
            result.rotations[i] = Pose::looking_at(
                result.path[i],
                subjects[i] + Vec3::Z * self.cfg.framing.look_height,
            )
            .rotation();
            if !progress(Stage::Smoothing, (i + 1) as f32 / n as f32) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Stage 5: hand the final arrays to the persistence collaborator.
    fn baking(
        &self,
        sink: &mut dyn KeyframeSink,
        result: &PreSolveResult,
        progress: ProgressFn,
    ) -> Result<bool> {
        let keys: Vec<Keyframe> = result
            .path
            .iter()
            .zip(&result.rotations)
            .enumerate()
            .map(|(i, (p, r))| Keyframe {
                frame: self.shot.start_frame + u32::try_from(i).unwrap_or(u32::MAX),
                position: *p,
                rotation: *r,
            })
            .collect();
        sink.store(&keys)?;
        Ok(progress(Stage::Baking, 1.0))
    }
}

#[derive(Debug, Clone)]
struct RouteOverride {
    start_frame: u32,
    end_frame: u32,
    points: Vec<Vec3>,
}

/// Swing the solved pose around the subject by the shot's yaw offset and
/// tilt it by the pitch offset. Offsets replace per event; they are never
/// accumulated across the timeline.
fn apply_angle_offsets(
    pose: &mut Pose,
    subject: Vec3,
    framing: &data_runtime::oneshot::ResolvedFraming,
) {
    if framing.yaw_offset_deg.abs() < 1e-6 && framing.pitch_offset_deg.abs() < 1e-6 {
        return;
    }
    let yaw_off = framing.yaw_offset_deg.to_radians();
    let off = pose.position - subject;
    let (s, c) = yaw_off.sin_cos();
    pose.position = subject + Vec3::new(off.x * c - off.y * s, off.x * s + off.y * c, off.z);
    pose.yaw = camera_core::math::wrap_angle(pose.yaw + yaw_off);
    pose.pitch += framing.pitch_offset_deg.to_radians();
}

/// Sample a polyline at normalized arc length `t` in [0, 1].
fn sample_polyline(points: &[Vec3], t: f32) -> Vec3 {
    match points {
        [] => Vec3::ZERO,
        [only] => *only,
        _ => {
            let total: f32 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
            if total < 1e-6 {
                return points[0];
            }
            let mut remaining = t.clamp(0.0, 1.0) * total;
            for w in points.windows(2) {
                let seg = w[0].distance(w[1]);
                if remaining <= seg {
                    return w[0].lerp(w[1], if seg > 1e-6 { remaining / seg } else { 0.0 });
                }
                remaining -= seg;
            }
            *points.last().expect("non-empty")
        }
    }
}
