use data_runtime::configs::follow_camera::FollowCameraConfig;
use data_runtime::oneshot::{FramingChange, ModeChange};
use data_runtime::{FollowMode, FollowTarget, ObstacleResponse, OneShotConfig, TransitionKind};
use glam::{Quat, Vec3};
use presolve::{
    Keyframe, KeyframeSink, ObstacleSampler, PreSolvePipeline, Stage, TransformSource,
};

/// Subject walking +Y at 2 m/s, facing +Y, at 30 fps.
struct Walker;

impl TransformSource for Walker {
    fn sample(&self, object_id: u64, frame: u32) -> Option<(Vec3, Quat)> {
        (object_id == 1).then(|| {
            let y = frame as f32 / 30.0 * 2.0;
            (
                Vec3::new(0.0, y, 0.0),
                Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            )
        })
    }
}

/// Transform source that loses the subject after a given frame.
struct VanishingWalker {
    last_frame: u32,
}

impl TransformSource for VanishingWalker {
    fn sample(&self, object_id: u64, frame: u32) -> Option<(Vec3, Quat)> {
        (frame <= self.last_frame)
            .then(|| Walker.sample(object_id, frame))
            .flatten()
    }
}

struct NoObstacles;
impl ObstacleSampler for NoObstacles {
    fn obstacles_at(
        &self,
        _frame: u32,
        _camera_pos: Vec3,
        _subject_pos: Vec3,
    ) -> Vec<camera_core::ObstacleInfo> {
        Vec::new()
    }
}

/// A solid wall reported during a band of frames.
struct WallDuring {
    from: u32,
    to: u32,
}
impl ObstacleSampler for WallDuring {
    fn obstacles_at(
        &self,
        frame: u32,
        camera_pos: Vec3,
        subject_pos: Vec3,
    ) -> Vec<camera_core::ObstacleInfo> {
        if frame < self.from || frame > self.to {
            return Vec::new();
        }
        let mid = (camera_pos + subject_pos) * 0.5;
        vec![camera_core::ObstacleInfo {
            object_id: 99,
            position: mid,
            normal: Vec3::Y,
            distance: camera_pos.distance(mid),
            transparent: false,
            trigger: false,
            response: ObstacleResponse::PushForward,
        }]
    }
}

#[derive(Default)]
struct VecSink {
    keys: Vec<Keyframe>,
}
impl KeyframeSink for VecSink {
    fn store(&mut self, keys: &[Keyframe]) -> anyhow::Result<()> {
        self.keys = keys.to_vec();
        Ok(())
    }
}

struct FailingSink;
impl KeyframeSink for FailingSink {
    fn store(&mut self, _keys: &[Keyframe]) -> anyhow::Result<()> {
        anyhow::bail!("timeline is read-only")
    }
}

fn shot(frames: u32) -> OneShotConfig {
    OneShotConfig {
        start_frame: 0,
        end_frame: frames - 1,
        mode_changes: Vec::new(),
        framing_changes: Vec::new(),
    }
}

fn pipeline(shot: OneShotConfig) -> PreSolvePipeline {
    PreSolvePipeline::new(FollowCameraConfig::default(), target(), shot).expect("valid")
}

fn target() -> FollowTarget {
    FollowTarget {
        subject_id: 1,
        ..Default::default()
    }
}

#[test]
fn clean_run_bakes_every_frame() {
    let mut sink = VecSink::default();
    let result = pipeline(shot(60)).run(&Walker, &NoObstacles, &mut sink, &mut |_, _| true);
    assert!(result.success, "errors: {:?}", result.errors);
    assert!(result.errors.is_empty());
    assert_eq!(result.path.len(), 60);
    assert_eq!(sink.keys.len(), 60);
    assert_eq!(sink.keys[0].frame, 0);
    assert_eq!(sink.keys[59].frame, 59);
    // Camera trails the subject, which walks +Y
    assert!(result.path[59].y > result.path[0].y);
}

#[test]
fn progress_reaches_one_for_each_stage() {
    let mut sink = VecSink::default();
    let mut seen: Vec<(Stage, f32)> = Vec::new();
    let _ = pipeline(shot(30)).run(&Walker, &NoObstacles, &mut sink, &mut |s, p| {
        seen.push((s, p));
        true
    });
    for stage in [
        Stage::SceneAnalysis,
        Stage::IdealPath,
        Stage::Avoidance,
        Stage::Smoothing,
        Stage::Baking,
    ] {
        let max = seen
            .iter()
            .filter(|(s, _)| *s == stage)
            .map(|(_, p)| *p)
            .fold(0.0f32, f32::max);
        assert!((max - 1.0).abs() < 1e-6, "stage {stage:?} max {max}");
    }
}

#[test]
fn mode_timeline_drives_per_frame_modes() {
    let mut s = shot(200);
    s.mode_changes = vec![
        ModeChange {
            frame: 1,
            mode: FollowMode::Chase,
            transition: TransitionKind::Blend,
            duration_s: 0.2,
        },
        ModeChange {
            frame: 100,
            mode: FollowMode::Aerial,
            transition: TransitionKind::Cut,
            duration_s: 0.0,
        },
    ];
    let mut sink = VecSink::default();
    let result = pipeline(s).run(&Walker, &NoObstacles, &mut sink, &mut |_, _| true);
    assert!(result.success);
    assert_eq!(result.modes[0], FollowMode::OverShoulder);
    assert_eq!(result.modes[50], FollowMode::Chase);
    assert_eq!(result.modes[150], FollowMode::Aerial);
}

#[test]
fn framing_overrides_pull_camera_distance() {
    let mut near = shot(40);
    near.framing_changes = vec![FramingChange {
        frame: 0,
        distance: Some(1.5),
        ..Default::default()
    }];
    let mut sink_near = VecSink::default();
    let near_r = pipeline(near).run(&Walker, &NoObstacles, &mut sink_near, &mut |_, _| true);
    let mut sink_far = VecSink::default();
    let far_r = pipeline(shot(40)).run(&Walker, &NoObstacles, &mut sink_far, &mut |_, _| true);
    let subject = Vec3::new(0.0, 20.0 / 30.0 * 2.0, 0.0);
    let d_near = near_r.path[20].distance(subject);
    let d_far = far_r.path[20].distance(subject);
    assert!(d_near < d_far);
}

#[test]
fn failing_bake_preserves_partial_result() {
    let mut sink = FailingSink;
    let result = pipeline(shot(30)).run(&Walker, &NoObstacles, &mut sink, &mut |_, _| true);
    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("baking:"), "{:?}", result.errors);
    // Everything computed before the failure survives
    assert_eq!(result.path.len(), 30);
    assert_eq!(result.rotations.len(), 30);
}

#[test]
fn missing_subject_fails_scene_analysis() {
    let mut sink = VecSink::default();
    let result = pipeline(shot(60)).run(
        &VanishingWalker { last_frame: 10 },
        &NoObstacles,
        &mut sink,
        &mut |_, _| true,
    );
    assert!(!result.success);
    assert!(result.errors[0].starts_with("scene_analysis:"));
    assert!(sink.keys.is_empty());
}

#[test]
fn cancellation_stops_mid_stage_and_keeps_partials() {
    let mut sink = VecSink::default();
    let mut calls = 0;
    let result = pipeline(shot(100)).run(&Walker, &NoObstacles, &mut sink, &mut |stage, _| {
        if stage == Stage::IdealPath {
            calls += 1;
            calls < 10
        } else {
            true
        }
    });
    assert!(result.cancelled);
    assert!(result.success, "cancel is not an error");
    assert_eq!(result.path.len(), 10);
    assert!(result.warnings.iter().any(|w| w.contains("ideal_path")));
    assert!(sink.keys.is_empty());
}

#[test]
fn obstacles_push_the_camera_closer() {
    let mut sink_clear = VecSink::default();
    let clear = pipeline(shot(40)).run(&Walker, &NoObstacles, &mut sink_clear, &mut |_, _| true);
    let mut sink_blocked = VecSink::default();
    let blocked = pipeline(shot(40)).run(
        &Walker,
        &WallDuring { from: 10, to: 30 },
        &mut sink_blocked,
        &mut |_, _| true,
    );
    assert!(blocked.success);
    let subject = Vec3::new(0.0, 20.0 / 30.0 * 2.0, 0.0);
    assert!(blocked.path[20].distance(subject) < clear.path[20].distance(subject));
}
