//! Transition state machine: Steady <-> Transitioning(kind).
//!
//! One active transition at most; starting a new one replaces it. Progress
//! is `clamp(elapsed / duration, 0, 1)` and never decreases. Completion
//! fires the registered callback once and returns the machine to Steady.
//!
//! The cut strategy deliberately never interpolates: it holds the exact
//! start pose until progress hits 1, then snaps to the exact target pose.

use crate::math::{dolly_ease, lerp_angle, look_at_angles, smoother_step, wrap_angle};
use crate::state::Pose;
use data_runtime::{FollowMode, TransitionKind};
use glam::Vec3;

type CompletionFn = Box<dyn FnMut(FollowMode, TransitionKind)>;

/// Bookkeeping for the active blend.
#[derive(Debug, Clone, Copy)]
pub struct TransitionState {
    pub start: Pose,
    pub start_mode: FollowMode,
    pub target: Pose,
    pub target_mode: FollowMode,
    pub kind: TransitionKind,
    pub elapsed: f32,
    pub duration: f32,
}

impl TransitionState {
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

#[derive(Default)]
pub struct TransitionStateMachine {
    active: Option<TransitionState>,
    on_complete: Option<CompletionFn>,
}

impl std::fmt::Debug for TransitionStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionStateMachine")
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl TransitionStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoked once per completed transition with the mode and kind landed on.
    pub fn set_on_complete(&mut self, f: impl FnMut(FollowMode, TransitionKind) + 'static) {
        self.on_complete = Some(Box::new(f));
    }

    /// Open a transition, replacing any active one.
    pub fn begin(
        &mut self,
        start: Pose,
        start_mode: FollowMode,
        target: Pose,
        target_mode: FollowMode,
        kind: TransitionKind,
        duration: f32,
    ) {
        self.active = Some(TransitionState {
            start,
            start_mode,
            target,
            target_mode,
            kind,
            elapsed: 0.0,
            duration: duration.max(0.0),
        });
    }

    /// Track a moving ideal pose while blending (online use).
    pub fn retarget(&mut self, target: Pose) {
        if let Some(t) = self.active.as_mut() {
            t.target = target;
        }
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn progress(&self) -> f32 {
        self.active.as_ref().map_or(1.0, TransitionState::progress)
    }

    #[must_use]
    pub fn active(&self) -> Option<&TransitionState> {
        self.active.as_ref()
    }

    /// Abandon the active transition without firing the callback.
    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Advance by `dt` and evaluate. Returns `None` while Steady. On the
    /// update that reaches progress 1 the callback fires, the machine
    /// returns to Steady, and the exact target pose is returned.
    pub fn update(&mut self, dt: f32, subject_pos: Vec3) -> Option<Pose> {
        let state = self.active.as_mut()?;
        state.elapsed += dt.max(0.0);
        let snapshot = *state;
        let p = snapshot.progress();
        if p >= 1.0 {
            self.active = None;
            if let Some(cb) = self.on_complete.as_mut() {
                cb(snapshot.target_mode, snapshot.kind);
            }
            return Some(snapshot.target);
        }
        Some(evaluate(&snapshot, p, subject_pos))
    }
}

/// Evaluate a transition at progress `p` in [0, 1).
#[must_use]
pub fn evaluate(state: &TransitionState, p: f32, subject_pos: Vec3) -> Pose {
    match state.kind {
        TransitionKind::Cut => {
            if p >= 1.0 {
                state.target
            } else {
                state.start
            }
        }
        TransitionKind::Blend => mix_poses(state.start, state.target, smoother_step(p)),
        TransitionKind::Dolly => mix_poses(state.start, state.target, dolly_ease(p)),
        TransitionKind::Orbit => orbit_arc(state.start, state.target, p, subject_pos),
    }
}

fn mix_poses(a: Pose, b: Pose, t: f32) -> Pose {
    Pose::new(
        a.position.lerp(b.position, t),
        lerp_angle(a.yaw, b.yaw, t),
        lerp_angle(a.pitch, b.pitch, t),
    )
}

/// Arc around the subject: start/end camera offsets in polar form, angular
/// delta eased along the shorter arc, radius and height interpolated, and a
/// pose reconstructed that keeps facing the subject throughout.
fn orbit_arc(start: Pose, target: Pose, p: f32, subject: Vec3) -> Pose {
    let t = smoother_step(p);
    let s_off = start.position - subject;
    let e_off = target.position - subject;
    let s_angle = s_off.y.atan2(s_off.x);
    let e_angle = e_off.y.atan2(e_off.x);
    let s_radius = s_off.truncate().length();
    let e_radius = e_off.truncate().length();

    let angle = s_angle + wrap_angle(e_angle - s_angle) * t;
    let radius = s_radius + (e_radius - s_radius) * t;
    let height = s_off.z + (e_off.z - s_off.z) * t;

    let (sa, ca) = angle.sin_cos();
    let position = subject + Vec3::new(ca * radius, sa * radius, height);
    let (yaw, _) = look_at_angles(position, subject);
    let pitch = lerp_angle(start.pitch, target.pitch, t);
    Pose::new(position, yaw, pitch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poses() -> (Pose, Pose) {
        let a = Pose::looking_at(Vec3::new(5.0, 0.0, 2.0), Vec3::ZERO);
        let b = Pose::looking_at(Vec3::new(0.0, 5.0, 2.0), Vec3::ZERO);
        (a, b)
    }

    #[test]
    fn progress_is_monotonic_and_clamped() {
        let (a, b) = poses();
        let mut m = TransitionStateMachine::new();
        m.begin(a, FollowMode::Chase, b, FollowMode::Lead, TransitionKind::Blend, 1.0);
        let mut last = 0.0;
        for _ in 0..20 {
            let _ = m.update(0.1, Vec3::ZERO);
            let p = m.progress();
            assert!(p >= last);
            assert!((0.0..=1.0).contains(&p));
            last = p;
        }
        assert!(!m.is_transitioning());
    }

    #[test]
    fn cut_never_interpolates() {
        let (a, b) = poses();
        let mut m = TransitionStateMachine::new();
        m.begin(a, FollowMode::Chase, b, FollowMode::Lead, TransitionKind::Cut, 1.0);
        for _ in 0..9 {
            let pose = m.update(0.1, Vec3::ZERO).expect("active");
            assert!(pose == a || pose == b, "cut produced an intermediate pose");
        }
        let last = m.update(0.5, Vec3::ZERO).expect("final");
        assert_eq!(last, b);
    }

    #[test]
    fn completion_fires_callback_once_and_returns_to_steady() {
        use std::cell::Cell;
        use std::rc::Rc;
        let fired = Rc::new(Cell::new(0));
        let fired2 = Rc::clone(&fired);
        let (a, b) = poses();
        let mut m = TransitionStateMachine::new();
        m.set_on_complete(move |mode, _| {
            assert_eq!(mode, FollowMode::Lead);
            fired2.set(fired2.get() + 1);
        });
        m.begin(a, FollowMode::Chase, b, FollowMode::Lead, TransitionKind::Blend, 0.2);
        let _ = m.update(0.1, Vec3::ZERO);
        let _ = m.update(0.2, Vec3::ZERO);
        let _ = m.update(0.1, Vec3::ZERO);
        assert_eq!(fired.get(), 1);
        assert!(!m.is_transitioning());
    }

    #[test]
    fn orbit_distance_stays_between_endpoints() {
        let subject = Vec3::ZERO;
        let a = Pose::looking_at(Vec3::new(4.0, 0.0, 2.0), subject);
        let b = Pose::looking_at(Vec3::new(0.0, 7.0, 2.0), subject);
        let state = TransitionState {
            start: a,
            start_mode: FollowMode::Chase,
            target: b,
            target_mode: FollowMode::OrbitFollow,
            kind: TransitionKind::Orbit,
            elapsed: 0.0,
            duration: 1.0,
        };
        let d0 = a.position.distance(subject);
        let d1 = b.position.distance(subject);
        let (lo, hi) = (d0.min(d1) - 1e-3, d0.max(d1) + 1e-3);
        for i in 0..=20 {
            #[allow(clippy::cast_precision_loss)]
            let p = i as f32 / 20.0;
            let pose = evaluate(&state, p, subject);
            let d = pose.position.distance(subject);
            assert!(d >= lo && d <= hi, "d={d} outside [{lo}, {hi}] at p={p}");
        }
    }

    #[test]
    fn new_transition_replaces_active_one() {
        let (a, b) = poses();
        let mut m = TransitionStateMachine::new();
        m.begin(a, FollowMode::Chase, b, FollowMode::Lead, TransitionKind::Blend, 1.0);
        let _ = m.update(0.5, Vec3::ZERO);
        m.begin(b, FollowMode::Lead, a, FollowMode::Chase, TransitionKind::Dolly, 1.0);
        assert!((m.progress() - 0.0).abs() < 1e-6);
        assert_eq!(m.active().unwrap().kind, TransitionKind::Dolly);
    }
}
