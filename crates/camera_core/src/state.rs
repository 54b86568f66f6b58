//! Camera pose and per-frame state snapshot.

use crate::math::{dir_from_yaw_pitch, look_at_angles};
use crate::systems::avoidance::ObstacleInfo;
use glam::{Quat, Vec3};

/// Position plus aim angles; the unit every system trades in.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Pose {
    #[must_use]
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
        }
    }

    /// Pose at `position` aimed at `at`.
    #[must_use]
    pub fn looking_at(position: Vec3, at: Vec3) -> Self {
        let (yaw, pitch) = look_at_angles(position, at);
        Self {
            position,
            yaw,
            pitch,
        }
    }

    #[must_use]
    pub fn look_dir(self) -> Vec3 {
        dir_from_yaw_pitch(self.yaw, self.pitch)
    }

    /// World rotation: yaw about +Z, then pitch about the local Y axis.
    #[must_use]
    pub fn rotation(self) -> Quat {
        Quat::from_rotation_z(self.yaw) * Quat::from_rotation_y(-self.pitch)
    }
}

/// Per-frame mutable snapshot, owned by one camera rig and overwritten
/// every frame.
#[derive(Debug, Clone, Default)]
pub struct CameraState {
    pub position: Vec3,
    pub rotation: Quat,
    pub yaw: f32,
    pub pitch: f32,
    /// Horizontal distance to the subject.
    pub distance: f32,
    /// Height above the subject origin.
    pub height: f32,
    pub velocity: Vec3,
    /// Obstacles considered this frame (deduplicated).
    pub obstacles: Vec<ObstacleInfo>,
    pub transitioning: bool,
    pub transition_progress: f32,
}

impl CameraState {
    pub(crate) fn apply_pose(&mut self, pose: Pose, subject: Vec3, dt: f32) {
        let prev = self.position;
        self.position = pose.position;
        self.yaw = pose.yaw;
        self.pitch = pose.pitch;
        self.rotation = pose.rotation();
        self.distance = (pose.position - subject).truncate().length();
        self.height = pose.position.z - subject.z;
        self.velocity = if dt > 0.0 {
            (pose.position - prev) / dt
        } else {
            Vec3::ZERO
        };
    }

    #[must_use]
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.yaw, self.pitch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looking_at_points_at_target() {
        let p = Pose::looking_at(Vec3::new(0.0, -3.0, 1.5), Vec3::new(0.0, 0.0, 1.5));
        let d = p.look_dir();
        assert!((d - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn apply_pose_tracks_distance_and_height() {
        let mut s = CameraState::default();
        s.apply_pose(
            Pose::looking_at(Vec3::new(3.0, 4.0, 2.0), Vec3::ZERO),
            Vec3::ZERO,
            0.016,
        );
        assert!((s.distance - 5.0).abs() < 1e-5);
        assert!((s.height - 2.0).abs() < 1e-5);
    }
}
