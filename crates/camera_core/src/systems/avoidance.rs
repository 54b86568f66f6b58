//! Collision-avoidance resolver: turns externally supplied obstruction hits
//! into a corrected camera position.
//!
//! Hit order is preserved: the first solid (non-transparent, non-trigger)
//! entry in the supplied list is the primary obstacle, matching the raycast
//! return order rather than sorting by distance.

use data_runtime::configs::follow_camera::FollowCameraConfig;
use data_runtime::ObstacleResponse;
use glam::Vec3;

/// One detected obstruction, recomputed each frame by the host's raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleInfo {
    pub object_id: u64,
    pub position: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    pub transparent: bool,
    pub trigger: bool,
    pub response: ObstacleResponse,
}

impl ObstacleInfo {
    /// Solid obstacles block the shot; transparent and trigger hits do not.
    #[must_use]
    pub fn is_solid(&self) -> bool {
        !self.transparent && !self.trigger
    }
}

/// Why the resolver returned the position it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvoidanceOutcome {
    /// Avoidance disabled in config; position untouched.
    Disabled,
    /// Nothing solid in the list; position untouched.
    NoSolidObstacle,
    Applied(ObstacleResponse),
}

/// Gap left between camera and obstruction when pushing forward.
const PUSH_MARGIN: f32 = 0.3;
/// Yaw step used by the orbit_away response, radians.
const ORBIT_STEP: f32 = 0.26;
/// Height step used by the raise_up response.
const RAISE_STEP: f32 = 0.5;

#[derive(Debug, Default)]
pub struct CollisionAvoidanceResolver {
    /// Last frame's deduplicated hits, used to stabilize repeats.
    remembered: Vec<ObstacleInfo>,
}

impl CollisionAvoidanceResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collapse near-identical repeats of the same object, both within the
    /// incoming list and against last frame's hits (whose positions are kept
    /// so a hovering raycast does not jitter the response). Order preserved.
    pub fn dedup(&mut self, hits: &[ObstacleInfo], radius: f32) -> Vec<ObstacleInfo> {
        let mut out: Vec<ObstacleInfo> = Vec::with_capacity(hits.len());
        for hit in hits {
            if out
                .iter()
                .any(|kept| kept.object_id == hit.object_id
                    && kept.position.distance(hit.position) < radius)
            {
                continue;
            }
            let stabilized = self
                .remembered
                .iter()
                .find(|prev| {
                    prev.object_id == hit.object_id
                        && prev.position.distance(hit.position) < radius
                })
                .map_or(*hit, |prev| ObstacleInfo {
                    position: prev.position,
                    normal: prev.normal,
                    ..*hit
                });
            out.push(stabilized);
        }
        self.remembered = out.clone();
        out
    }

    /// Resolve the frame's obstacle list into a corrected camera position.
    /// The list should already be deduplicated via [`Self::dedup`].
    #[must_use]
    pub fn resolve(
        &self,
        position: Vec3,
        target_pos: Vec3,
        obstacles: &[ObstacleInfo],
        cfg: &FollowCameraConfig,
    ) -> (Vec3, AvoidanceOutcome) {
        if !cfg.collision.enabled {
            return (position, AvoidanceOutcome::Disabled);
        }
        let Some(primary) = obstacles.iter().find(|o| o.is_solid()) else {
            return (position, AvoidanceOutcome::NoSolidObstacle);
        };
        let corrected = match primary.response {
            ObstacleResponse::PushForward => push_forward(position, target_pos, primary, cfg),
            ObstacleResponse::OrbitAway => orbit_away(position, target_pos, primary),
            ObstacleResponse::RaiseUp => raise_up(position, target_pos, cfg),
            ObstacleResponse::BackAway => back_away(position, target_pos, primary, cfg),
            ObstacleResponse::ZoomThrough => position,
        };
        tracing::debug!(
            object_id = primary.object_id,
            response = ?primary.response,
            "avoidance applied"
        );
        (corrected, AvoidanceOutcome::Applied(primary.response))
    }
}

/// Move the camera in toward the subject, just inside the obstruction,
/// never closer than `min_distance`.
fn push_forward(
    position: Vec3,
    target_pos: Vec3,
    primary: &ObstacleInfo,
    cfg: &FollowCameraConfig,
) -> Vec3 {
    let to_cam = position - target_pos;
    let dist = to_cam.length();
    if dist < 1e-6 {
        return position;
    }
    let desired = (primary.distance - PUSH_MARGIN)
        .clamp(cfg.min_distance, dist.max(cfg.min_distance));
    target_pos + to_cam / dist * desired
}

/// Rotate the camera around the subject, away from the obstruction's
/// horizontally projected normal.
fn orbit_away(position: Vec3, target_pos: Vec3, primary: &ObstacleInfo) -> Vec3 {
    let off = position - target_pos;
    let flat = glam::Vec2::new(off.x, off.y);
    if flat.length_squared() < 1e-10 {
        return position;
    }
    let n = glam::Vec2::new(primary.normal.x, primary.normal.y);
    // Turn away from the surface: the normal's winding side decides the sign.
    let side = flat.perp_dot(n);
    let step = if side >= 0.0 { -ORBIT_STEP } else { ORBIT_STEP };
    let (s, c) = step.sin_cos();
    let rotated = glam::Vec2::new(flat.x * c - flat.y * s, flat.x * s + flat.y * c);
    Vec3::new(
        target_pos.x + rotated.x,
        target_pos.y + rotated.y,
        position.z,
    )
}

/// Lift the camera, clamped to the configured max height over the subject.
fn raise_up(position: Vec3, target_pos: Vec3, cfg: &FollowCameraConfig) -> Vec3 {
    let max_z = target_pos.z + cfg.max_height;
    Vec3::new(position.x, position.y, (position.z + RAISE_STEP).min(max_z))
}

/// When the obstruction sits behind the camera, step toward the subject.
fn back_away(
    position: Vec3,
    target_pos: Vec3,
    primary: &ObstacleInfo,
    cfg: &FollowCameraConfig,
) -> Vec3 {
    let to_target = target_pos - position;
    let behind = (primary.position - position).dot(to_target) < 0.0;
    if !behind {
        return position;
    }
    let dist = to_target.length();
    if dist < 1e-6 {
        return position;
    }
    let step = RAISE_STEP.min((dist - cfg.min_distance).max(0.0));
    position + to_target / dist * step
}
