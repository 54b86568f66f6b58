//! nav_core: uniform-grid navigation mesh and A* pathfinding for offline
//! camera routing.
//!
//! The mesh is a one-shot batch scan over scene geometry via a host-supplied
//! ground probe; regeneration replaces all cells atomically. Queries on an
//! ungenerated mesh return empty/default results, never errors.

#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

pub mod pathfind;

use glam::{Vec2, Vec3};

/// Ground/clearance sample for one cell center, from the host scene.
#[derive(Debug, Clone, Copy)]
pub struct GroundSample {
    pub height: f32,
    /// Vertical free space above the ground at this point.
    pub clearance: f32,
}

/// Host collaborator answering ground queries during generation.
pub trait GroundProbe {
    /// `None` when there is no ground at all under this point.
    fn sample(&self, world_xy: Vec2) -> Option<GroundSample>;
}

/// One grid cell of the walkable field.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavCell {
    pub walkable: bool,
    pub height: f32,
    pub clearance: f32,
}

/// Uniform grid over the scene's horizontal bounds.
#[derive(Debug, Clone, Default)]
pub struct NavMesh {
    cells: Vec<NavCell>,
    width: usize,
    depth: usize,
    cell_size: f32,
    origin: Vec2,
    min_clearance: f32,
}

impl NavMesh {
    /// Scan `[min, max]` at `cell_size` resolution through `probe`. Cells
    /// with no ground or with clearance below `min_clearance` are blocked.
    /// The previous cell field (if any) is replaced wholesale on return.
    pub fn generate(
        &mut self,
        min: Vec2,
        max: Vec2,
        cell_size: f32,
        min_clearance: f32,
        probe: &dyn GroundProbe,
    ) {
        let cell_size = cell_size.max(1e-3);
        let span = (max - min).max(Vec2::ZERO);
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let width = (span.x / cell_size).ceil() as usize + 1;
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let depth = (span.y / cell_size).ceil() as usize + 1;

        let mut cells = Vec::with_capacity(width * depth);
        for iy in 0..depth {
            for ix in 0..width {
                let center = cell_center_xy(min, cell_size, ix, iy);
                let cell = match probe.sample(center) {
                    Some(g) => NavCell {
                        walkable: g.clearance >= min_clearance,
                        height: g.height,
                        clearance: g.clearance,
                    },
                    None => NavCell::default(),
                };
                cells.push(cell);
            }
        }
        // Atomic swap: queries never observe a half-built grid.
        self.cells = cells;
        self.width = width;
        self.depth = depth;
        self.cell_size = cell_size;
        self.origin = min;
        self.min_clearance = min_clearance;
        tracing::info!(width, depth, cell_size, "navmesh generated");
    }

    pub fn is_generated(&self) -> bool {
        !self.cells.is_empty()
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.depth)
    }

    /// Grid index for a world position; `None` outside generated bounds.
    pub fn world_to_cell(&self, world: Vec3) -> Option<(usize, usize)> {
        if !self.is_generated() {
            return None;
        }
        let rel = (Vec2::new(world.x, world.y) - self.origin) / self.cell_size;
        if rel.x < -0.5 || rel.y < -0.5 {
            return None;
        }
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let ix = (rel.x + 0.5).floor() as usize;
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let iy = (rel.y + 0.5).floor() as usize;
        (ix < self.width && iy < self.depth).then_some((ix, iy))
    }

    pub fn cell(&self, ix: usize, iy: usize) -> Option<&NavCell> {
        (ix < self.width && iy < self.depth).then(|| &self.cells[iy * self.width + ix])
    }

    /// World center of a cell, at its sampled ground height.
    pub fn cell_center(&self, ix: usize, iy: usize) -> Vec3 {
        let xy = cell_center_xy(self.origin, self.cell_size, ix, iy);
        let z = self.cell(ix, iy).map_or(0.0, |c| c.height);
        Vec3::new(xy.x, xy.y, z)
    }

    /// Whether the cell under a world position is walkable; false when the
    /// mesh is ungenerated or the position lies outside it.
    pub fn is_walkable(&self, world: Vec3) -> bool {
        self.world_to_cell(world)
            .and_then(|(ix, iy)| self.cell(ix, iy))
            .is_some_and(|c| c.walkable)
    }
}

fn cell_center_xy(origin: Vec2, cell_size: f32, ix: usize, iy: usize) -> Vec2 {
    #[allow(clippy::cast_precision_loss)]
    Vec2::new(
        origin.x + ix as f32 * cell_size,
        origin.y + iy as f32 * cell_size,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat ground with a configurable blocked square.
    pub(crate) struct FlatProbe {
        pub blocked: Option<(Vec2, Vec2)>,
    }

    impl GroundProbe for FlatProbe {
        fn sample(&self, p: Vec2) -> Option<GroundSample> {
            let clearance = match self.blocked {
                Some((lo, hi)) if p.x >= lo.x && p.x <= hi.x && p.y >= lo.y && p.y <= hi.y => 0.0,
                _ => 10.0,
            };
            Some(GroundSample {
                height: 0.0,
                clearance,
            })
        }
    }

    #[test]
    fn generate_covers_bounds() {
        let mut m = NavMesh::default();
        m.generate(
            Vec2::ZERO,
            Vec2::new(4.0, 4.0),
            1.0,
            2.0,
            &FlatProbe { blocked: None },
        );
        assert_eq!(m.dims(), (5, 5));
        assert!(m.is_walkable(Vec3::new(2.0, 2.0, 0.0)));
        assert!(!m.is_walkable(Vec3::new(9.0, 0.0, 0.0)));
    }

    #[test]
    fn low_clearance_blocks_cells() {
        let mut m = NavMesh::default();
        m.generate(
            Vec2::ZERO,
            Vec2::new(4.0, 4.0),
            1.0,
            2.0,
            &FlatProbe {
                blocked: Some((Vec2::new(1.5, 1.5), Vec2::new(2.5, 2.5))),
            },
        );
        assert!(!m.is_walkable(Vec3::new(2.0, 2.0, 0.0)));
        assert!(m.is_walkable(Vec3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn regeneration_replaces_all_cells() {
        let mut m = NavMesh::default();
        m.generate(
            Vec2::ZERO,
            Vec2::new(4.0, 4.0),
            1.0,
            2.0,
            &FlatProbe {
                blocked: Some((Vec2::ZERO, Vec2::new(4.0, 4.0))),
            },
        );
        assert!(!m.is_walkable(Vec3::new(2.0, 2.0, 0.0)));
        m.generate(
            Vec2::ZERO,
            Vec2::new(4.0, 4.0),
            1.0,
            2.0,
            &FlatProbe { blocked: None },
        );
        assert!(m.is_walkable(Vec3::new(2.0, 2.0, 0.0)));
    }

    #[test]
    fn ungenerated_mesh_answers_defaults() {
        let m = NavMesh::default();
        assert!(!m.is_generated());
        assert!(m.world_to_cell(Vec3::ZERO).is_none());
        assert!(!m.is_walkable(Vec3::ZERO));
    }
}
