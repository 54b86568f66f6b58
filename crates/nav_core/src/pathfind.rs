//! A* over the navmesh grid plus two independent post-processing passes.
//!
//! Failures are non-fatal and signaled only by an empty path: endpoints
//! outside the generated grid, unreachable goals, and expansion-cap
//! exhaustion all return `Vec::new()` and the caller picks a fallback.

use crate::NavMesh;
use glam::Vec3;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Upper bound on A* node expansions; the only worst-case cost limiter.
pub const MAX_EXPANSIONS: usize = 10_000;

const SQRT_2: f32 = std::f32::consts::SQRT_2;

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f: f32,
    /// Insertion counter; equal-cost nodes pop in insertion order.
    seq: u64,
    idx: usize,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.seq == other.seq
    }
}
impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on f, then FIFO on seq, via reversed comparisons.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 8-connected A* between two world points.
///
/// The returned path substitutes the caller's exact `start`/`end` for the
/// first/last cell centers, so round-tripping through the grid never moves
/// the endpoints.
#[must_use]
pub fn find_path(mesh: &NavMesh, start: Vec3, end: Vec3) -> Vec<Vec3> {
    let (Some(s), Some(e)) = (mesh.world_to_cell(start), mesh.world_to_cell(end)) else {
        return Vec::new();
    };
    let walkable =
        |c: (usize, usize)| mesh.cell(c.0, c.1).is_some_and(|cell| cell.walkable);
    if !walkable(s) || !walkable(e) {
        return Vec::new();
    }
    let (w, d) = mesh.dims();
    let cell = mesh.cell_size();
    let index = |c: (usize, usize)| c.1 * w + c.0;
    let coords = |i: usize| (i % w, i / w);

    let heuristic = |i: usize| {
        let (ix, iy) = coords(i);
        #[allow(clippy::cast_precision_loss)]
        let dx = (ix as f32 - e.0 as f32) * cell;
        #[allow(clippy::cast_precision_loss)]
        let dy = (iy as f32 - e.1 as f32) * cell;
        dx.hypot(dy)
    };

    let mut g = vec![f32::INFINITY; w * d];
    let mut came_from: Vec<Option<usize>> = vec![None; w * d];
    let mut open = BinaryHeap::new();
    let mut seq = 0u64;

    g[index(s)] = 0.0;
    open.push(OpenNode {
        f: heuristic(index(s)),
        seq,
        idx: index(s),
    });

    let goal = index(e);
    let mut expansions = 0usize;
    let mut found = false;

    while let Some(node) = open.pop() {
        if node.idx == goal {
            found = true;
            break;
        }
        // Stale entry: a cheaper route to this cell was already expanded.
        if node.f > g[node.idx] + heuristic(node.idx) + 1e-4 {
            continue;
        }
        expansions += 1;
        if expansions > MAX_EXPANSIONS {
            tracing::warn!(expansions, "pathfinding expansion cap hit");
            return Vec::new();
        }

        let (ix, iy) = coords(node.idx);
        for (dx, dy) in [
            (-1i64, 0i64),
            (1, 0),
            (0, -1),
            (0, 1),
            (-1, -1),
            (-1, 1),
            (1, -1),
            (1, 1),
        ] {
            #[allow(clippy::cast_possible_wrap)]
            let (nx, ny) = (ix as i64 + dx, iy as i64 + dy);
            if nx < 0 || ny < 0 {
                continue;
            }
            #[allow(clippy::cast_sign_loss)]
            let n = (nx as usize, ny as usize);
            if n.0 >= w || n.1 >= d || !walkable(n) {
                continue;
            }
            let step = if dx != 0 && dy != 0 {
                cell * SQRT_2
            } else {
                cell
            };
            let ni = index(n);
            let tentative = g[node.idx] + step;
            if tentative < g[ni] {
                g[ni] = tentative;
                came_from[ni] = Some(node.idx);
                seq += 1;
                open.push(OpenNode {
                    f: tentative + heuristic(ni),
                    seq,
                    idx: ni,
                });
            }
        }
    }

    if !found {
        return Vec::new();
    }

    let mut cells = vec![goal];
    let mut cur = goal;
    while let Some(prev) = came_from[cur] {
        cells.push(prev);
        cur = prev;
    }
    cells.reverse();

    let mut path: Vec<Vec3> = cells
        .iter()
        .map(|&i| {
            let (ix, iy) = coords(i);
            mesh.cell_center(ix, iy)
        })
        .collect();
    // Exact caller endpoints, not cell centers.
    if let Some(first) = path.first_mut() {
        *first = start;
    }
    if let Some(last) = path.last_mut() {
        *last = end;
    }
    if path.len() == 1 {
        path = vec![start, end];
    }
    path
}

/// Iterative corner-cutting: interior points are pulled toward their
/// neighbors' midpoint; endpoints are preserved exactly.
#[must_use]
pub fn smooth_path(path: &[Vec3], iterations: usize) -> Vec<Vec3> {
    let mut out = path.to_vec();
    if out.len() < 3 {
        return out;
    }
    for _ in 0..iterations {
        let prev = out.clone();
        for i in 1..prev.len() - 1 {
            let mid = (prev[i - 1] + prev[i + 1]) * 0.5;
            out[i] = prev[i] * 0.5 + mid * 0.5;
        }
    }
    out
}

/// Ramer-Douglas-Peucker simplification; endpoints are always kept.
#[must_use]
pub fn simplify_path(path: &[Vec3], tolerance: f32) -> Vec<Vec3> {
    if path.len() < 3 {
        return path.to_vec();
    }
    let mut keep = vec![false; path.len()];
    keep[0] = true;
    keep[path.len() - 1] = true;
    rdp_mark(path, 0, path.len() - 1, tolerance, &mut keep);
    path.iter()
        .zip(&keep)
        .filter_map(|(p, &k)| k.then_some(*p))
        .collect()
}

fn rdp_mark(path: &[Vec3], lo: usize, hi: usize, tolerance: f32, keep: &mut [bool]) {
    if hi <= lo + 1 {
        return;
    }
    let mut max_d = 0.0f32;
    let mut max_i = lo;
    for i in lo + 1..hi {
        let d = perpendicular_distance(path[i], path[lo], path[hi]);
        if d > max_d {
            max_d = d;
            max_i = i;
        }
    }
    if max_d > tolerance {
        keep[max_i] = true;
        rdp_mark(path, lo, max_i, tolerance, keep);
        rdp_mark(path, max_i, hi, tolerance, keep);
    }
}

/// Distance from `p` to the chord `a`-`b` (point distance when degenerate).
fn perpendicular_distance(p: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-12 {
        return (p - a).length();
    }
    (p - a).cross(ab).length() / len_sq.sqrt()
}
