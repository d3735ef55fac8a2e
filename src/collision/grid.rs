use crate::body::Body;
use crate::collision::{handle_collision, CollisionResolver};
use crate::diagnostics::StepDiagnostics;
use crate::error::CoreError;
use crate::vector3d::Vector3D;

/// Uniform 3D spatial hash for broadphase collision detection. Bucket
/// storage persists across calls and is only sparsely cleared (just the
/// cells touched last frame), rather than reallocated every step.
#[derive(Debug, Default)]
pub struct UniformGrid {
    buckets: Vec<Vec<u32>>,
    touched_cells: Vec<usize>,
}

impl UniformGrid {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear_touched(&mut self) {
        for &cell in &self.touched_cells {
            if let Some(bucket) = self.buckets.get_mut(cell) {
                bucket.clear();
            }
        }
        self.touched_cells.clear();
    }
}

impl CollisionResolver for UniformGrid {
    fn resolve(&mut self, bodies: &mut [Body], elastic: bool, diagnostics: &mut StepDiagnostics) -> Result<(), CoreError> {
        self.clear_touched();

        let active: Vec<usize> = (0..bodies.len()).filter(|&i| !bodies[i].is_absorbed).collect();
        if active.is_empty() {
            return Ok(());
        }

        let mut min = Vector3D::splat(f64::MAX);
        let mut max = Vector3D::splat(f64::MIN);
        let mut r_max: f64 = 0.0;
        let mut radii = Vec::with_capacity(active.len());
        for &i in &active {
            let p = bodies[i].position;
            min = min.min(p);
            max = max.max(p);
            let r = bodies[i].radius();
            r_max = r_max.max(r);
            radii.push(r);
        }

        let mut sorted_radii = radii.clone();
        sorted_radii.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let median_r = sorted_radii[sorted_radii.len() / 2];
        let base_r = r_max.min(median_r.max(0.25 * r_max));
        let scale = 2.0;
        let cell_size = (2.0 * scale * base_r).max(1e-9);

        let extent = max - min;
        let cols = ((extent.x / cell_size).floor() as i64 + 1).max(1);
        let rows = ((extent.y / cell_size).floor() as i64 + 1).max(1);
        let depths = ((extent.z / cell_size).floor() as i64 + 1).max(1);

        let cell_of = |p: Vector3D| -> (i64, i64, i64) {
            let x = ((p.x - min.x) / cell_size).floor() as i64;
            let y = ((p.y - min.y) / cell_size).floor() as i64;
            let z = ((p.z - min.z) / cell_size).floor() as i64;
            (x.clamp(0, cols - 1), y.clamp(0, rows - 1), z.clamp(0, depths - 1))
        };
        let key_of = |(x, y, z): (i64, i64, i64)| -> usize { (z * cols * rows + y * cols + x) as usize };

        let total_cells = (cols * rows * depths) as usize;
        if self.buckets.len() < total_cells {
            self.buckets.resize_with(total_cells, Vec::new);
        }

        let mut body_cells = Vec::with_capacity(active.len());
        for &i in &active {
            let cell = cell_of(bodies[i].position);
            let key = key_of(cell);
            self.buckets[key].push(i as u32);
            self.touched_cells.push(key);
            body_cells.push(cell);
        }

        let mut candidate_pairs = 0u64;
        let mut resolved_pairs = 0u64;

        for (slot, &i) in active.iter().enumerate() {
            let (cx, cy, cz) = body_cells[slot];
            let range = ((radii[slot] / cell_size).ceil() as i64 + 1).max(1);

            for dz in -range..=range {
                for dy in -range..=range {
                    for dx in -range..=range {
                        let (nx, ny, nz) = (cx + dx, cy + dy, cz + dz);
                        if nx < 0 || ny < 0 || nz < 0 || nx >= cols || ny >= rows || nz >= depths {
                            continue;
                        }
                        // Half-space dedup: skip cells strictly earlier in
                        // lexicographic (z, y, x) order than i's own cell.
                        let neighbor_order = (nz, ny, nx);
                        let own_order = (cz, cy, cx);
                        if neighbor_order < own_order {
                            continue;
                        }
                        let same_cell = neighbor_order == own_order;

                        let key = key_of((nx, ny, nz));
                        for &j_raw in &self.buckets[key] {
                            let j = j_raw as usize;
                            if same_cell && j <= i {
                                continue;
                            }
                            if j == i {
                                continue;
                            }

                            let d = bodies[i].position - bodies[j].position;
                            let contact = bodies[i].radius() + bodies[j].radius();
                            if d.x.abs() > contact || d.y.abs() > contact || d.z.abs() > contact {
                                continue;
                            }
                            if d.length_squared() > contact * contact {
                                continue;
                            }

                            candidate_pairs += 1;
                            if !bodies[i].is_absorbed && !bodies[j].is_absorbed {
                                handle_collision(bodies, i, j, elastic);
                                resolved_pairs += 1;
                            }
                        }
                    }
                }
            }
        }

        diagnostics.collision_candidate_pairs += candidate_pairs;
        diagnostics.collisions_resolved += resolved_pairs;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector3d::Vector3D;
    use approx::assert_relative_eq;

    #[test]
    fn detects_and_resolves_an_overlapping_pair_elastically() {
        let mut bodies = vec![
            Body::new(Vector3D::ZERO, Vector3D::new(1.0, 0.0, 0.0), 1.0, 1.0).unwrap(),
            Body::new(Vector3D::new(1.5, 0.0, 0.0), Vector3D::new(-1.0, 0.0, 0.0), 1.0, 1.0).unwrap(),
        ];
        let mut grid = UniformGrid::new();
        let mut diag = StepDiagnostics::new();
        grid.resolve(&mut bodies, true, &mut diag).unwrap();

        assert!(bodies[0].velocity.x < 0.0);
        assert!(bodies[1].velocity.x > 0.0);
        assert!(diag.collision_candidate_pairs >= 1);
    }

    #[test]
    fn distant_bodies_are_not_candidates() {
        let mut bodies = vec![
            Body::new(Vector3D::ZERO, Vector3D::ZERO, 1.0, 0.1).unwrap(),
            Body::new(Vector3D::new(1000.0, 0.0, 0.0), Vector3D::ZERO, 1.0, 0.1).unwrap(),
        ];
        let mut grid = UniformGrid::new();
        let mut diag = StepDiagnostics::new();
        grid.resolve(&mut bodies, true, &mut diag).unwrap();
        assert_eq!(diag.collision_candidate_pairs, 0);
    }

    #[test]
    fn each_pair_is_only_resolved_once_per_call() {
        let mut bodies = vec![
            Body::new(Vector3D::ZERO, Vector3D::ZERO, 5.0, 1.0).unwrap(),
            Body::new(Vector3D::new(1.0, 0.0, 0.0), Vector3D::ZERO, 1.0, 1.0).unwrap(),
        ];
        let mut grid = UniformGrid::new();
        let mut diag = StepDiagnostics::new();
        grid.resolve(&mut bodies, false, &mut diag).unwrap();
        assert_relative_eq!(bodies[0].mass(), 6.0);
        assert!(bodies[1].is_absorbed);
    }

    #[test]
    fn reused_grid_clears_stale_buckets_between_calls() {
        let mut bodies = vec![
            Body::new(Vector3D::ZERO, Vector3D::new(1.0, 0.0, 0.0), 1.0, 1.0).unwrap(),
            Body::new(Vector3D::new(1.5, 0.0, 0.0), Vector3D::new(-1.0, 0.0, 0.0), 1.0, 1.0).unwrap(),
        ];
        let mut grid = UniformGrid::new();
        let mut diag = StepDiagnostics::new();
        grid.resolve(&mut bodies, true, &mut diag).unwrap();

        bodies[0].position = Vector3D::new(-500.0, -500.0, -500.0);
        bodies[1].position = Vector3D::new(500.0, 500.0, 500.0);
        let mut diag2 = StepDiagnostics::new();
        grid.resolve(&mut bodies, true, &mut diag2).unwrap();
        assert_eq!(diag2.collision_candidate_pairs, 0);
    }
}
