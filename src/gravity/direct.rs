use rayon::prelude::*;

use crate::body::Body;
use crate::error::CoreError;
use crate::gravity::{GravityBackend, DISTANCE_SQ_EPSILON, G};
use crate::vector3d::Vector3D;

/// Exact O(N²) pairwise gravity. Used as the correctness baseline the
/// Barnes-Hut backend is checked against, and as the practical choice for
/// small populations where the tree's overhead isn't worth it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Direct;

impl GravityBackend for Direct {
    fn compute_accelerations(&self, bodies: &mut [Body]) -> Result<(), CoreError> {
        let snapshot: Vec<(Vector3D, f64)> = bodies.iter().map(|b| (b.position, b.mass())).collect();

        bodies.par_iter_mut().enumerate().for_each(|(i, body)| {
            let mut acc = Vector3D::ZERO;
            let (pos_i, _) = snapshot[i];
            for (j, &(pos_j, mass_j)) in snapshot.iter().enumerate() {
                if i == j {
                    continue;
                }
                let d = pos_i - pos_j;
                let r_sq = d.length_squared().max(DISTANCE_SQ_EPSILON);
                acc += d * (-G * mass_j / r_sq.powf(1.5));
            }
            body.acceleration = acc;
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn two_body_matches_newton() {
        let mut bodies = vec![
            Body::new(Vector3D::ZERO, Vector3D::ZERO, 5.0, 0.1).unwrap(),
            Body::new(Vector3D::new(10.0, 0.0, 0.0), Vector3D::ZERO, 7.0, 0.1).unwrap(),
        ];
        Direct.compute_accelerations(&mut bodies).unwrap();
        let expected = G * 7.0 / 100.0;
        assert_relative_eq!(bodies[0].acceleration.x, expected, epsilon = 1e-12);
        assert_relative_eq!(bodies[1].acceleration.x, -expected, epsilon = 1e-12);
    }

    #[test]
    fn single_body_feels_nothing() {
        let mut bodies = vec![Body::new(Vector3D::ZERO, Vector3D::ZERO, 1.0, 0.1).unwrap()];
        Direct.compute_accelerations(&mut bodies).unwrap();
        assert_eq!(bodies[0].acceleration, Vector3D::ZERO);
    }

    #[test]
    fn overwrites_rather_than_accumulates() {
        let mut bodies = vec![
            Body::new(Vector3D::ZERO, Vector3D::ZERO, 5.0, 0.1).unwrap(),
            Body::new(Vector3D::new(10.0, 0.0, 0.0), Vector3D::ZERO, 7.0, 0.1).unwrap(),
        ];
        bodies[0].acceleration = Vector3D::new(999.0, 999.0, 999.0);
        Direct.compute_accelerations(&mut bodies).unwrap();
        assert!(bodies[0].acceleration.x < 1.0);
    }
}
