use std::sync::Mutex;

use rayon::prelude::*;

use crate::body::Body;
use crate::error::CoreError;
use crate::gravity::{adaptive_theta, sample_geometry_factor, GravityBackend};
use crate::octree::{BarnesHutTree, BhRecord};

/// Barnes-Hut approximate gravity: builds one octree per call (single
/// threaded) then queries it for every body concurrently. θ is chosen
/// per-call from the population size, unless overridden.
#[derive(Debug, Default, Clone, Copy)]
pub struct BarnesHut {
    fixed_theta: Option<f64>,
}

impl BarnesHut {
    pub fn new() -> Self {
        Self { fixed_theta: None }
    }

    /// Overrides the adaptive θ schedule with a fixed value. Mainly useful
    /// for the θ=0 exactness check against `Direct`.
    pub fn with_fixed_theta(theta: f64) -> Self {
        Self { fixed_theta: Some(theta) }
    }
}

impl GravityBackend for BarnesHut {
    fn compute_accelerations(&self, bodies: &mut [Body]) -> Result<(), CoreError> {
        if bodies.is_empty() {
            return Ok(());
        }

        let records: Vec<BhRecord> = bodies
            .iter()
            .map(|b| BhRecord { position: b.position, mass: b.mass(), radius: b.radius() })
            .collect();

        let theta = self.fixed_theta.unwrap_or_else(|| {
            let positions: Vec<_> = records.iter().map(|r| r.position).collect();
            adaptive_theta(records.len(), sample_geometry_factor(&positions))
        });
        let theta_sq = theta * theta;

        let tree = BarnesHutTree::build(&records);
        let contact_pairs = Mutex::new(Vec::new());

        bodies.par_iter_mut().enumerate().for_each(|(i, body)| {
            let (acc, pairs) = tree.acceleration(i as u32, &records[i], theta_sq);
            body.acceleration = acc;
            if !pairs.is_empty() {
                contact_pairs.lock().unwrap().extend(pairs);
            }
        });

        // Insertion-time and query-time near-contact pairs exist only to
        // keep the query finite; response is entirely the uniform grid
        // resolver's job, so they're discarded here rather than surfaced.
        let _ = (tree.insertion_time_pairs(), contact_pairs.into_inner().unwrap());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector3d::Vector3D;
    use approx::assert_relative_eq;

    #[test]
    fn theta_zero_agrees_with_direct_for_small_cluster() {
        let mut a = vec![
            Body::new(Vector3D::ZERO, Vector3D::ZERO, 5.0, 0.1).unwrap(),
            Body::new(Vector3D::new(10.0, 0.0, 0.0), Vector3D::ZERO, 7.0, 0.1).unwrap(),
            Body::new(Vector3D::new(0.0, 8.0, -2.0), Vector3D::ZERO, 3.0, 0.1).unwrap(),
        ];
        let mut b = a.clone();

        BarnesHut::with_fixed_theta(0.0).compute_accelerations(&mut a).unwrap();
        crate::gravity::Direct.compute_accelerations(&mut b).unwrap();

        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(x.acceleration.x, y.acceleration.x, epsilon = 1e-9);
            assert_relative_eq!(x.acceleration.y, y.acceleration.y, epsilon = 1e-9);
            assert_relative_eq!(x.acceleration.z, y.acceleration.z, epsilon = 1e-9);
        }
    }

    #[test]
    fn empty_population_is_a_no_op() {
        let mut bodies: Vec<Body> = Vec::new();
        assert!(BarnesHut::new().compute_accelerations(&mut bodies).is_ok());
    }
}
