//! Scenario builders: seeded, reproducible population generators for tests
//! and for hosts that want a ready-made starting `World`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::body::Body;
use crate::vector3d::Vector3D;
use crate::world::World;

/// The two-body Kepler setup: a star and a planet-mass body in a circular
/// orbit, matched to Sol/Earth scale.
pub fn two_body_kepler() -> World {
    let mut world = World::new();
    world.reset();

    let star = Body::new(Vector3D::ZERO, Vector3D::ZERO, 1.989e30, 6.963e8).unwrap();
    let planet = Body::new(
        Vector3D::new(1.496e11, 0.0, 0.0),
        Vector3D::new(0.0, 2.978e4, 0.0),
        5.972e24,
        6.371e6,
    )
    .unwrap();

    world.add_body(star);
    world.add_body(planet);
    world
}

/// Two equal, unit-mass bodies approaching head-on along X, for collision
/// response tests.
pub fn head_on_pair(elastic: bool) -> World {
    let mut world = World::new();
    world.reset();
    world.elastic_collisions = elastic;

    world.add_body(Body::new(Vector3D::new(-2.0, 0.0, 0.0), Vector3D::new(1.0, 0.0, 0.0), 1.0, 1.0).unwrap());
    world.add_body(Body::new(Vector3D::new(2.0, 0.0, 0.0), Vector3D::new(-1.0, 0.0, 0.0), 1.0, 1.0).unwrap());

    world
}

/// Generates `n` bodies distributed in a uniform sphere around a massive
/// center, with tangential velocities chosen for roughly circular orbits
/// under accumulated interior mass (G implicit = 1, scale-free). Suitable
/// for cluster-stability testing at any population size.
///
/// Reproducible given the same `seed`; uses no process-global RNG state.
pub fn uniform_sphere_cluster(n: usize, seed: u64) -> World {
    let mut world = World::new();
    world.reset();
    if n == 0 {
        return world;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let inner_radius = 25.0;
    let outer_radius = (n as f64).sqrt() * 5.0;

    let center_mass = 1.0e6;
    let center = Body::new(Vector3D::ZERO, Vector3D::ZERO, center_mass, inner_radius).unwrap();
    world.add_body(center);

    let mut satellites = Vec::with_capacity(n.saturating_sub(1));
    while satellites.len() < n - 1 {
        let theta = rng.gen_range(0.0..std::f64::consts::TAU);
        let phi = rng.gen_range(-1.0..1.0f64).acos();

        let t = inner_radius / outer_radius;
        let u: f64 = rng.gen_range((t * t * t)..1.0);
        let r = outer_radius * u.cbrt();

        let (sin_phi, cos_phi) = phi.sin_cos();
        let (sin_theta, cos_theta) = theta.sin_cos();
        let pos = Vector3D::new(r * sin_phi * cos_theta, r * sin_phi * sin_theta, r * cos_phi);

        // Tangential direction in the XY plane, for a roughly orbital
        // velocity once scaled by enclosed mass below.
        let tangent = Vector3D::new(-pos.y, pos.x, 0.0).normalized().unwrap_or(Vector3D::new(0.0, 1.0, 0.0));

        let mass = 1.0;
        let radius = mass.cbrt() * 0.01;
        satellites.push((pos, tangent, mass, radius));
    }

    satellites.sort_by(|a, b| a.0.length_squared().total_cmp(&b.0.length_squared()));

    let mut enclosed_mass = center_mass;
    for (pos, tangent, mass, radius) in satellites {
        let speed = (enclosed_mass / pos.length().max(1e-6)).sqrt() * 1e-5;
        let body = Body::new(pos, tangent * speed, mass, radius).unwrap();
        world.add_body(body);
        enclosed_mass += mass;
    }

    world
}
