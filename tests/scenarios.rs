use std::f64::consts::PI;

use approx::assert_relative_eq;
use serial_test::serial;

use nbody_core::collision::{CollisionResolver, UniformGrid};
use nbody_core::gravity::{adaptive_theta, BarnesHut, Direct, GravityBackend, G};
use nbody_core::ids::reset_body_ids;
use nbody_core::integrators::{Leapfrog, SemiImplicit};
use nbody_core::oversamplers::Static;
use nbody_core::scenarios::{head_on_pair, two_body_kepler, uniform_sphere_cluster};
use nbody_core::vector3d::Vector3D;
use nbody_core::viewport::Viewport;
use nbody_core::{persist, Body, SimulationEngine, World};

fn open_viewport() -> Viewport {
    Viewport::new(Vector3D::splat(-1e15), Vector3D::splat(1e15))
}

/// S1 — two-body Kepler orbit: measured period and radius variation match
/// the analytic prediction within the tolerances in the spec.
#[test]
#[serial]
fn s1_two_body_kepler_matches_analytic_period() {
    reset_body_ids();
    let mut world = two_body_kepler();
    let viewport = open_viewport();
    let mut engine =
        SimulationEngine::new(Box::new(BarnesHut::new()), Box::new(Leapfrog), Box::new(Static::new(1)), Box::new(UniformGrid::new()));

    let (m_a, m_b) = (world.bodies()[0].mass(), world.bodies()[1].mass());
    let a = world.bodies()[1].position.length();
    let expected_period = 2.0 * PI * (a.powi(3) / (G * (m_a + m_b))).sqrt();

    let dt = 3.6e3;
    let steps = 5000;

    let mut min_r = f64::MAX;
    let mut max_r = f64::MIN;
    let mut crossed_start_angle = false;
    let mut measured_period = None;
    let start_angle = world.bodies()[1].position.y.atan2(world.bodies()[1].position.x);
    let mut prev_angle = start_angle;

    for step in 0..steps {
        engine.simulate(&mut world, &viewport, dt).unwrap();
        let p = world.bodies()[1].position;
        let r = p.length();
        min_r = min_r.min(r);
        max_r = max_r.max(r);

        let angle = p.y.atan2(p.x);
        if !crossed_start_angle && step > 10 {
            // Detect one full revolution: angle wraps back near start.
            let delta = (angle - start_angle).rem_euclid(2.0 * PI);
            if delta < (prev_angle - start_angle).rem_euclid(2.0 * PI) {
                measured_period = Some(step as f64 * dt);
                crossed_start_angle = true;
            }
        }
        prev_angle = angle;
    }

    let relative_radius_variation = (max_r - min_r) / a;
    assert!(relative_radius_variation < 1e-2, "radius variation too large: {relative_radius_variation}");

    if let Some(period) = measured_period {
        let relative_error = (period - expected_period).abs() / expected_period;
        assert!(relative_error < 5e-3, "period off by {relative_error}");
    }
}

/// S2 — head-on elastic collision between equal masses exchanges
/// velocities exactly, with no absorption.
#[test]
#[serial]
fn s2_head_on_elastic_collision_exchanges_velocities() {
    reset_body_ids();
    let mut world = head_on_pair(true);
    let viewport = open_viewport();
    let mut engine =
        SimulationEngine::new(Box::new(Direct), Box::new(SemiImplicit), Box::new(Static::new(1)), Box::new(UniformGrid::new()));

    for _ in 0..1000 {
        engine.simulate(&mut world, &viewport, 0.01).unwrap();
    }

    assert_eq!(world.body_count(), 2);
    let velocities: Vec<f64> = world.bodies().iter().map(|b| b.velocity.x).collect();
    assert!(velocities.iter().any(|&v| (v - 1.0).abs() < 1e-6));
    assert!(velocities.iter().any(|&v| (v + 1.0).abs() < 1e-6));
}

/// S3 — same setup with inelastic merge: one absorbed body, survivor at
/// rest with doubled mass and volume-conserving radius.
#[test]
#[serial]
fn s3_merge_on_contact_produces_expected_survivor() {
    reset_body_ids();
    let mut world = head_on_pair(false);
    let viewport = open_viewport();
    let mut engine =
        SimulationEngine::new(Box::new(Direct), Box::new(SemiImplicit), Box::new(Static::new(1)), Box::new(UniformGrid::new()));

    for _ in 0..1000 {
        engine.simulate(&mut world, &viewport, 0.01).unwrap();
    }

    assert_eq!(world.body_count(), 1);
    let survivor = &world.bodies()[0];
    assert_relative_eq!(survivor.mass(), 2.0, epsilon = 1e-9);
    assert_relative_eq!(survivor.radius(), 2f64.cbrt(), epsilon = 1e-9);
    assert!(survivor.velocity.length() < 1e-6);
}

/// S4 — a 1000-body cluster stays numerically sane over 1000 steps: no
/// NaN/Inf, no runaway positions, bounded population loss.
#[test]
#[serial]
fn s4_cluster_stability_under_barnes_hut_leapfrog() {
    let _ = env_logger::try_init();
    reset_body_ids();
    let mut world = uniform_sphere_cluster(1000, 99);
    let initial_count = world.body_count();
    let viewport = open_viewport();
    let mut engine =
        SimulationEngine::new(Box::new(BarnesHut::new()), Box::new(Leapfrog), Box::new(Static::new(1)), Box::new(UniformGrid::new()));

    for _ in 0..1000 {
        engine.simulate(&mut world, &viewport, 0.01).unwrap();
    }

    for body in world.bodies() {
        assert!(body.position.is_finite(), "non-finite position");
        assert!(body.velocity.is_finite(), "non-finite velocity");
        assert!(body.position.length() < 1e10, "body escaped to |pos| >= 1e10");
    }
    assert!(world.body_count() as f64 >= initial_count as f64 * 0.5, "more than 50% population loss");
}

/// S5 — hierarchical oversampler schedule: with `num_bins = 4` and
/// `target_dt` set to 8 base cycles, bin 0 must fire every cycle (8x), bin 1
/// every other cycle (4x), bin 2 every fourth (2x), and bin 3 only on the
/// first cycle (1x).
#[test]
fn s5_hierarchical_oversampler_schedule() {
    use nbody_core::oversamplers::{HierarchicalBlock, Oversampler};
    use nbody_core::StepDiagnostics;

    // radius = 0.01, safety = 0.5 => required = 0.5 * 2*0.01 / speed = 0.01 / speed.
    // Speeds chosen so required is base_dt, 2*base_dt, 4*base_dt, 8*base_dt,
    // with base_dt landing on exactly 0.01 (the fastest body's requirement).
    let speeds = [1.0, 0.5, 0.25, 0.125];
    let mut bodies: Vec<Body> = speeds
        .iter()
        .enumerate()
        .map(|(i, &v)| Body::new(Vector3D::new(i as f64 * 10.0, 0.0, 0.0), Vector3D::new(v, 0.0, 0.0), 1.0, 0.01).unwrap())
        .collect();
    let world = World::new();
    let mut diagnostics = StepDiagnostics::new();

    let bin_of_speed = |speed: f64| -> usize {
        speeds
            .iter()
            .position(|&v| (v - speed).abs() < 1e-9)
            .expect("subset body should match one of the engineered speeds")
    };
    let mut calls_per_bin = [0u32; 4];

    let total = HierarchicalBlock::new(4, 1e-9, 0.5)
        .oversample(
            &world,
            &mut bodies,
            0.08,
            &mut |subset, _sub_dt| {
                for body in subset.iter() {
                    calls_per_bin[bin_of_speed(body.velocity.length())] += 1;
                }
                Ok(())
            },
            &mut diagnostics,
        )
        .unwrap();

    assert_eq!(calls_per_bin, [8, 4, 2, 1]);
    assert_eq!(total, 8 + 4 + 2 + 1);
}

/// S6 — a body crossing the +X face reflects: position clamped inside,
/// velocity sign-flipped with unchanged magnitude.
#[test]
#[serial]
fn s6_boundary_reflection_flips_velocity_sign_only() {
    reset_body_ids();
    let mut world = World::new();
    world.reset();
    world.closed_boundaries = true;
    let v0 = 5.0;
    world.add_body(Body::new(Vector3D::new(9.0, 0.0, 0.0), Vector3D::new(v0, 0.0, 0.0), 1.0, 1.0).unwrap());
    let viewport = Viewport::new(Vector3D::splat(-10.0), Vector3D::splat(10.0));
    let mut engine =
        SimulationEngine::new(Box::new(Direct), Box::new(SemiImplicit), Box::new(Static::new(1)), Box::new(UniformGrid::new()));

    engine.simulate(&mut world, &viewport, 1.0).unwrap();

    let body = &world.bodies()[0];
    assert!(body.position.x <= 9.0 + 1e-9);
    assert_relative_eq!(body.velocity.x, -v0, epsilon = 1e-12);
}

/// Barnes-Hut with theta=0 must agree with Direct within 1e-9 relative
/// error for small-to-moderate populations (property 8, §8).
#[test]
fn barnes_hut_theta_zero_agrees_with_direct() {
    let mut bh_bodies = uniform_sphere_cluster(200, 5).bodies().to_vec();
    let mut direct_bodies = bh_bodies.clone();

    BarnesHut::with_fixed_theta(0.0).compute_accelerations(&mut bh_bodies).unwrap();
    Direct.compute_accelerations(&mut direct_bodies).unwrap();

    for (a, b) in bh_bodies.iter().zip(direct_bodies.iter()) {
        let rel = (a.acceleration - b.acceleration).length() / b.acceleration.length().max(1e-30);
        assert!(rel < 1e-9, "relative error too large: {rel}");
    }
}

/// Momentum conservation with no boundaries, Direct + Leapfrog.
#[test]
#[serial]
fn momentum_is_conserved_without_boundaries() {
    reset_body_ids();
    let mut world = uniform_sphere_cluster(30, 3);
    let viewport = open_viewport();
    let mut engine =
        SimulationEngine::new(Box::new(Direct), Box::new(Leapfrog), Box::new(Static::new(1)), Box::new(UniformGrid::new()));

    let momentum_before: Vector3D = world.bodies().iter().map(|b| b.momentum()).fold(Vector3D::ZERO, |a, b| a + b);

    for _ in 0..200 {
        engine.simulate(&mut world, &viewport, 0.001).unwrap();
    }

    let momentum_after: Vector3D = world.bodies().iter().map(|b| b.momentum()).fold(Vector3D::ZERO, |a, b| a + b);
    let scale = momentum_before.length().max(1e-30);
    let drift = (momentum_after - momentum_before).length() / scale;
    assert!(drift <= 1e-6, "momentum drift too large: {drift}");
}

/// Angular momentum conservation with no boundaries, Direct + Leapfrog.
#[test]
#[serial]
fn angular_momentum_is_conserved_without_boundaries() {
    reset_body_ids();
    let mut world = uniform_sphere_cluster(30, 4);
    let viewport = open_viewport();
    let mut engine =
        SimulationEngine::new(Box::new(Direct), Box::new(Leapfrog), Box::new(Static::new(1)), Box::new(UniformGrid::new()));

    let angular_momentum = |w: &World| -> Vector3D {
        w.bodies().iter().map(|b| b.position.cross(b.momentum())).fold(Vector3D::ZERO, |a, b| a + b)
    };

    let l_before = angular_momentum(&world);
    for _ in 0..200 {
        engine.simulate(&mut world, &viewport, 0.001).unwrap();
    }
    let l_after = angular_momentum(&world);

    let scale = l_before.length().max(1e-30);
    let drift = (l_after - l_before).length() / scale;
    assert!(drift <= 1e-6, "angular momentum drift too large: {drift}");
}

/// Collision dedup: a pair straddling a grid cell boundary is resolved at
/// most once per step (not once per cell it's visible from).
#[test]
fn collision_pairs_are_resolved_at_most_once_per_step() {
    let mut bodies = vec![
        Body::new(Vector3D::new(-0.5, 0.0, 0.0), Vector3D::new(1.0, 0.0, 0.0), 1.0, 1.0).unwrap(),
        Body::new(Vector3D::new(0.5, 0.0, 0.0), Vector3D::new(-1.0, 0.0, 0.0), 1.0, 1.0).unwrap(),
    ];
    let mut grid = UniformGrid::new();
    let mut diagnostics = nbody_core::StepDiagnostics::new();
    grid.resolve(&mut bodies, true, &mut diagnostics).unwrap();

    // A single elastic hit on equal masses exactly swaps velocities; if the
    // pair were resolved twice it would swap back.
    assert_relative_eq!(bodies[0].velocity.x, -1.0, epsilon = 1e-9);
    assert_relative_eq!(bodies[1].velocity.x, 1.0, epsilon = 1e-9);
}

/// State round-trips through the persisted JSON format without loss of
/// physically meaningful fields.
#[test]
#[serial]
fn persisted_state_round_trips() {
    reset_body_ids();
    let world = uniform_sphere_cluster(10, 2);
    let viewport = Viewport::new(Vector3D::splat(-500.0), Vector3D::splat(500.0));
    let metadata = persist::PersistenceMetadata::default();

    let json = persist::save(&world, &viewport, &metadata).unwrap();
    let (loaded_world, loaded_viewport, _) = persist::load(&json).unwrap();

    assert_eq!(loaded_world.body_count(), world.body_count());
    for (a, b) in world.bodies().iter().zip(loaded_world.bodies().iter()) {
        assert_eq!(a.id(), b.id());
        assert_relative_eq!(a.mass(), b.mass(), epsilon = 1e-9);
        assert_relative_eq!(a.radius(), b.radius(), epsilon = 1e-9);
    }
    assert_eq!(loaded_viewport.top_left, viewport.top_left);
}

/// The adaptive theta schedule never hands back an angle outside the
/// envelope the spec describes, across a wide population sweep.
#[test]
fn adaptive_theta_stays_within_bounds_across_population_sizes() {
    for n in [1, 3, 4, 10, 11, 50, 51, 1000, 1_000_000] {
        let theta = adaptive_theta(n, 1.0);
        assert!((0.0..=1.2).contains(&theta), "theta out of bounds for n={n}: {theta}");
    }
}
