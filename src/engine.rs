//! The `SimulationEngine`: wires a gravity backend, integrator,
//! oversampler, and collision resolver into the single `simulate`
//! operation the rest of the core exists to support.

use log::debug;

use crate::collision::CollisionResolver;
use crate::diagnostics::StepDiagnostics;
use crate::error::CoreError;
use crate::gravity::GravityBackend;
use crate::integrators::Integrator;
use crate::oversamplers::Oversampler;
use crate::viewport::Viewport;
use crate::world::World;

/// One configured pipeline. Every stage is a trait object so the host can
/// mix and match backends (e.g. Direct+SemiImplicit for small, exact
/// scenes; BarnesHut+Leapfrog for large, long-running ones) without the
/// engine itself knowing which.
pub struct SimulationEngine {
    gravity: Box<dyn GravityBackend>,
    integrator: Box<dyn Integrator>,
    oversampler: Box<dyn Oversampler>,
    collision: Box<dyn CollisionResolver>,
}

impl SimulationEngine {
    pub fn new(
        gravity: Box<dyn GravityBackend>,
        integrator: Box<dyn Integrator>,
        oversampler: Box<dyn Oversampler>,
        collision: Box<dyn CollisionResolver>,
    ) -> Self {
        Self { gravity, integrator, oversampler, collision }
    }

    /// Advances `world` by `dt` simulated seconds: oversample into
    /// integrator substeps, resolve collisions, drop absorbed bodies, and
    /// (if `world.closed_boundaries`) reflect survivors off the viewport
    /// box. Returns per-call diagnostics.
    pub fn simulate(&mut self, world: &mut World, viewport: &Viewport, dt: f64) -> Result<StepDiagnostics, CoreError> {
        let mut diagnostics = StepDiagnostics::new();

        let mut active = world.bodies().to_vec();

        let gravity = self.gravity.as_ref();
        let integrator = self.integrator.as_ref();
        let accel_passes = std::cell::Cell::new(0u32);
        self.oversampler.oversample(
            world,
            &mut active,
            dt,
            &mut |subset, sub_dt| {
                let mut substep_diag = StepDiagnostics::new();
                integrator.step(subset, sub_dt, gravity, &mut substep_diag)?;
                accel_passes.set(accel_passes.get() + substep_diag.acceleration_passes);
                Ok(())
            },
            &mut diagnostics,
        )?;
        diagnostics.acceleration_passes += accel_passes.get();

        self.collision.resolve(&mut active, world.elastic_collisions, &mut diagnostics)?;

        *world.bodies_mut() = active;

        let absorbed_ids: std::collections::HashSet<u64> =
            world.bodies().iter().filter(|b| b.is_absorbed).map(|b| b.id()).collect();
        diagnostics.bodies_absorbed += absorbed_ids.len() as u64;
        world.remove_bodies(&absorbed_ids);

        if world.closed_boundaries {
            diagnostics.bodies_reflected += reflect_off_walls(world, viewport);
        }

        diagnostics.log_summary();
        Ok(diagnostics)
    }
}

/// Reflects every surviving body off the six faces of `viewport`'s box,
/// clamping position to the wall and flipping the crossed velocity
/// component. Independent per axis/face, so a body in a corner bounces off
/// both faces in the same pass.
fn reflect_off_walls(world: &mut World, viewport: &Viewport) -> u64 {
    let mut reflected = 0u64;
    for body in world.bodies_mut().iter_mut() {
        let r = body.radius();
        let mut hit = false;

        if body.position.x < viewport.top_left.x + r {
            body.position.x = viewport.top_left.x + r;
            body.velocity.x = -body.velocity.x;
            hit = true;
        } else if body.position.x > viewport.bottom_right.x - r {
            body.position.x = viewport.bottom_right.x - r;
            body.velocity.x = -body.velocity.x;
            hit = true;
        }

        if body.position.y < viewport.top_left.y + r {
            body.position.y = viewport.top_left.y + r;
            body.velocity.y = -body.velocity.y;
            hit = true;
        } else if body.position.y > viewport.bottom_right.y - r {
            body.position.y = viewport.bottom_right.y - r;
            body.velocity.y = -body.velocity.y;
            hit = true;
        }

        if body.position.z < viewport.top_left.z + r {
            body.position.z = viewport.top_left.z + r;
            body.velocity.z = -body.velocity.z;
            hit = true;
        } else if body.position.z > viewport.bottom_right.z - r {
            body.position.z = viewport.bottom_right.z - r;
            body.velocity.z = -body.velocity.z;
            hit = true;
        }

        if hit {
            reflected += 1;
        }
    }
    debug!("reflected {reflected} body(ies) off viewport boundaries");
    reflected
}
