use crate::body::Body;
use crate::diagnostics::StepDiagnostics;
use crate::error::CoreError;
use crate::gravity::GravityBackend;
use crate::integrators::Integrator;

/// Kick-drift-kick Leapfrog: second-order accurate, time-reversible, and
/// symplectic for a fixed `sub_dt`. The default pairing with Barnes-Hut for
/// long-running scenes, where energy conservation over many steps matters
/// more than per-step accuracy.
#[derive(Debug, Default, Clone, Copy)]
pub struct Leapfrog;

impl Integrator for Leapfrog {
    fn step(
        &self,
        bodies: &mut [Body],
        sub_dt: f64,
        gravity: &dyn GravityBackend,
        diagnostics: &mut StepDiagnostics,
    ) -> Result<(), CoreError> {
        let half = sub_dt * 0.5;

        gravity.compute_accelerations(bodies)?;
        diagnostics.record_acceleration_pass();
        for body in bodies.iter_mut() {
            if !body.is_absorbed {
                body.velocity += body.acceleration * half;
                body.position += body.velocity * sub_dt;
            }
        }

        gravity.compute_accelerations(bodies)?;
        diagnostics.record_acceleration_pass();
        for body in bodies.iter_mut() {
            if !body.is_absorbed {
                body.velocity += body.acceleration * half;
            }
        }

        Ok(())
    }
}
