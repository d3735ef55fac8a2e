use crate::body::Body;
use crate::diagnostics::StepDiagnostics;
use crate::error::CoreError;
use crate::gravity::GravityBackend;
use crate::integrators::Integrator;

/// Symplectic (semi-implicit) Euler: update velocity from the current
/// acceleration, then advance position with the *new* velocity. Cheapest
/// integrator; good energy behavior for a single substep compared to
/// explicit Euler, but less accurate than Leapfrog over long runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SemiImplicit;

impl Integrator for SemiImplicit {
    fn step(
        &self,
        bodies: &mut [Body],
        sub_dt: f64,
        gravity: &dyn GravityBackend,
        diagnostics: &mut StepDiagnostics,
    ) -> Result<(), CoreError> {
        gravity.compute_accelerations(bodies)?;
        diagnostics.record_acceleration_pass();

        for body in bodies.iter_mut() {
            if body.is_absorbed {
                continue;
            }
            body.velocity += body.acceleration * sub_dt;
            body.position += body.velocity * sub_dt;
        }

        Ok(())
    }
}
