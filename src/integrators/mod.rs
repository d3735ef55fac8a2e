//! Time integrators: each drives one or more gravity-acceleration passes
//! and writes the resulting velocity/position update, skipping bodies
//! already marked `is_absorbed`.

mod leapfrog;
mod rk4;
mod semi_implicit;

pub use leapfrog::Leapfrog;
pub use rk4::Rk4;
pub use semi_implicit::SemiImplicit;

use crate::body::Body;
use crate::diagnostics::StepDiagnostics;
use crate::error::CoreError;
use crate::gravity::GravityBackend;

/// Advances `bodies` by `sub_dt`, recomputing acceleration via `gravity` as
/// many times as the scheme requires.
pub trait Integrator: Send + Sync {
    fn step(
        &self,
        bodies: &mut [Body],
        sub_dt: f64,
        gravity: &dyn GravityBackend,
        diagnostics: &mut StepDiagnostics,
    ) -> Result<(), CoreError>;
}
