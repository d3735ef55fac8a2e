//! Oversamplers decide how to subdivide one engine tick (`target_dt`) into
//! one or more integrator substeps.

mod hierarchical_block;
mod min_diameter_crossing_time;
mod static_sampler;

pub use hierarchical_block::HierarchicalBlock;
pub use min_diameter_crossing_time::MinDiameterCrossingTime;
pub use static_sampler::Static;

use crate::body::Body;
use crate::diagnostics::StepDiagnostics;
use crate::error::CoreError;
use crate::world::World;

/// One integrator substep over a body subset, bound to whichever
/// integrator and gravity backend the engine is configured with.
pub type StepFn<'a> = dyn FnMut(&mut [Body], f64) -> Result<(), CoreError> + 'a;

/// Subdivides `target_dt` and drives `step_fn` across the chosen substeps,
/// returning the number of substeps taken.
pub trait Oversampler: Send + Sync {
    fn oversample(
        &self,
        world: &World,
        bodies: &mut [Body],
        target_dt: f64,
        step_fn: &mut StepFn<'_>,
        diagnostics: &mut StepDiagnostics,
    ) -> Result<u32, CoreError>;
}

/// `2r / |v|`: the time for a body to cross its own diameter at its
/// current speed, or `None` if the body has zero radius or zero speed.
pub(crate) fn crossing_time(body: &Body) -> Option<f64> {
    let speed = body.velocity.length();
    if body.radius() <= 0.0 || speed <= 0.0 {
        None
    } else {
        Some(2.0 * body.radius() / speed)
    }
}
