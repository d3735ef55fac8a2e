use log::warn;

use crate::body::Body;
use crate::diagnostics::StepDiagnostics;
use crate::error::CoreError;
use crate::oversamplers::{crossing_time, Oversampler, StepFn};
use crate::world::World;

/// Hard ceiling on substeps regardless of `max_steps * timescale`, so a
/// pathological configuration can't subdivide without bound.
const HARD_STEP_CAP: u32 = 4096;

/// Adapts substep size to the fastest-crossing body: `sub_dt` shrinks when
/// any body would cross its own diameter in less than `target_dt`.
#[derive(Debug, Clone, Copy)]
pub struct MinDiameterCrossingTime {
    pub max_steps: u32,
    pub min_dt: f64,
    pub safety: f64,
}

impl MinDiameterCrossingTime {
    pub fn new(max_steps: u32, min_dt: f64, safety: f64) -> Self {
        Self { max_steps, min_dt, safety }
    }
}

impl Oversampler for MinDiameterCrossingTime {
    fn oversample(
        &self,
        world: &World,
        bodies: &mut [Body],
        target_dt: f64,
        step_fn: &mut StepFn<'_>,
        diagnostics: &mut StepDiagnostics,
    ) -> Result<u32, CoreError> {
        let step_ceiling = ((self.max_steps as f64) * world.timescale.max(1.0)) as u32;
        let step_ceiling = step_ceiling.min(HARD_STEP_CAP).max(1);

        let mut remaining = target_dt;
        let mut steps = 0u32;

        while remaining > 0.0 && steps < step_ceiling {
            let tau = bodies
                .iter()
                .filter(|b| !b.is_absorbed)
                .filter_map(crossing_time)
                .fold(f64::INFINITY, f64::min);

            let sub_dt = if tau.is_finite() {
                (self.safety * tau).min(remaining).max(self.min_dt)
            } else {
                remaining
            };
            let sub_dt = sub_dt.min(remaining);

            step_fn(bodies, sub_dt)?;
            diagnostics.record_substep();

            remaining -= sub_dt;
            steps += 1;
        }

        if steps >= step_ceiling && remaining > 0.0 {
            warn!("MinDiameterCrossingTime hit its step ceiling ({step_ceiling}) with {remaining} remaining");
        }

        Ok(steps)
    }
}
