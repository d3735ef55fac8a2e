use crate::body::Body;
use crate::diagnostics::StepDiagnostics;
use crate::error::CoreError;
use crate::oversamplers::{Oversampler, StepFn};
use crate::world::World;

/// Divides `target_dt` into `k` equal substeps, unconditionally.
#[derive(Debug, Clone, Copy)]
pub struct Static {
    pub k: u32,
}

impl Static {
    pub fn new(k: u32) -> Self {
        assert!(k > 0, "Static oversampler requires at least one substep");
        Self { k }
    }
}

impl Oversampler for Static {
    fn oversample(
        &self,
        _world: &World,
        bodies: &mut [Body],
        target_dt: f64,
        step_fn: &mut StepFn<'_>,
        diagnostics: &mut StepDiagnostics,
    ) -> Result<u32, CoreError> {
        let sub_dt = target_dt / self.k as f64;
        for _ in 0..self.k {
            step_fn(bodies, sub_dt)?;
            diagnostics.record_substep();
        }
        Ok(self.k)
    }
}
