use log::debug;

use crate::body::Body;
use crate::diagnostics::StepDiagnostics;
use crate::error::CoreError;
use crate::oversamplers::{crossing_time, Oversampler, StepFn};
use crate::world::World;

const HARD_CYCLE_CAP: u32 = 128;

/// GADGET-style power-of-two block timestepping: bodies are binned by how
/// quickly they need to be resolved, and faster bins are integrated more
/// often within one `target_dt`.
#[derive(Debug, Clone, Copy)]
pub struct HierarchicalBlock {
    pub num_bins: u32,
    pub min_dt: f64,
    pub safety: f64,
}

impl HierarchicalBlock {
    pub fn new(num_bins: u32, min_dt: f64, safety: f64) -> Self {
        assert!(num_bins > 0, "HierarchicalBlock requires at least one bin");
        Self { num_bins, min_dt, safety }
    }
}

impl Oversampler for HierarchicalBlock {
    fn oversample(
        &self,
        _world: &World,
        bodies: &mut [Body],
        target_dt: f64,
        step_fn: &mut StepFn<'_>,
        diagnostics: &mut StepDiagnostics,
    ) -> Result<u32, CoreError> {
        if bodies.is_empty() {
            return Ok(0);
        }

        let min_required = bodies
            .iter()
            .filter(|b| !b.is_absorbed)
            .filter_map(crossing_time)
            .map(|tau| self.safety * tau)
            .fold(f64::INFINITY, f64::min);

        let mut base_dt = if min_required.is_finite() {
            min_required
        } else {
            target_dt / (1u64 << (self.num_bins - 1).min(20)) as f64
        };
        base_dt = base_dt.max(self.min_dt).min(target_dt.max(self.min_dt));
        if base_dt <= 0.0 {
            base_dt = target_dt.max(1e-12);
        }

        let max_bin = self.num_bins - 1;

        // Hard cap of 128 cycles: raise base_dt until target_dt / base_dt
        // (rounded up) fits.
        let mut total_cycles = (target_dt / base_dt).ceil().max(1.0) as u32;
        if total_cycles > HARD_CYCLE_CAP {
            base_dt = target_dt / HARD_CYCLE_CAP as f64;
            total_cycles = HARD_CYCLE_CAP;
            debug!("HierarchicalBlock raised base_dt to keep cycles within the hard cap");
        }

        let mut bins = vec![0u32; bodies.len()];
        for (i, b) in bodies.iter().enumerate() {
            if b.is_absorbed {
                continue;
            }
            bins[i] = match crossing_time(b) {
                Some(tau) => {
                    let required = self.safety * tau;
                    let ratio = (required / base_dt).max(1e-300);
                    (ratio.log2().floor().max(0.0) as u32).min(max_bin)
                }
                None => max_bin,
            };
        }

        let mut substeps = 0u32;
        let mut elapsed = 0.0;

        for cycle in 0..total_cycles {
            if elapsed >= target_dt {
                break;
            }
            for bin in 0..self.num_bins {
                if cycle % (1u32 << bin) != 0 {
                    continue;
                }
                let mut indices: Vec<usize> =
                    (0..bodies.len()).filter(|&i| !bodies[i].is_absorbed && bins[i] == bin).collect();
                if indices.is_empty() {
                    continue;
                }

                let remaining = target_dt - elapsed;
                if remaining <= 0.0 {
                    break;
                }
                let bin_dt = ((1u64 << bin) as f64 * base_dt).min(remaining);

                let mut subset: Vec<Body> = indices.iter().map(|&i| bodies[i].clone()).collect();
                step_fn(&mut subset, bin_dt)?;
                for (slot, &i) in indices.drain(..).enumerate() {
                    bodies[i] = subset[slot].clone();
                }
                diagnostics.record_substep();
                substeps += 1;
            }
            elapsed += base_dt;
        }

        Ok(substeps)
    }
}
