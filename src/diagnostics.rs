use log::debug;

/// Per-`simulate`-call counters, accumulated across every oversampler
/// substep. Cheap to construct; meant to be logged at `debug` level by the
/// caller and otherwise ignored.
#[derive(Clone, Debug, Default)]
pub struct StepDiagnostics {
    pub substeps: u32,
    pub acceleration_passes: u32,
    pub collision_candidate_pairs: u64,
    pub collisions_resolved: u64,
    pub bodies_absorbed: u64,
    pub bodies_reflected: u64,
}

impl StepDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_acceleration_pass(&mut self) {
        self.acceleration_passes += 1;
    }

    pub(crate) fn record_substep(&mut self) {
        self.substeps += 1;
    }

    /// Emits a single `debug` log line summarizing the step. Called by the
    /// engine once per `simulate`; never emitted by pipeline stages
    /// themselves so logging stays at one call site.
    pub fn log_summary(&self) {
        debug!(
            "step: {} substep(s), {} acceleration pass(es), {} collision candidate(s), \
             {} resolved, {} absorbed, {} reflected",
            self.substeps,
            self.acceleration_passes,
            self.collision_candidate_pairs,
            self.collisions_resolved,
            self.bodies_absorbed,
            self.bodies_reflected
        );
    }
}
