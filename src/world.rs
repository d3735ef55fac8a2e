use std::collections::HashSet;

use log::info;

use crate::body::Body;
use crate::ids::reset_body_ids;

/// Owns the simulation's population and its global flags. `World` exclusively
/// owns its bodies; the pipeline only ever borrows them, for the duration of
/// one `simulate` call.
#[derive(Clone, Debug, Default)]
pub struct World {
    bodies: Vec<Body>,
    pub elastic_collisions: bool,
    pub closed_boundaries: bool,
    /// Multiplicative factor from wall-clock time to simulation time.
    pub timescale: f64,
}

impl World {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            elastic_collisions: true,
            closed_boundaries: false,
            timescale: 1.0,
        }
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub(crate) fn bodies_mut(&mut self) -> &mut Vec<Body> {
        &mut self.bodies
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Appends a body, preserving insertion order.
    pub fn add_body(&mut self, body: Body) {
        self.bodies.push(body);
    }

    /// Removes every body whose id is in `ids`. Insertion order of the
    /// survivors is preserved.
    pub fn remove_bodies(&mut self, ids: &HashSet<u64>) {
        self.bodies.retain(|b| !ids.contains(&b.id()));
    }

    /// Empties the world and resets the monotonic body-id counter.
    pub fn reset(&mut self) {
        self.bodies.clear();
        reset_body_ids();
        info!("world reset: population cleared, body id counter restarted");
    }
}
