//! Collision detection and response: a uniform spatial hash finds
//! candidate pairs, then [`handle_collision`] resolves each one.

mod grid;

pub use grid::UniformGrid;

use crate::body::Body;
use crate::diagnostics::StepDiagnostics;
use crate::error::CoreError;

/// Finds and resolves all colliding pairs among `bodies` for one
/// `simulate` call.
pub trait CollisionResolver: Send + Sync {
    fn resolve(&mut self, bodies: &mut [Body], elastic: bool, diagnostics: &mut StepDiagnostics) -> Result<(), CoreError>;
}

/// Resolves one candidate pair. Absorbed bodies are a no-op; a pair found
/// to no longer be overlapping (a stale candidate) is also a no-op.
///
/// Elastic response applies the standard normal impulse and never
/// separates overlapping bodies — separating them would add potential
/// energy without removing kinetic energy. Inelastic response merges the
/// lighter body into the heavier one (ties go to `b1`).
pub(crate) fn handle_collision(bodies: &mut [Body], i: usize, j: usize, elastic: bool) {
    if bodies[i].is_absorbed || bodies[j].is_absorbed {
        return;
    }

    let d = bodies[i].position - bodies[j].position;
    let contact = bodies[i].radius() + bodies[j].radius();
    if d.length_squared() >= contact * contact {
        return;
    }

    let r = d.length().max(1e-10);
    let normal = d / r;

    if elastic {
        let v_rel = bodies[i].velocity - bodies[j].velocity;
        let v_rel_n = v_rel.dot(normal);
        if v_rel_n >= 0.0 {
            return;
        }
        let inv_mass_sum = 1.0 / bodies[i].mass() + 1.0 / bodies[j].mass();
        let impulse = -2.0 * v_rel_n / inv_mass_sum;
        bodies[i].velocity += normal * (impulse / bodies[i].mass());
        bodies[j].velocity -= normal * (impulse / bodies[j].mass());
    } else {
        let (mi, mj) = (bodies[i].mass(), bodies[j].mass());
        let merged_velocity = (bodies[i].velocity * mi + bodies[j].velocity * mj) / (mi + mj);
        let absorber_idx = if mi >= mj { i } else { j };
        let absorbed_idx = if mi >= mj { j } else { i };

        let lo = absorber_idx.min(absorbed_idx);
        let hi = absorber_idx.max(absorbed_idx);
        let (left, right) = bodies.split_at_mut(hi);
        let (absorber, absorbed) = if absorber_idx == lo {
            (&mut left[lo], &mut right[0])
        } else {
            (&mut right[0], &mut left[lo])
        };
        absorber.velocity = merged_velocity;
        absorber.absorb(absorbed);
    }
}
