use crate::body::Body;
use crate::diagnostics::StepDiagnostics;
use crate::error::CoreError;
use crate::gravity::GravityBackend;
use crate::integrators::Integrator;
use crate::scratch::{release_vector_buffer, rent_vector_buffer};
use crate::vector3d::Vector3D;

/// Classical four-stage Runge-Kutta over each body's `(position, velocity)`
/// state. More accurate per step than Leapfrog at the cost of four
/// acceleration passes instead of two; all intermediate slots are rented
/// from a pooled allocator and returned before the call exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct Rk4;

/// Holds the ten rented scratch buffers for one `Rk4::step` call and
/// returns all of them to the pool on drop, so a `?` early-return from a
/// fallible gravity backend can never leak a rented buffer.
struct Scratch {
    pos0: Vec<Vector3D>,
    vel0: Vec<Vector3D>,
    k1_pos: Vec<Vector3D>,
    k1_vel: Vec<Vector3D>,
    k2_pos: Vec<Vector3D>,
    k2_vel: Vec<Vector3D>,
    k3_pos: Vec<Vector3D>,
    k3_vel: Vec<Vector3D>,
    k4_pos: Vec<Vector3D>,
    k4_vel: Vec<Vector3D>,
}

impl Scratch {
    fn rent(n: usize) -> Self {
        Self {
            pos0: rent_vector_buffer(n),
            vel0: rent_vector_buffer(n),
            k1_pos: rent_vector_buffer(n),
            k1_vel: rent_vector_buffer(n),
            k2_pos: rent_vector_buffer(n),
            k2_vel: rent_vector_buffer(n),
            k3_pos: rent_vector_buffer(n),
            k3_vel: rent_vector_buffer(n),
            k4_pos: rent_vector_buffer(n),
            k4_vel: rent_vector_buffer(n),
        }
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        release_vector_buffer(std::mem::take(&mut self.pos0));
        release_vector_buffer(std::mem::take(&mut self.vel0));
        release_vector_buffer(std::mem::take(&mut self.k1_pos));
        release_vector_buffer(std::mem::take(&mut self.k1_vel));
        release_vector_buffer(std::mem::take(&mut self.k2_pos));
        release_vector_buffer(std::mem::take(&mut self.k2_vel));
        release_vector_buffer(std::mem::take(&mut self.k3_pos));
        release_vector_buffer(std::mem::take(&mut self.k3_vel));
        release_vector_buffer(std::mem::take(&mut self.k4_pos));
        release_vector_buffer(std::mem::take(&mut self.k4_vel));
    }
}

impl Integrator for Rk4 {
    fn step(
        &self,
        bodies: &mut [Body],
        sub_dt: f64,
        gravity: &dyn GravityBackend,
        diagnostics: &mut StepDiagnostics,
    ) -> Result<(), CoreError> {
        let n = bodies.len();
        let mut scratch = Scratch::rent(n);
        let Scratch {
            pos0,
            vel0,
            k1_pos,
            k1_vel,
            k2_pos,
            k2_vel,
            k3_pos,
            k3_vel,
            k4_pos,
            k4_vel,
        } = &mut scratch;

        for (i, b) in bodies.iter().enumerate() {
            pos0[i] = b.position;
            vel0[i] = b.velocity;
        }

        // Stage 1: acceleration at t.
        gravity.compute_accelerations(bodies)?;
        diagnostics.record_acceleration_pass();
        for (i, b) in bodies.iter().enumerate() {
            k1_vel[i] = b.acceleration;
            k1_pos[i] = vel0[i];
        }

        // Stage 2: acceleration at t + dt/2, using stage 1's slope.
        for (i, b) in bodies.iter_mut().enumerate() {
            if !b.is_absorbed {
                b.position = pos0[i] + k1_pos[i] * (sub_dt * 0.5);
                b.velocity = vel0[i] + k1_vel[i] * (sub_dt * 0.5);
            }
        }
        gravity.compute_accelerations(bodies)?;
        diagnostics.record_acceleration_pass();
        for (i, b) in bodies.iter().enumerate() {
            k2_vel[i] = b.acceleration;
            k2_pos[i] = b.velocity;
        }

        // Stage 3: acceleration at t + dt/2, using stage 2's slope.
        for (i, b) in bodies.iter_mut().enumerate() {
            if !b.is_absorbed {
                b.position = pos0[i] + k2_pos[i] * (sub_dt * 0.5);
                b.velocity = vel0[i] + k2_vel[i] * (sub_dt * 0.5);
            }
        }
        gravity.compute_accelerations(bodies)?;
        diagnostics.record_acceleration_pass();
        for (i, b) in bodies.iter().enumerate() {
            k3_vel[i] = b.acceleration;
            k3_pos[i] = b.velocity;
        }

        // Stage 4: acceleration at t + dt, using stage 3's slope.
        for (i, b) in bodies.iter_mut().enumerate() {
            if !b.is_absorbed {
                b.position = pos0[i] + k3_pos[i] * sub_dt;
                b.velocity = vel0[i] + k3_vel[i] * sub_dt;
            }
        }
        gravity.compute_accelerations(bodies)?;
        diagnostics.record_acceleration_pass();
        for (i, b) in bodies.iter().enumerate() {
            k4_vel[i] = b.acceleration;
            k4_pos[i] = b.velocity;
        }

        let sixth = sub_dt / 6.0;
        for (i, b) in bodies.iter_mut().enumerate() {
            if b.is_absorbed {
                continue;
            }
            let pos_slope: Vector3D = k1_pos[i] + k2_pos[i] * 2.0 + k3_pos[i] * 2.0 + k4_pos[i];
            let vel_slope: Vector3D = k1_vel[i] + k2_vel[i] * 2.0 + k3_vel[i] * 2.0 + k4_vel[i];
            b.position = pos0[i] + pos_slope * sixth;
            b.velocity = vel0[i] + vel_slope * sixth;
        }

        Ok(())
    }
}
