use crate::color::Color;
use crate::error::CoreError;
use crate::ids::next_body_id;
use crate::vector3d::Vector3D;

/// The central mutable entity of the simulation.
///
/// Invariants held at all times: `mass > 0.0` for a non-absorbed body;
/// `radius_sq == radius * radius`; `is_absorbed` never clears once set;
/// `id` never changes.
#[derive(Clone, Debug)]
pub struct Body {
    id: u64,
    pub position: Vector3D,
    pub velocity: Vector3D,
    pub acceleration: Vector3D,
    radius: f64,
    radius_sq: f64,
    mass: f64,
    pub is_absorbed: bool,
    pub color: Color,
    pub atmosphere_color: Option<Color>,
    pub atmosphere_thickness: f64,
    pub name: Option<String>,
}

impl Body {
    pub fn new(position: Vector3D, velocity: Vector3D, mass: f64, radius: f64) -> Result<Self, CoreError> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "body mass must be finite and positive, got {mass}"
            )));
        }
        if !radius.is_finite() || radius < 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "body radius must be finite and non-negative, got {radius}"
            )));
        }
        if !position.is_finite() || !velocity.is_finite() {
            return Err(CoreError::InvalidInput(
                "body position and velocity must be finite".to_string(),
            ));
        }

        Ok(Self {
            id: next_body_id(),
            position,
            velocity,
            acceleration: Vector3D::ZERO,
            radius,
            radius_sq: radius * radius,
            mass,
            is_absorbed: false,
            color: Color::OPAQUE_WHITE,
            atmosphere_color: None,
            atmosphere_thickness: 0.0,
            name: None,
        })
    }

    /// Reconstructs a body with a caller-supplied id. Used only by
    /// persistence, where the id comes from the serialized state rather than
    /// the monotonic counter. Does not advance the id counter.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: u64,
        position: Vector3D,
        velocity: Vector3D,
        mass: f64,
        radius: f64,
        color: Color,
        atmosphere_color: Option<Color>,
        atmosphere_thickness: f64,
        name: Option<String>,
    ) -> Result<Self, CoreError> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "body mass must be finite and positive, got {mass}"
            )));
        }
        if !radius.is_finite() || radius < 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "body radius must be finite and non-negative, got {radius}"
            )));
        }
        Ok(Self {
            id,
            position,
            velocity,
            acceleration: Vector3D::ZERO,
            radius,
            radius_sq: radius * radius,
            mass,
            is_absorbed: false,
            color,
            atmosphere_color,
            atmosphere_thickness,
            name,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn radius_squared(&self) -> f64 {
        self.radius_sq
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Momentum, `m * v`.
    pub fn momentum(&self) -> Vector3D {
        self.velocity * self.mass
    }

    /// Kinetic energy, `1/2 m |v|^2`.
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    /// Grows this body to absorb `other`: mass adds, radius grows so the cube
    /// of the new radius equals the sum of both radii cubed (volume
    /// conservation), and `other` is marked terminally absorbed.
    pub fn absorb(&mut self, other: &mut Body) {
        self.mass += other.mass;
        let new_radius_cubed = self.radius.powi(3) + other.radius.powi(3);
        self.radius = new_radius_cubed.cbrt();
        self.radius_sq = self.radius * self.radius;
        other.is_absorbed = true;
    }

    /// Sets the radius directly, refreshing the cached square. Used by
    /// persistence, where radius is read straight off the wire.
    pub(crate) fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
        self.radius_sq = radius * radius;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serial_test::serial;

    #[test]
    fn rejects_non_positive_mass() {
        assert!(Body::new(Vector3D::ZERO, Vector3D::ZERO, 0.0, 1.0).is_err());
        assert!(Body::new(Vector3D::ZERO, Vector3D::ZERO, -1.0, 1.0).is_err());
        assert!(Body::new(Vector3D::ZERO, Vector3D::ZERO, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn rejects_negative_radius() {
        assert!(Body::new(Vector3D::ZERO, Vector3D::ZERO, 1.0, -1.0).is_err());
    }

    #[test]
    fn radius_squared_cache_matches_radius() {
        let b = Body::new(Vector3D::ZERO, Vector3D::ZERO, 1.0, 3.0).unwrap();
        assert_relative_eq!(b.radius_squared(), b.radius() * b.radius());
    }

    #[test]
    #[serial]
    fn ids_are_stable_and_unique() {
        crate::ids::reset_body_ids();
        let a = Body::new(Vector3D::ZERO, Vector3D::ZERO, 1.0, 1.0).unwrap();
        let b = Body::new(Vector3D::ZERO, Vector3D::ZERO, 1.0, 1.0).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn absorb_conserves_volume_and_terminally_absorbs() {
        let mut a = Body::new(Vector3D::ZERO, Vector3D::ZERO, 2.0, 1.0).unwrap();
        let mut b = Body::new(Vector3D::new(1.0, 0.0, 0.0), Vector3D::ZERO, 3.0, 2.0).unwrap();
        let r_self_cubed = a.radius().powi(3);
        let r_other_cubed = b.radius().powi(3);

        a.absorb(&mut b);

        assert_relative_eq!(a.radius().powi(3), r_self_cubed + r_other_cubed, epsilon = 1e-9);
        assert_relative_eq!(a.mass(), 5.0);
        assert!(b.is_absorbed);
        assert_relative_eq!(a.radius_squared(), a.radius() * a.radius());
    }

    #[test]
    fn absorption_is_terminal() {
        let mut a = Body::new(Vector3D::ZERO, Vector3D::ZERO, 1.0, 1.0).unwrap();
        let mut b = Body::new(Vector3D::ZERO, Vector3D::ZERO, 1.0, 1.0).unwrap();
        a.absorb(&mut b);
        assert!(b.is_absorbed);
        b.velocity = Vector3D::new(1.0, 0.0, 0.0);
        assert!(b.is_absorbed);
    }
}
