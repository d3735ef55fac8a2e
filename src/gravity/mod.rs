//! Pluggable gravity backends: the common contract is "write each
//! non-absorbed body's acceleration field", computed either exactly
//! (`Direct`) or approximately (`BarnesHut`).

mod barnes_hut;
mod direct;

pub use barnes_hut::BarnesHut;
pub use direct::Direct;

use crate::body::Body;
use crate::error::CoreError;

/// Newton's gravitational constant, SI units.
pub const G: f64 = 6.67430e-11;

/// Singular-distance clamp applied when two bodies are found overlapping
/// mid-query.
pub const DISTANCE_EPSILON: f64 = 1e-10;

/// Floor applied to squared distances before dividing by them.
pub const DISTANCE_SQ_EPSILON: f64 = 1e-24;

/// Computes and writes gravitational acceleration for every body.
///
/// Implementations overwrite `Body::acceleration`; they never accumulate
/// onto whatever was there before the call.
pub trait GravityBackend: Send + Sync {
    fn compute_accelerations(&self, bodies: &mut [Body]) -> Result<(), CoreError>;
}

/// The opening angle θ used by `BarnesHut`, chosen adaptively from
/// population size and a mild geometry factor.
///
/// - N ≤ 3: effectively exact (θ = 0).
/// - 4..=10: θ = 0.1. 11..=50: θ = 0.2.
/// - N > 50: `clamp(0.62 + 0.22 log10 N, 0.6, 1.2)`, scaled by a geometry
///   factor in `[0.9, 1.1]` derived from how tightly packed the first few
///   bodies are relative to the overall extent.
pub fn adaptive_theta(population: usize, geometry_factor: f64) -> f64 {
    let theta = match population {
        0..=3 => 0.0,
        4..=10 => 0.1,
        11..=50 => 0.2,
        n => {
            let raw = 0.62 + 0.22 * (n as f64).log10();
            raw.clamp(0.6, 1.2)
        }
    };
    if population > 50 {
        theta * geometry_factor.clamp(0.9, 1.1)
    } else {
        theta
    }
}

/// Geometry factor input to [`adaptive_theta`]: ratio of the smallest
/// pairwise separation among a small sample of bodies to the overall box
/// extent, mapped into `[0.9, 1.1]`. A small ratio (tightly clustered
/// sample against a large box) nudges θ down for more accuracy; a ratio
/// near 1 leaves it unchanged.
pub fn sample_geometry_factor(positions: &[crate::vector3d::Vector3D]) -> f64 {
    const SAMPLE: usize = 8;
    if positions.len() < 2 {
        return 1.0;
    }
    let sample = &positions[..positions.len().min(SAMPLE)];

    let mut min_sep = f64::MAX;
    for i in 0..sample.len() {
        for j in (i + 1)..sample.len() {
            let d = (sample[i] - sample[j]).length();
            if d < min_sep {
                min_sep = d;
            }
        }
    }
    if !min_sep.is_finite() {
        return 1.0;
    }

    let mut min_p = positions[0];
    let mut max_p = positions[0];
    for p in positions {
        min_p = min_p.min(*p);
        max_p = max_p.max(*p);
    }
    let extent = (max_p - min_p).length().max(1e-9);

    let ratio = (min_sep / extent).clamp(0.0, 1.0);
    // Map [0, 1] onto [0.9, 1.1]: a vanishingly small ratio (tight cluster
    // in a huge box) pulls the factor toward 0.9.
    0.9 + 0.2 * ratio
}
