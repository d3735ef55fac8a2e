use std::sync::{Mutex, OnceLock};

use crate::vector3d::Vector3D;

/// Cap on retired scratch buffers kept around for reuse by RK4. Smaller
/// than the octree node pool since RK4 rents many short-lived buffers per
/// call rather than one long-lived arena.
const POOL_CAPACITY: usize = 128;

fn pool() -> &'static Mutex<Vec<Vec<Vector3D>>> {
    static POOL: OnceLock<Mutex<Vec<Vec<Vector3D>>>> = OnceLock::new();
    POOL.get_or_init(|| Mutex::new(Vec::with_capacity(POOL_CAPACITY)))
}

/// Rents a zeroed `Vec<Vector3D>` of at least `len` capacity, reusing a
/// retired buffer when one is available.
pub(crate) fn rent_vector_buffer(len: usize) -> Vec<Vector3D> {
    let mut buf = pool().lock().unwrap().pop().unwrap_or_default();
    buf.clear();
    buf.resize(len, Vector3D::ZERO);
    buf
}

pub(crate) fn release_vector_buffer(mut buf: Vec<Vector3D>) {
    buf.clear();
    let mut pool = pool().lock().unwrap();
    if pool.len() < POOL_CAPACITY {
        pool.push(buf);
    }
}
