use std::sync::{Mutex, OnceLock};

use log::debug;

use crate::octree::OctreeNode;

/// Cap on how many retired node buffers the process-wide pool keeps around.
/// Past this, `release` just drops the buffer; the next `rent` allocates
/// fresh rather than blocking on more pool growth.
const POOL_CAPACITY: usize = 64;

fn pool() -> &'static Mutex<Vec<Vec<OctreeNode>>> {
    static POOL: OnceLock<Mutex<Vec<Vec<OctreeNode>>>> = OnceLock::new();
    POOL.get_or_init(|| Mutex::new(Vec::with_capacity(POOL_CAPACITY)))
}

/// Rents a node-buffer arena for one Barnes-Hut build, reusing a retired
/// buffer if the pool has one. Falls back to a fresh, empty `Vec` if the
/// pool is exhausted; this is the only "resource exhaustion" path in the
/// core and it never blocks.
pub(crate) fn rent_node_buffer() -> Vec<OctreeNode> {
    match pool().lock().unwrap().pop() {
        Some(mut buf) => {
            buf.clear();
            buf
        }
        None => {
            debug!("node pool exhausted, allocating a fresh buffer");
            Vec::new()
        }
    }
}

/// Returns a buffer to the pool for reuse by the next Barnes-Hut build. If
/// the pool is already at capacity the buffer is simply dropped.
pub(crate) fn release_node_buffer(buf: Vec<OctreeNode>) {
    let mut pool = pool().lock().unwrap();
    if pool.len() < POOL_CAPACITY {
        pool.push(buf);
    }
}
