//! The 3D octree (eight children per internal node) used by the Barnes-Hut
//! gravity backend: bodies are inserted one at a time, center-of-mass and
//! node extent are aggregated bottom-up, and acceleration is recovered with
//! an iterative (stack-based), read-only traversal.

use crate::gravity::G;
use crate::pool::{rent_node_buffer, release_node_buffer};
use crate::vector3d::Vector3D;

/// A lightweight, read-only snapshot of what the tree needs from a body:
/// decoupled from `Body` so the tree (and its query) never alias the
/// `&mut [Body]` slice the gravity backend is writing accelerations into.
#[derive(Clone, Copy, Debug)]
pub struct BhRecord {
    pub position: Vector3D,
    pub mass: f64,
    pub radius: f64,
}

/// A cubical bounding region: center plus full side length.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Cube {
    pub center: Vector3D,
    pub size: f64,
}

impl Cube {
    /// The minimal cube containing every record, slightly padded so bodies
    /// exactly on the boundary still partition cleanly.
    fn containing(records: &[BhRecord]) -> Cube {
        let mut min = Vector3D::splat(f64::MAX);
        let mut max = Vector3D::splat(f64::MIN);
        for r in records {
            min = min.min(r.position);
            max = max.max(r.position);
        }
        let size = (max.x - min.x).max(max.y - min.y).max(max.z - min.z);
        let size = if size > 0.0 { size * 1.001 } else { 1.0 };
        let center = (min + max) * 0.5;
        Cube { center, size }
    }

    /// 3-bit octant index: bit 0 = x, bit 1 = y, bit 2 = z, set when the
    /// position is at or past the cube's midpoint on that axis.
    fn octant_of(&self, p: Vector3D) -> usize {
        let mut idx = 0usize;
        if p.x >= self.center.x {
            idx |= 0b001;
        }
        if p.y >= self.center.y {
            idx |= 0b010;
        }
        if p.z >= self.center.z {
            idx |= 0b100;
        }
        idx
    }

    fn child(&self, octant: usize) -> Cube {
        let half = self.size / 2.0;
        let quarter = self.size / 4.0;
        let sx = if octant & 0b001 != 0 { quarter } else { -quarter };
        let sy = if octant & 0b010 != 0 { quarter } else { -quarter };
        let sz = if octant & 0b100 != 0 { quarter } else { -quarter };
        Cube {
            center: self.center + Vector3D::new(sx, sy, sz),
            size: half,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum NodeContents {
    Empty,
    Leaf { body: u32 },
    Internal { first_child: u32 },
}

/// One octree node. Internal nodes' eight children occupy contiguous
/// indices `first_child..first_child + 8` in the tree's flat arena; a
/// child slot that never received a body is simply an `Empty` node.
#[derive(Clone, Debug)]
pub struct OctreeNode {
    contents: NodeContents,
    cube: Cube,
    mass: f64,
    center_of_mass: Vector3D,
    /// `-G * mass`, cached after aggregation.
    neg_g_mass: f64,
    /// Cached squared side length, used by the opening-angle test.
    size_sq: f64,
    /// Radius of the single body held here, valid only while `contents` is
    /// `Leaf`.
    leaf_radius: f64,
}

impl OctreeNode {
    fn new_empty(cube: Cube) -> Self {
        let size_sq = cube.size * cube.size;
        Self {
            contents: NodeContents::Empty,
            cube,
            mass: 0.0,
            center_of_mass: Vector3D::ZERO,
            neg_g_mass: 0.0,
            size_sq,
            leaf_radius: 0.0,
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self.contents, NodeContents::Empty)
    }
}

/// The Barnes-Hut octree for one gravity pass. Borrows nothing past
/// construction; its node arena is rented from the process-wide pool and
/// released when the tree is dropped.
pub struct BarnesHutTree {
    nodes: Vec<OctreeNode>,
    /// (target, other) pairs of near-overlapping bodies noticed while
    /// inserting. Kept only as a diagnostic / safety signal: the uniform
    /// grid resolver is the sole source of truth for collision response.
    insertion_pairs: Vec<(u32, u32)>,
}

const ROOT: usize = 0;

/// Below this cube side length, stop subdividing and fold any further
/// arrivals into the existing leaf instead. Guards against bodies whose
/// positions are exactly (or near-exactly) coincident, which would
/// otherwise keep landing in the same octant forever.
const MIN_CUBE_SIZE: f64 = 1e-9;

impl BarnesHutTree {
    /// Builds a tree over `records`, indexed the same way as the caller's
    /// body slice (record `i` corresponds to body `i`).
    pub fn build(records: &[BhRecord]) -> Self {
        let mut nodes = rent_node_buffer();
        let mut insertion_pairs = Vec::new();

        if records.is_empty() {
            return Self { nodes, insertion_pairs };
        }

        let root_cube = Cube::containing(records);
        nodes.push(OctreeNode::new_empty(root_cube));

        for (i, record) in records.iter().enumerate() {
            insert(&mut nodes, ROOT, i as u32, record, records, &mut insertion_pairs);
        }

        aggregate(&mut nodes, ROOT);

        Self { nodes, insertion_pairs }
    }

    /// Collision candidates recorded while the tree was built. Diagnostic
    /// only — never fed into collision response (see the spec's note on
    /// avoiding double-application of a pair).
    pub fn insertion_time_pairs(&self) -> &[(u32, u32)] {
        &self.insertion_pairs
    }

    /// Acceleration on `target` (index `target_idx` in the same indexing as
    /// the tree was built with) under the Barnes-Hut approximation, plus any
    /// leaf-level near-contact pairs noticed during this query. Read-only:
    /// safe to call concurrently for distinct targets.
    pub fn acceleration(&self, target_idx: u32, target: &BhRecord, theta_sq: f64) -> (Vector3D, Vec<(u32, u32)>) {
        let mut acc = Vector3D::ZERO;
        let mut pairs = Vec::new();

        if self.nodes.is_empty() {
            return (acc, pairs);
        }

        let mut stack = Vec::with_capacity(64);
        stack.push(ROOT);

        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            match node.contents {
                NodeContents::Empty => {}
                NodeContents::Leaf { body } => {
                    if body == target_idx {
                        continue;
                    }
                    let mut d = target.position - node.center_of_mass;
                    let contact = target.radius + node.leaf_radius;
                    let contact_sq = contact * contact;
                    if d.length_squared() < contact_sq {
                        pairs.push((target_idx.min(body), target_idx.max(body)));
                        d = d.with_length(contact.max(1e-10));
                    }
                    let r_sq = d.length_squared().max(1e-24);
                    acc += d * (node.neg_g_mass / r_sq.powf(1.5));
                }
                NodeContents::Internal { first_child } => {
                    let d = target.position - node.center_of_mass;
                    let r_sq = d.length_squared();
                    if node.size_sq < theta_sq * r_sq {
                        let r_sq = r_sq.max(1e-24);
                        acc += d * (node.neg_g_mass / r_sq.powf(1.5));
                    } else {
                        for c in 0..8 {
                            let child_idx = first_child as usize + c;
                            if !self.nodes[child_idx].is_empty() {
                                stack.push(child_idx);
                            }
                        }
                    }
                }
            }
        }

        (acc, pairs)
    }
}

impl Drop for BarnesHutTree {
    fn drop(&mut self) {
        release_node_buffer(std::mem::take(&mut self.nodes));
    }
}

fn insert(
    nodes: &mut Vec<OctreeNode>,
    mut node_idx: usize,
    body_idx: u32,
    record: &BhRecord,
    records: &[BhRecord],
    insertion_pairs: &mut Vec<(u32, u32)>,
) {
    loop {
        match nodes[node_idx].contents {
            NodeContents::Empty => {
                let n = &mut nodes[node_idx];
                n.contents = NodeContents::Leaf { body: body_idx };
                n.leaf_radius = record.radius;
                n.mass = record.mass;
                n.center_of_mass = record.position;
                return;
            }
            NodeContents::Leaf { body: existing } => {
                let existing_record = records[existing as usize];
                let d = record.position - existing_record.position;
                let contact = record.radius + existing_record.radius;
                if d.length_squared() < contact * contact {
                    insertion_pairs.push((existing.min(body_idx), existing.max(body_idx)));
                    return;
                }

                let cube = nodes[node_idx].cube;

                // Coincident (or practically coincident) positions would
                // fall into the same octant at every subdivision depth.
                // Fold the new body's mass into the existing leaf instead
                // of recursing forever, the same way the teacher's
                // quadtree merges bodies that land on the exact same spot.
                if record.position == existing_record.position || cube.size < MIN_CUBE_SIZE {
                    insertion_pairs.push((existing.min(body_idx), existing.max(body_idx)));
                    let n = &mut nodes[node_idx];
                    let combined_mass = n.mass + record.mass;
                    if combined_mass > 0.0 {
                        n.center_of_mass =
                            (n.center_of_mass * n.mass + record.position * record.mass) / combined_mass;
                    }
                    n.mass = combined_mass;
                    n.leaf_radius = n.leaf_radius.max(record.radius);
                    return;
                }

                let first_child = nodes.len() as u32;
                for c in 0..8 {
                    nodes.push(OctreeNode::new_empty(cube.child(c)));
                }
                nodes[node_idx].contents = NodeContents::Internal { first_child };

                let existing_octant = cube.octant_of(existing_record.position);
                insert(
                    nodes,
                    first_child as usize + existing_octant,
                    existing,
                    &existing_record,
                    records,
                    insertion_pairs,
                );

                node_idx = first_child as usize + cube.octant_of(record.position);
            }
            NodeContents::Internal { first_child } => {
                let cube = nodes[node_idx].cube;
                node_idx = first_child as usize + cube.octant_of(record.position);
            }
        }
    }
}

/// Post-order aggregation of mass and center of mass, using an explicit
/// stack so recursion depth never touches the call stack.
fn aggregate(nodes: &mut [OctreeNode], root: usize) {
    let mut order = Vec::new();
    let mut stack = vec![root];
    while let Some(idx) = stack.pop() {
        if let NodeContents::Internal { first_child } = nodes[idx].contents {
            order.push(idx);
            for c in 0..8 {
                stack.push(first_child as usize + c);
            }
        }
    }

    // `order` is a preorder traversal, so every parent precedes its
    // descendants; folding it in reverse processes children before parents.
    for &idx in order.iter().rev() {
        let first_child = match nodes[idx].contents {
            NodeContents::Internal { first_child } => first_child as usize,
            _ => unreachable!(),
        };
        let mut mass = 0.0;
        let mut com = Vector3D::ZERO;
        for c in 0..8 {
            let child = &nodes[first_child + c];
            if !child.is_empty() {
                mass += child.mass;
                com += child.center_of_mass * child.mass;
            }
        }
        if mass > 0.0 {
            com /= mass;
        }
        nodes[idx].mass = mass;
        nodes[idx].center_of_mass = com;
    }

    for node in nodes.iter_mut() {
        node.neg_g_mass = -G * node.mass;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rec(x: f64, y: f64, z: f64, mass: f64, radius: f64) -> BhRecord {
        BhRecord { position: Vector3D::new(x, y, z), mass, radius }
    }

    #[test]
    fn two_body_exact_matches_newton() {
        let records = vec![rec(0.0, 0.0, 0.0, 5.0, 0.1), rec(10.0, 0.0, 0.0, 7.0, 0.1)];
        let tree = BarnesHutTree::build(&records);
        let (acc, _) = tree.acceleration(0, &records[0], 0.0);
        let expected = G * 7.0 / 100.0;
        assert_relative_eq!(acc.x, expected, epsilon = 1e-12);
    }

    #[test]
    fn empty_population_yields_no_acceleration() {
        let tree = BarnesHutTree::build(&[]);
        let target = rec(0.0, 0.0, 0.0, 1.0, 0.1);
        let (acc, pairs) = tree.acceleration(0, &target, 0.5);
        assert_eq!(acc, Vector3D::ZERO);
        assert!(pairs.is_empty());
    }

    #[test]
    fn theta_zero_agrees_with_direct_sum_for_a_small_cluster() {
        let records = vec![
            rec(0.0, 0.0, 0.0, 3.0, 0.1),
            rec(5.0, 0.0, 0.0, 4.0, 0.1),
            rec(0.0, 5.0, 1.0, 2.0, 0.1),
            rec(-3.0, -2.0, 4.0, 6.0, 0.1),
        ];
        let tree = BarnesHutTree::build(&records);

        for (i, target) in records.iter().enumerate() {
            let (bh_acc, _) = tree.acceleration(i as u32, target, 0.0);

            let mut direct_acc = Vector3D::ZERO;
            for (j, other) in records.iter().enumerate() {
                if i == j {
                    continue;
                }
                let d = target.position - other.position;
                let r_sq = d.length_squared().max(1e-24);
                direct_acc += d * (-G * other.mass / r_sq.powf(1.5));
            }

            assert_relative_eq!(bh_acc.x, direct_acc.x, epsilon = 1e-9);
            assert_relative_eq!(bh_acc.y, direct_acc.y, epsilon = 1e-9);
            assert_relative_eq!(bh_acc.z, direct_acc.z, epsilon = 1e-9);
        }
    }

    #[test]
    fn coincident_positions_do_not_hang_insertion() {
        let records = vec![rec(1.0, 2.0, 3.0, 4.0, 0.0), rec(1.0, 2.0, 3.0, 6.0, 0.0)];
        let tree = BarnesHutTree::build(&records);
        assert_eq!(tree.nodes.len(), 1);
        assert_relative_eq!(tree.nodes[ROOT].mass, 10.0);
        assert_eq!(tree.insertion_time_pairs(), &[(0, 1)]);

        let (acc, _) = tree.acceleration(0, &records[0], 0.5);
        assert!(acc.is_finite());
    }
}
