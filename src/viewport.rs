use crate::vector3d::Vector3D;

/// The axis-aligned bounding box (and camera framing) the core consumes from
/// the host application. Only `top_left`/`bottom_right` are read by the core,
/// and only when `World::closed_boundaries` is set; the rest is carried
/// through persistence for the host's own use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub top_left: Vector3D,
    pub bottom_right: Vector3D,
    pub scale: f64,
    pub autocenter: bool,
    pub camera_yaw: f64,
    pub camera_pitch: f64,
}

impl Viewport {
    pub fn new(top_left: Vector3D, bottom_right: Vector3D) -> Self {
        Self {
            top_left,
            bottom_right,
            scale: 1.0,
            autocenter: false,
            camera_yaw: 0.0,
            camera_pitch: 0.0,
        }
    }

    pub fn contains_point(&self, p: Vector3D) -> bool {
        p.x >= self.top_left.x
            && p.x <= self.bottom_right.x
            && p.y >= self.top_left.y
            && p.y <= self.bottom_right.y
            && p.z >= self.top_left.z
            && p.z <= self.bottom_right.z
    }
}
