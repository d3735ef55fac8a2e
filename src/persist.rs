//! Versionless JSON persistence. The schema is a fixed external contract:
//! field names and casing below must match exactly, not Rust convention.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::body::Body;
use crate::color::Color;
use crate::error::CoreError;
use crate::vector3d::Vector3D;
use crate::viewport::Viewport;
use crate::world::World;

#[derive(Serialize, Deserialize)]
struct Xyz {
    #[serde(rename = "X")]
    x: f64,
    #[serde(rename = "Y")]
    y: f64,
    #[serde(rename = "Z")]
    z: f64,
}

impl From<Vector3D> for Xyz {
    fn from(v: Vector3D) -> Self {
        Xyz { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Xyz> for Vector3D {
    fn from(v: Xyz) -> Self {
        Vector3D::new(v.x, v.y, v.z)
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedViewport {
    #[serde(rename = "TopLeft")]
    top_left: Xyz,
    #[serde(rename = "BottomRight")]
    bottom_right: Xyz,
    #[serde(rename = "Scale")]
    scale: f64,
    #[serde(rename = "Autocenter", default)]
    autocenter: bool,
    #[serde(rename = "CameraYaw", default)]
    camera_yaw: f64,
    #[serde(rename = "CameraPitch", default)]
    camera_pitch: f64,
}

#[derive(Serialize, Deserialize)]
struct PersistedBody {
    #[serde(rename = "Id")]
    id: u64,
    #[serde(rename = "Color")]
    color: Color,
    #[serde(rename = "AtmosphereColor", default)]
    atmosphere_color: Option<Color>,
    #[serde(rename = "AtmosphereThickness", default)]
    atmosphere_thickness: f64,
    #[serde(rename = "Position")]
    position: Xyz,
    v: Xyz,
    r: f64,
    m: f64,
    #[serde(rename = "Name", default)]
    name: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct PersistedWorld {
    #[serde(rename = "ElasticCollisions")]
    elastic_collisions: bool,
    #[serde(rename = "ClosedBoundaries")]
    closed_boundaries: bool,
    #[serde(rename = "Timescale")]
    timescale: f64,
    #[serde(rename = "Bodies")]
    bodies: Vec<PersistedBody>,
}

#[derive(Serialize, Deserialize)]
struct PersistedState {
    #[serde(rename = "Viewport")]
    viewport: PersistedViewport,
    #[serde(rename = "World")]
    world: PersistedWorld,
    #[serde(rename = "SelectedBodyPresetId", default)]
    selected_body_preset_id: Option<Uuid>,
    #[serde(rename = "RespawnerId", default)]
    respawner_id: Option<Uuid>,
    #[serde(rename = "RngState", default)]
    rng_state: Option<String>,
    #[serde(rename = "Runtime", default)]
    runtime: Option<String>,
}

/// A snapshot of everything the host application cares about persisting,
/// beyond what the core itself models (`World`, `Viewport`).
#[derive(Clone, Debug, Default)]
pub struct PersistenceMetadata {
    pub selected_body_preset_id: Option<Uuid>,
    pub respawner_id: Option<Uuid>,
    pub rng_state: Option<String>,
    pub runtime: Option<String>,
}

/// Serializes `world`, `viewport`, and host metadata into the persisted
/// JSON format.
pub fn save(world: &World, viewport: &Viewport, metadata: &PersistenceMetadata) -> Result<String, CoreError> {
    let state = PersistedState {
        viewport: PersistedViewport {
            top_left: viewport.top_left.into(),
            bottom_right: viewport.bottom_right.into(),
            scale: viewport.scale,
            autocenter: viewport.autocenter,
            camera_yaw: viewport.camera_yaw,
            camera_pitch: viewport.camera_pitch,
        },
        world: PersistedWorld {
            elastic_collisions: world.elastic_collisions,
            closed_boundaries: world.closed_boundaries,
            timescale: world.timescale,
            bodies: world
                .bodies()
                .iter()
                .map(|b| PersistedBody {
                    id: b.id(),
                    color: b.color,
                    atmosphere_color: b.atmosphere_color,
                    atmosphere_thickness: b.atmosphere_thickness,
                    position: b.position.into(),
                    v: b.velocity.into(),
                    r: b.radius(),
                    m: b.mass(),
                    name: b.name.clone(),
                })
                .collect(),
        },
        selected_body_preset_id: metadata.selected_body_preset_id,
        respawner_id: metadata.respawner_id,
        rng_state: metadata.rng_state.clone(),
        runtime: metadata.runtime.clone(),
    };

    serde_json::to_string_pretty(&state)
        .map_err(|e| CoreError::CorruptPersistedState(format!("failed to serialize state: {e}")))
}

/// Parses the persisted JSON format, returning a fresh `World`, `Viewport`,
/// and whatever host metadata was present. On failure the caller's
/// existing state is untouched since nothing is mutated in place.
pub fn load(json: &str) -> Result<(World, Viewport, PersistenceMetadata), CoreError> {
    let state: PersistedState =
        serde_json::from_str(json).map_err(|e| CoreError::CorruptPersistedState(format!("malformed state: {e}")))?;

    let viewport = Viewport {
        top_left: state.viewport.top_left.into(),
        bottom_right: state.viewport.bottom_right.into(),
        scale: state.viewport.scale,
        autocenter: state.viewport.autocenter,
        camera_yaw: state.viewport.camera_yaw,
        camera_pitch: state.viewport.camera_pitch,
    };

    let mut world = World::new();
    world.elastic_collisions = state.world.elastic_collisions;
    world.closed_boundaries = state.world.closed_boundaries;
    world.timescale = state.world.timescale;

    for pb in state.world.bodies {
        let body = Body::from_parts(
            pb.id,
            pb.position.into(),
            pb.v.into(),
            pb.m,
            pb.r,
            pb.color,
            pb.atmosphere_color,
            pb.atmosphere_thickness,
            pb.name,
        )
        .map_err(|e| CoreError::CorruptPersistedState(format!("invalid body in persisted state: {e}")))?;
        world.bodies_mut().push(body);
    }

    let metadata = PersistenceMetadata {
        selected_body_preset_id: state.selected_body_preset_id,
        respawner_id: state.respawner_id,
        rng_state: state.rng_state,
        runtime: state.runtime,
    };

    Ok((world, viewport, metadata))
}
