//! A pluggable N-body gravitational simulation core: a body/world data
//! model, a 3D Barnes-Hut octree, interchangeable gravity/integrator/
//! oversampler/collision-resolver stages, and JSON persistence.
//!
//! The library supplies no scheduling or I/O of its own — the host calls
//! [`engine::SimulationEngine::simulate`] once per tick and owns the clock.

pub mod body;
pub mod collision;
pub mod color;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod gravity;
pub mod ids;
pub mod integrators;
pub mod octree;
pub mod oversamplers;
pub mod persist;
pub mod pool;
pub mod scenarios;
pub mod scratch;
pub mod vector3d;
pub mod viewport;
pub mod world;

pub use body::Body;
pub use collision::{CollisionResolver, UniformGrid};
pub use color::Color;
pub use diagnostics::StepDiagnostics;
pub use engine::SimulationEngine;
pub use error::CoreError;
pub use gravity::{BarnesHut, Direct, GravityBackend};
pub use integrators::{Integrator, Leapfrog, Rk4, SemiImplicit};
pub use oversamplers::{HierarchicalBlock, MinDiameterCrossingTime, Oversampler, Static};
pub use vector3d::Vector3D;
pub use viewport::Viewport;
pub use world::World;
