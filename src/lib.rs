//! Connected particle field simulation.
//!
//! Particles drift across a rectangle and are linked by lines when they come
//! closer than a link distance. A uniform grid keeps the neighbor search near
//! linear, and [`SimulationEngine`] precomputes frames on a background thread
//! so a renderer only ever pulls finished [`SimulationState`]s.

pub mod config;
pub mod connections;
pub mod engine;
pub mod grid;
pub mod particle;
pub mod presets;
pub mod settings;
pub mod state;

pub use connections::{line_alpha, Line};
pub use engine::{PipelineStatus, SimulationEngine};
pub use grid::SpatialGrid;
pub use particle::{Edge, Opacity, Particle};
pub use settings::{EngineSettings, LineStyle};
pub use state::SimulationState;
