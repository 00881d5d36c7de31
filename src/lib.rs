//! Stigmergic trail-following simulation.
//!
//! Many simple agents sense and deposit a scalar pheromone on a shared
//! toroidal grid. The [`Engine`] owns the [`PheromoneField`], the agent
//! population and the [`Params`], and advances everything with
//! [`Engine::tick`]. Hosts drive the cadence and read the field and agent
//! positions back for rendering, optionally through [`Frame`].

pub mod agent;
pub mod engine;
pub mod field;
pub mod frame;
pub mod params;
pub mod utils;
pub mod vector;

pub use agent::Agent;
pub use engine::Engine;
pub use field::PheromoneField;
pub use frame::Frame;
pub use params::Params;
pub use vector::Vector;
