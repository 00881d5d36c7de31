use anyhow::Result;
use serde::{Deserialize, Serialize};
use slimetrail::{Engine, Frame};

/// Record of the simulation at a single tick.
///
/// Contains the tick, population size, field summary and frame (optional).
#[derive(Debug, Serialize, Deserialize)]
pub struct Record {
    /// Number of ticks completed.
    pub tick: usize,

    /// Population size.
    pub n_agents: usize,

    /// Field dimensions.
    pub width: usize,
    pub height: usize,

    /// Mean cell value.
    pub mean_intensity: f64,

    /// Largest cell value.
    pub peak_intensity: f64,

    /// Fraction of cells holding any pheromone.
    pub coverage: f64,

    /// Rendered field and agents.
    pub frame: Option<Frame>,
}

impl Record {
    pub fn observe(tick: usize, engine: &Engine, save_frame: bool) -> Result<Self> {
        let frame = if save_frame {
            Some(Frame::compose(engine, true)?)
        } else {
            None
        };
        let (mean_intensity, peak_intensity, coverage) = match engine.field() {
            Some(field) => (field.mean(), field.peak() as f64, field.coverage()),
            None => (0.0, 0.0, 0.0),
        };
        Ok(Self {
            tick,
            n_agents: engine.agents().len(),
            width: engine.width(),
            height: engine.height(),
            mean_intensity,
            peak_intensity,
            coverage,
            frame,
        })
    }
}
