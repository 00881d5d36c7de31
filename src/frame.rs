use crate::engine::Engine;
use crate::utils::{floor_cell, wrap};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const PHEROMONE_RGB: [u8; 3] = [255, 100, 255];
const AGENT_RGBA: [u8; 4] = [255, 255, 255, 255];

/// RGBA8 image of the field and population, one pixel per cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

impl Frame {
    /// Compose a frame from the engine's current state.
    ///
    /// Marked cells are tinted with an alpha of half their intensity when
    /// `show_pheromones` is set; agents are painted opaque white on top.
    pub fn compose(engine: &Engine, show_pheromones: bool) -> Result<Self> {
        let field = engine
            .field()
            .context("cannot compose a frame before the field is built")?;
        let (width, height) = (field.width(), field.height());
        let mut rgba = vec![0; width * height * 4];

        if show_pheromones {
            for (px, &val) in rgba.chunks_exact_mut(4).zip(field.cells()) {
                if val > 0.0 {
                    let alpha = (val * 255.0 / 2.0).clamp(0.0, 255.0) as u8;
                    px[..3].copy_from_slice(&PHEROMONE_RGB);
                    px[3] = alpha;
                }
            }
        }

        for agent in engine.agents() {
            let pos = agent.position();
            let idx = wrap(floor_cell(pos.y), height) * width + wrap(floor_cell(pos.x), width);
            rgba[4 * idx..4 * idx + 4].copy_from_slice(&AGENT_RGBA);
        }

        Ok(Self {
            width,
            height,
            rgba,
        })
    }
}
