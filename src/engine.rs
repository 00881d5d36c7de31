use crate::agent::Agent;
use crate::field::PheromoneField;
use crate::params::Params;
use crate::utils::{floor_cell, scan_radius, wrap};
use crate::vector::Vector;
use anyhow::{Context, Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Uniform;

/// Field size used until [`Engine::set_size`] or [`Engine::build`] says otherwise.
pub const DEFAULT_SIZE: (usize, usize) = (500, 500);

/// Number of candidate positions drawn by [`Engine::populate_region`].
pub const SPAWN_COUNT: usize = 1_000;

/// Simulation engine.
///
/// Owns the pheromone field, the agent population, the parameters and the
/// random number generator. The host constructs one, builds it once, then
/// calls [`Engine::tick`] at its own cadence, mutating the population or
/// the field between ticks.
pub struct Engine {
    params: Params,
    size: (usize, usize),
    field: Option<PheromoneField>,
    agents: Vec<Agent>,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create an unbuilt engine.
    ///
    /// The generator is seeded from `seed` when given and from the OS otherwise.
    pub fn new(params: Params, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng().context("failed to seed rng from os")?,
        };
        Ok(Self {
            params,
            size: DEFAULT_SIZE,
            field: None,
            agents: Vec::new(),
            rng,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn is_built(&self) -> bool {
        self.field.is_some()
    }

    pub fn width(&self) -> usize {
        self.field.as_ref().map_or(self.size.0, PheromoneField::width)
    }

    pub fn height(&self) -> usize {
        self.field.as_ref().map_or(self.size.1, PheromoneField::height)
    }

    /// The pheromone field, once built.
    pub fn field(&self) -> Option<&PheromoneField> {
        self.field.as_ref()
    }

    /// Current population in insertion order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Set the field size used by [`Engine::build`].
    ///
    /// # Errors
    /// Returns an error once the field is built or if a dimension is zero.
    pub fn set_size(&mut self, width: usize, height: usize) -> Result<()> {
        if self.is_built() {
            bail!("cannot set size after the field is built");
        }
        if width == 0 || height == 0 {
            bail!("field dimensions must be at least 1x1, but are {width}x{height}");
        }
        self.size = (width, height);
        Ok(())
    }

    /// Allocate a zeroed `width x height` field and `n_agents` random agents.
    ///
    /// # Errors
    /// Returns an error if the engine is already built or a dimension is zero.
    pub fn build(&mut self, width: usize, height: usize, n_agents: usize) -> Result<()> {
        if self.is_built() {
            bail!("cannot build twice");
        }
        self.set_size(width, height)?;
        self.field = Some(PheromoneField::new(width, height).context("failed to allocate field")?);
        self.populate(n_agents).context("failed to populate")?;
        log::info!("built {width}x{height} field with {n_agents} agents");
        Ok(())
    }

    /// Resize the field, keeping the overlapping region of its contents.
    ///
    /// # Errors
    /// Returns an error before the field is built or if a dimension is zero.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        let field = self
            .field
            .as_mut()
            .context("cannot resize before the field is built")?;
        field.resize(width, height).context("failed to resize field")?;
        log::info!("resized field to {width}x{height}");
        Ok(())
    }

    /// Grow or shrink the population to exactly `n_agents`.
    ///
    /// New agents get uniformly random in-bounds positions and headings.
    /// Shrinking keeps the first `n_agents`.
    pub fn populate(&mut self, n_agents: usize) -> Result<()> {
        let n_cur = self.agents.len();
        if n_agents <= n_cur {
            self.agents.truncate(n_agents);
        } else {
            let x_dist = Uniform::new(0.0, self.width() as f64)?;
            let y_dist = Uniform::new(0.0, self.height() as f64)?;
            let heading_dist = Uniform::new(0.0, 360.0)?;
            self.agents.reserve(n_agents - n_cur);
            for _ in n_cur..n_agents {
                let x = x_dist.sample(&mut self.rng);
                let y = y_dist.sample(&mut self.rng);
                let position = Vector::new(x, y);
                let heading = heading_dist.sample(&mut self.rng);
                self.agents.push(Agent::new(position, heading));
            }
        }
        if n_agents != n_cur {
            log::info!("population changed from {n_cur} to {n_agents}");
        }
        Ok(())
    }

    /// Reseed a disc of cells around `(x, y)` with [`SPAWN_COUNT`] candidates.
    ///
    /// See [`Engine::populate_region_with`].
    pub fn populate_region(&mut self, x: f64, y: f64, radius: u32) -> Result<()> {
        self.populate_region_with(x, y, radius, SPAWN_COUNT)
    }

    /// Draw `spawn_count` integer offsets in the square of side `2 * radius + 1`,
    /// append an agent at the center of every wrapped cell inside the disc,
    /// then drop the oldest agents until the population is back to its
    /// size before the call. Radii beyond the field extent are capped with
    /// [`scan_radius`].
    pub fn populate_region_with(
        &mut self,
        x: f64,
        y: f64,
        radius: u32,
        spawn_count: usize,
    ) -> Result<()> {
        let (width, height) = (self.width(), self.height());
        let n_before = self.agents.len();
        let r_center = floor_cell(y);
        let c_center = floor_cell(x);
        let radius = scan_radius(radius, width, height);

        let offset_dist = Uniform::new_inclusive(-radius, radius)?;
        let heading_dist = Uniform::new(0.0, 360.0)?;
        for _ in 0..spawn_count {
            let dr = offset_dist.sample(&mut self.rng);
            let dc = offset_dist.sample(&mut self.rng);
            if dr * dr + dc * dc > radius * radius {
                continue;
            }
            let row = wrap(r_center + dr, height);
            let col = wrap(c_center + dc, width);
            let position = Vector::new(col as f64 + 0.5, row as f64 + 0.5);
            let heading = heading_dist.sample(&mut self.rng);
            self.agents.push(Agent::new(position, heading));
        }

        let n_added = self.agents.len() - n_before;
        self.agents.drain(..n_added);
        log::debug!("reseeded {n_added} agents around ({x}, {y})");
        Ok(())
    }

    /// Add `delta` to every cell within `radius` of `(x, y)`, clamped to `[0, 1]`.
    ///
    /// # Errors
    /// Returns an error before the field is built.
    pub fn edit_pheromones(&mut self, x: f64, y: f64, radius: u32, delta: f32) -> Result<()> {
        let field = self
            .field
            .as_mut()
            .context("cannot edit pheromones before the field is built")?;
        field.edit_region(x, y, radius, delta);
        log::debug!("edited pheromones around ({x}, {y}) by {delta}");
        Ok(())
    }

    /// Advance the simulation by one tick.
    ///
    /// Agents step in population order against the live field, so deposits
    /// of earlier agents are visible to later ones within the same tick.
    /// The field then diffuses and decays once.
    ///
    /// # Errors
    /// Returns an error before the field is built.
    pub fn tick(&mut self) -> Result<()> {
        let field = self
            .field
            .as_mut()
            .context("cannot tick before the field is built")?;
        for agent in &mut self.agents {
            agent.step(field, &self.params, &mut self.rng);
        }
        field.diffuse();
        field.decay(self.params.decay() as f32);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::DIFFUSION_BLEND;

    fn engine() -> Engine {
        Engine::new(Params::default(), Some(7)).unwrap()
    }

    #[test]
    fn lifecycle_preconditions() {
        let mut engine = engine();
        assert!(!engine.is_built());
        assert!(engine.tick().is_err());
        assert!(engine.resize(10, 10).is_err());
        assert!(engine.edit_pheromones(1.0, 1.0, 2, 1.0).is_err());
        assert!(engine.set_size(0, 10).is_err());

        engine.set_size(40, 30).unwrap();
        assert_eq!((engine.width(), engine.height()), (40, 30));

        engine.build(20, 10, 5).unwrap();
        assert!(engine.is_built());
        assert_eq!((engine.width(), engine.height()), (20, 10));
        assert!(engine.build(20, 10, 5).is_err());
        assert!(engine.set_size(30, 30).is_err());
        assert!(engine.tick().is_ok());
    }

    #[test]
    fn build_places_agents_in_bounds() {
        let mut engine = engine();
        engine.build(30, 20, 500).unwrap();
        assert_eq!(engine.agents().len(), 500);
        for agent in engine.agents() {
            let pos = agent.position();
            assert!((0.0..30.0).contains(&pos.x));
            assert!((0.0..20.0).contains(&pos.y));
            assert!((0.0..360.0).contains(&agent.heading()));
        }
        assert!(engine.field().unwrap().cells().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn populate_grows_and_shrinks_exactly() {
        let mut engine = engine();
        engine.build(50, 50, 100).unwrap();
        let first = engine.agents()[..10].to_vec();

        engine.populate(250).unwrap();
        assert_eq!(engine.agents().len(), 250);
        engine.populate(250).unwrap();
        assert_eq!(engine.agents().len(), 250);

        engine.populate(10).unwrap();
        assert_eq!(engine.agents(), &first[..]);
        engine.populate(0).unwrap();
        assert!(engine.agents().is_empty());
    }

    #[test]
    fn populate_before_build_uses_pending_size() {
        let mut engine = engine();
        engine.set_size(8, 4).unwrap();
        engine.populate(50).unwrap();
        assert!(engine.agents().iter().all(|a| a.position().x < 8.0 && a.position().y < 4.0));
        engine.build(8, 4, 50).unwrap();
        assert_eq!(engine.agents().len(), 50);
    }

    #[test]
    fn populate_region_preserves_size_and_keeps_newest() {
        let mut engine = engine();
        engine.build(100, 100, 300).unwrap();

        engine.populate_region(10.0, 90.0, 5).unwrap();
        assert_eq!(engine.agents().len(), 300);

        // Most candidates land in the disc, so the whole population is replaced.
        for agent in engine.agents() {
            let pos = agent.position();
            assert_eq!(pos.x.fract(), 0.5);
            assert_eq!(pos.y.fract(), 0.5);
            let dx = pos.x - 10.5;
            let dy = pos.y - 90.5;
            assert!(dx * dx + dy * dy <= 25.0 + 1e-9);
        }
    }

    #[test]
    fn populate_region_wraps_and_drops_oldest_first() {
        let mut engine = engine();
        engine.build(20, 20, 2000).unwrap();
        let survivors = engine.agents()[1000..].to_vec();

        engine.populate_region_with(0.0, 0.0, 0, 1000).unwrap();
        assert_eq!(engine.agents().len(), 2000);
        assert_eq!(&engine.agents()[..1000], &survivors[..]);
        for agent in &engine.agents()[1000..] {
            assert_eq!(agent.position(), Vector::new(0.5, 0.5));
        }

        engine.populate_region_with(-1.0, -1.0, 0, 10).unwrap();
        let last = engine.agents().last().unwrap();
        assert_eq!(last.position(), Vector::new(19.5, 19.5));
    }

    #[test]
    fn populate_region_on_empty_population_stays_empty() {
        let mut engine = engine();
        engine.build(20, 20, 0).unwrap();
        engine.populate_region(5.0, 5.0, 3).unwrap();
        assert!(engine.agents().is_empty());
    }

    #[test]
    fn edit_pheromones_delegates_to_field() {
        let mut engine = engine();
        engine.build(10, 10, 0).unwrap();
        engine.edit_pheromones(3.2, 4.9, 1, 0.4).unwrap();
        let field = engine.field().unwrap();
        assert_eq!(field.get(4, 3), 0.4);
        assert_eq!(field.get(5, 3), 0.4);
        assert_eq!(field.get(5, 4), 0.0);
    }

    #[test]
    fn huge_radii_are_capped_to_the_field() {
        let mut engine = engine();
        engine.build(10, 10, 50).unwrap();

        engine.populate_region(1.0, 1.0, u32::MAX).unwrap();
        assert_eq!(engine.agents().len(), 50);
        for agent in engine.agents() {
            let pos = agent.position();
            assert!((0.0..10.0).contains(&pos.x) && (0.0..10.0).contains(&pos.y));
        }

        engine.edit_pheromones(1.0, 1.0, 3_100_000_000, 0.5).unwrap();
        let field = engine.field().unwrap();
        assert!(field.cells().iter().all(|&v| v > 0.0 && v <= 1.0));
    }

    #[test]
    fn resize_keeps_overlap() {
        let mut engine = engine();
        engine.build(2, 2, 0).unwrap();
        engine.edit_pheromones(0.0, 0.0, 0, 0.25).unwrap();
        engine.edit_pheromones(1.0, 1.0, 0, 0.75).unwrap();
        engine.resize(3, 3).unwrap();
        assert_eq!((engine.width(), engine.height()), (3, 3));
        assert_eq!(
            engine.field().unwrap().cells(),
            &[0.25, 0.0, 0.0, 0.0, 0.75, 0.0, 0.0, 0.0, 0.0]
        );
        assert!(engine.resize(0, 3).is_err());
    }

    #[test]
    fn single_agent_tick() {
        let mut engine = engine();
        {
            let params = engine.params_mut();
            params.set_speed(1.0);
            params.set_max_noise(0.0);
            params.set_sensor_offset(9.0);
        }
        engine.build(20, 20, 0).unwrap();
        engine.agents.push(Agent::new(Vector::new(5.0, 5.0), 0.0));

        engine.tick().unwrap();

        let pos = engine.agents()[0].position();
        assert!((pos.x - 6.0).abs() < 1e-9);
        assert!((pos.y - 5.0).abs() < 1e-9);

        // The deposit at (row 5, col 6) went through one diffusion and one decay.
        let field = engine.field().unwrap();
        let deposit = engine.params().pheromone_deposit() as f32;
        let decay = engine.params().decay() as f32;
        let expected = deposit * 4.0 / 16.0 * DIFFUSION_BLEND * decay;
        assert!((field.get(5, 6) - expected).abs() < 1e-6);
        for r in 0..20 {
            for c in 0..20 {
                if (r - 5i64).abs() > 1 || (c - 6i64).abs() > 1 {
                    assert_eq!(field.get(r, c), 0.0);
                }
            }
        }
    }

    #[test]
    fn same_tick_deposits_are_visible_to_later_agents() {
        let mut engine = engine();
        {
            let params = engine.params_mut();
            params.set_speed(1.0);
            params.set_max_noise(0.0);
            params.set_rotate_by(20.0);
            params.set_sensor_offset(2.0);
            params.set_sensor_angle_offset(90.0);
        }
        engine.build(20, 20, 0).unwrap();
        // First agent moves up to (10.5, 7.5) and deposits there; the second
        // agent's left sensor at heading 0 reads exactly that cell.
        engine.agents.push(Agent::new(Vector::new(10.5, 8.5), -90.0));
        engine.agents.push(Agent::new(Vector::new(10.5, 9.5), 0.0));

        engine.tick().unwrap();

        assert_eq!(engine.agents()[1].heading(), -20.0);
    }

    #[test]
    fn seeded_engines_agree() {
        let run = || {
            let mut engine = engine();
            engine.build(40, 40, 200).unwrap();
            for _ in 0..5 {
                engine.tick().unwrap();
            }
            engine.agents().to_vec()
        };
        assert_eq!(run(), run());
    }
}
