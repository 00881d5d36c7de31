use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use slimetrail::{Params, utils::check_num};
use std::{fs, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Field dimensions.
    pub field: FieldConfig,
    /// Initial population.
    pub init: InitConfig,
    /// Agent and field parameters (clamped, never rejected).
    #[serde(default)]
    pub params: Params,
    /// Output settings.
    pub output: OutputConfig,
    /// Scripted host interactions.
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    /// Initial number of agents.
    pub n_agents: usize,
    /// Seed for the random number generator (OS entropy if absent).
    pub seed: Option<u64>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of ticks per run.
    pub n_ticks: usize,
    /// Number of ticks between records.
    pub ticks_per_save: usize,
    /// Attach a rendered frame to every record.
    #[serde(default)]
    pub save_frames: bool,
}

/// Host interaction applied right before the tick with index `tick`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Event {
    pub tick: usize,
    pub action: Action,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Paint or erase pheromone in a disc.
    Brush {
        x: f64,
        y: f64,
        radius: u32,
        mode: BrushMode,
    },
    /// Reseed agents in a disc.
    Spawn { x: f64, y: f64, radius: u32 },
    /// Resize the field.
    Resize { width: usize, height: usize },
    /// Set the population size.
    Populate { n_agents: usize },
    /// Update any subset of the parameters.
    SetParams(ParamsUpdate),
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrushMode {
    Off,
    Add,
    Remove,
}

impl BrushMode {
    pub fn delta(self) -> f32 {
        match self {
            BrushMode::Off => 0.0,
            BrushMode::Add => 1.0,
            BrushMode::Remove => -1.0,
        }
    }
}

#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamsUpdate {
    pub speed: Option<f64>,
    pub rotate_by: Option<f64>,
    pub max_noise: Option<f64>,
    pub sensor_offset: Option<f64>,
    pub sensor_angle_offset: Option<f64>,
    pub pheromone_deposit: Option<f64>,
    pub decay: Option<f64>,
}

impl ParamsUpdate {
    pub fn apply(&self, params: &mut Params) {
        if let Some(val) = self.speed {
            params.set_speed(val);
        }
        if let Some(val) = self.rotate_by {
            params.set_rotate_by(val);
        }
        if let Some(val) = self.max_noise {
            params.set_max_noise(val);
        }
        if let Some(val) = self.sensor_offset {
            params.set_sensor_offset(val);
        }
        if let Some(val) = self.sensor_angle_offset {
            params.set_sensor_angle_offset(val);
        }
        if let Some(val) = self.pheromone_deposit {
            params.set_pheromone_deposit(val);
        }
        if let Some(val) = self.decay {
            params.set_decay(val);
        }
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Parameters are clamped into range; everything else is validated.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents).context("failed to deserialize config")?;
        config.params = config.params.clamped();

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.field.width, 1..=10_000).context("invalid field width")?;
        check_num(self.field.height, 1..=10_000).context("invalid field height")?;

        check_num(self.init.n_agents, 0..=1_000_000).context("invalid initial number of agents")?;

        check_num(self.output.n_ticks, 1..=10_000_000).context("invalid number of ticks")?;
        check_num(self.output.ticks_per_save, 1..=self.output.n_ticks)
            .context("invalid number of ticks per save")?;

        for (i_event, event) in self.events.iter().enumerate() {
            validate_event(event, self.output.n_ticks)
                .with_context(|| format!("invalid event {i_event}"))?;
        }

        Ok(())
    }
}

fn validate_event(event: &Event, n_ticks: usize) -> Result<()> {
    check_num(event.tick, 0..n_ticks).context("invalid event tick")?;
    match &event.action {
        Action::Resize { width, height } => {
            check_num(*width, 1..=10_000).context("invalid field width")?;
            check_num(*height, 1..=10_000).context("invalid field height")?;
        }
        Action::Populate { n_agents } => {
            check_num(*n_agents, 0..=1_000_000).context("invalid number of agents")?;
        }
        Action::Brush { x, y, radius, .. } | Action::Spawn { x, y, radius } => {
            if !x.is_finite() || !y.is_finite() {
                bail!("event position must be finite, but is ({x}, {y})");
            }
            check_num(*radius, 0..=10_000).context("invalid event radius")?;
        }
        Action::SetParams(_) => {}
    }
    Ok(())
}
