use crate::analysis::Analyzer;
use crate::config::{Action, Config, Event};
use crate::record::Record;
use anyhow::{Context, Result};
use glob::glob;
use rmp_serde::encode;
use slimetrail::Engine;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn create_run(&self) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;

        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let mut engine = Engine::new(self.cfg.params.clone(), self.cfg.init.seed)
            .context("failed to construct engine")?;
        engine
            .build(
                self.cfg.field.width,
                self.cfg.field.height,
                self.cfg.init.n_agents,
            )
            .context("failed to build engine")?;

        self.perform_simulation(&mut engine, self.trajectory_file(run_idx))
            .context("failed to perform simulation")?;

        Ok(())
    }

    /// Tick the engine `n_ticks` times, writing a record every `ticks_per_save` ticks.
    fn perform_simulation<P: AsRef<Path>>(&self, engine: &mut Engine, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        let output = &self.cfg.output;
        // Stable sort keeps file order among events sharing a tick.
        let mut pending: Vec<&Event> = self.cfg.events.iter().collect();
        pending.sort_by_key(|event| event.tick);
        let mut pending = pending.into_iter().peekable();
        for tick in 0..output.n_ticks {
            while let Some(event) = pending.next_if(|event| event.tick == tick) {
                apply_action(engine, &event.action)
                    .with_context(|| format!("failed to apply event at tick {tick}"))?;
            }

            engine.tick().context("failed to tick engine")?;

            let n_done = tick + 1;
            if n_done % output.ticks_per_save == 0 {
                let record = Record::observe(n_done, engine, output.save_frames)
                    .context("failed to observe engine")?;
                encode::write(&mut writer, &record).context("failed to serialize record")?;

                let progress = 100.0 * n_done as f64 / output.n_ticks as f64;
                log::info!("completed {progress:06.2}%");
            }
        }

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    pub fn analyze_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        let n_records = self.cfg.output.n_ticks / self.cfg.output.ticks_per_save;
        for run_idx in 0..n_runs {
            let mut analyzer = Analyzer::new();

            analyzer
                .add_file(self.trajectory_file(run_idx), n_records)
                .context("failed to add file")?;

            let results_file = self.results_file(run_idx);
            analyzer
                .save_results(&results_file)
                .context("failed to save results")?;
            log::info!("saved {results_file:?}");
        }

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let run_dir = self.run_dir(run_idx);
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }

        Ok(())
    }

    fn count_run_dirs(&self) -> Result<usize> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .count();
        Ok(count)
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn trajectory_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("trajectory.msgpack")
    }

    fn results_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("results.toml")
    }
}

fn apply_action(engine: &mut Engine, action: &Action) -> Result<()> {
    match action {
        Action::Brush { x, y, radius, mode } => {
            engine.edit_pheromones(*x, *y, *radius, mode.delta())?
        }
        Action::Spawn { x, y, radius } => engine.populate_region(*x, *y, *radius)?,
        Action::Resize { width, height } => engine.resize(*width, *height)?,
        Action::Populate { n_agents } => engine.populate(*n_agents)?,
        Action::SetParams(update) => update.apply(engine.params_mut()),
    }
    Ok(())
}
