use crate::record::Record;
use crate::stats::{Accumulator, AccumulatorReport};
use anyhow::{Context, Result};
use rmp_serde::decode;
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::BufReader,
    path::Path,
};

pub trait Obs {
    fn name(&self) -> &'static str;
    fn update(&mut self, record: &Record);
    fn report(&self) -> AccumulatorReport;
}

/// Observable that accumulates one scalar per record.
struct Scalar {
    name: &'static str,
    extract: fn(&Record) -> f64,
    acc: Accumulator,
}

impl Scalar {
    fn new(name: &'static str, extract: fn(&Record) -> f64) -> Self {
        Self {
            name,
            extract,
            acc: Accumulator::new(),
        }
    }
}

impl Obs for Scalar {
    fn name(&self) -> &'static str {
        self.name
    }

    fn update(&mut self, record: &Record) {
        self.acc.add((self.extract)(record));
    }

    fn report(&self) -> AccumulatorReport {
        self.acc.report()
    }
}

#[derive(Debug, Serialize)]
struct Results {
    n_records: usize,
    last_tick: usize,
    observables: BTreeMap<&'static str, AccumulatorReport>,
}

pub struct Analyzer {
    n_records: usize,
    last_tick: usize,
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new() -> Self {
        let mut obs_ptr_vec: Vec<Box<dyn Obs>> = Vec::new();
        obs_ptr_vec.push(Box::new(Scalar::new("mean_intensity", |rec| rec.mean_intensity)));
        obs_ptr_vec.push(Box::new(Scalar::new("peak_intensity", |rec| rec.peak_intensity)));
        obs_ptr_vec.push(Box::new(Scalar::new("coverage", |rec| rec.coverage)));
        obs_ptr_vec.push(Box::new(Scalar::new("n_agents", |rec| rec.n_agents as f64)));
        Self {
            n_records: 0,
            last_tick: 0,
            obs_ptr_vec,
        }
    }

    pub fn add_record(&mut self, record: &Record) {
        self.n_records += 1;
        self.last_tick = self.last_tick.max(record.tick);
        for obs in &mut self.obs_ptr_vec {
            obs.update(record);
        }
    }

    /// Read `n_records` records from a trajectory file.
    pub fn add_file<P: AsRef<Path>>(&mut self, file: P, n_records: usize) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        for i_record in 0..n_records {
            let record: Record = decode::from_read(&mut reader)
                .with_context(|| format!("failed to deserialize record {i_record}"))?;
            self.add_record(&record);
        }
        Ok(())
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let results = Results {
            n_records: self.n_records,
            last_tick: self.last_tick,
            observables: self
                .obs_ptr_vec
                .iter()
                .map(|obs| (obs.name(), obs.report()))
                .collect(),
        };
        let contents = toml::to_string_pretty(&results).context("failed to serialize results")?;
        fs::write(file, contents).with_context(|| format!("failed to write {file:?}"))?;
        Ok(())
    }
}
