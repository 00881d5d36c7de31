use crate::utils::clamp;
use serde::{Deserialize, Serialize};

pub const SPEED_RANGE: (f64, f64) = (0.5, 15.0);
pub const ROTATE_BY_RANGE: (f64, f64) = (0.0, 179.0);
pub const MAX_NOISE_RANGE: (f64, f64) = (0.0, 360.0);
pub const SENSOR_OFFSET_RANGE: (f64, f64) = (0.0, 100.0);
pub const SENSOR_ANGLE_OFFSET_RANGE: (f64, f64) = (0.0, 179.0);
pub const PHEROMONE_DEPOSIT_RANGE: (f64, f64) = (0.0, 1.0);
pub const DECAY_RANGE: (f64, f64) = (0.0, 1.0);

/// Simulation parameters shared by every agent and the field update.
///
/// Angles are in degrees and distances in grid cells. Every setter clamps
/// its argument into the documented range instead of rejecting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    speed: f64,
    rotate_by: f64,
    max_noise: f64,
    sensor_offset: f64,
    sensor_angle_offset: f64,
    pheromone_deposit: f64,
    decay: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            speed: 2.0,
            rotate_by: 30.0,
            max_noise: 10.0,
            sensor_offset: 20.0,
            sensor_angle_offset: 45.0,
            pheromone_deposit: 0.5,
            decay: 0.98,
        }
    }
}

impl Params {
    /// Distance travelled per tick.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Turn applied when a side sensor wins.
    pub fn rotate_by(&self) -> f64 {
        self.rotate_by
    }

    /// Bound of the uniform heading jitter applied each tick.
    pub fn max_noise(&self) -> f64 {
        self.max_noise
    }

    /// Distance from the agent to each sensor.
    pub fn sensor_offset(&self) -> f64 {
        self.sensor_offset
    }

    /// Angle between the center sensor and each side sensor.
    pub fn sensor_angle_offset(&self) -> f64 {
        self.sensor_angle_offset
    }

    /// Value written to the field by each agent each tick.
    pub fn pheromone_deposit(&self) -> f64 {
        self.pheromone_deposit
    }

    /// Per-tick multiplicative field decay.
    pub fn decay(&self) -> f64 {
        self.decay
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = clamp_to(speed, SPEED_RANGE);
    }

    pub fn set_rotate_by(&mut self, rotate_by: f64) {
        self.rotate_by = clamp_to(rotate_by, ROTATE_BY_RANGE);
    }

    pub fn set_max_noise(&mut self, max_noise: f64) {
        self.max_noise = clamp_to(max_noise, MAX_NOISE_RANGE);
    }

    pub fn set_sensor_offset(&mut self, sensor_offset: f64) {
        self.sensor_offset = clamp_to(sensor_offset, SENSOR_OFFSET_RANGE);
    }

    pub fn set_sensor_angle_offset(&mut self, sensor_angle_offset: f64) {
        self.sensor_angle_offset = clamp_to(sensor_angle_offset, SENSOR_ANGLE_OFFSET_RANGE);
    }

    pub fn set_pheromone_deposit(&mut self, pheromone_deposit: f64) {
        self.pheromone_deposit = clamp_to(pheromone_deposit, PHEROMONE_DEPOSIT_RANGE);
    }

    pub fn set_decay(&mut self, decay: f64) {
        self.decay = clamp_to(decay, DECAY_RANGE);
    }

    /// Re-apply every setter, pulling deserialized values into range.
    pub fn clamped(mut self) -> Self {
        self.set_speed(self.speed);
        self.set_rotate_by(self.rotate_by);
        self.set_max_noise(self.max_noise);
        self.set_sensor_offset(self.sensor_offset);
        self.set_sensor_angle_offset(self.sensor_angle_offset);
        self.set_pheromone_deposit(self.pheromone_deposit);
        self.set_decay(self.decay);
        self
    }
}

fn clamp_to(val: f64, (min, max): (f64, f64)) -> f64 {
    clamp(val, min, max)
}
