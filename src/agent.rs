//! Trail-following agent.

use crate::field::PheromoneField;
use crate::params::Params;
use crate::utils::floor_cell;
use crate::vector::Vector;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Mobile agent that senses, steers, moves and deposits each tick.
///
/// The position is never wrapped; it is only reduced onto the torus
/// when used to index the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    position: Vector,
    heading: f64,
}

impl Agent {
    /// Create an agent at `position` facing `heading` degrees.
    pub fn new(position: Vector, heading: f64) -> Self {
        Self { position, heading }
    }

    pub fn position(&self) -> Vector {
        self.position
    }

    /// Heading in degrees. Accumulates without bound.
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Advance the agent by one tick.
    ///
    /// Sensing uses the position at the start of the tick,
    /// while the deposit lands at the position after moving.
    pub fn step<R: Rng>(&mut self, field: &mut PheromoneField, params: &Params, rng: &mut R) {
        let max_noise = params.max_noise();
        self.heading += rng.random::<f64>() * 2.0 * max_noise - max_noise;

        let angle = params.sensor_angle_offset();
        let left = self.sense(field, -angle, params.sensor_offset());
        let center = self.sense(field, 0.0, params.sensor_offset());
        let right = self.sense(field, angle, params.sensor_offset());
        self.heading += steer(left, center, right) * params.rotate_by();

        self.position = self.position + Vector::from_degrees(self.heading) * params.speed();

        field.deposit(
            self.position.x,
            self.position.y,
            params.pheromone_deposit() as f32,
        );
    }

    fn sense(&self, field: &PheromoneField, angle_offset: f64, sensor_offset: f64) -> f32 {
        let direction = Vector::from_degrees(self.heading + angle_offset);
        let sensor = self.position + direction * sensor_offset;
        field.get(floor_cell(sensor.y), floor_cell(sensor.x))
    }
}

/// Turn direction for the three sensor readings: `-1` left, `1` right, `0` straight.
///
/// A side only wins when strictly greater than both others, so ties never turn.
fn steer(left: f32, center: f32, right: f32) -> f64 {
    if left > center && left > right {
        -1.0
    } else if right > center && right > left {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn quiet_params() -> Params {
        let mut params = Params::default();
        params.set_max_noise(0.0);
        params.set_speed(1.0);
        params.set_rotate_by(10.0);
        params.set_sensor_offset(4.0);
        params.set_sensor_angle_offset(90.0);
        params
    }

    #[test]
    fn steer_prefers_strict_maximum() {
        assert_eq!(steer(0.9, 0.1, 0.2), -1.0);
        assert_eq!(steer(0.1, 0.2, 0.9), 1.0);
        assert_eq!(steer(0.1, 0.9, 0.2), 0.0);
        assert_eq!(steer(0.0, 0.0, 0.0), 0.0);
        assert_eq!(steer(0.5, 0.1, 0.5), 0.0);
        assert_eq!(steer(0.5, 0.5, 0.1), 0.0);
    }

    #[test]
    fn moves_straight_and_deposits_after_moving() {
        let mut field = PheromoneField::new(20, 20).unwrap();
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let params = quiet_params();
        let mut agent = Agent::new(Vector::new(5.5, 5.5), 0.0);

        agent.step(&mut field, &params, &mut rng);

        assert!((agent.position().x - 6.5).abs() < 1e-9);
        assert!((agent.position().y - 5.5).abs() < 1e-9);
        assert_eq!(agent.heading(), 0.0);
        assert_eq!(field.get(5, 6), 0.5);
        assert_eq!(field.get(5, 5), 0.0);
        assert_eq!(field.cells().iter().filter(|&&v| v > 0.0).count(), 1);
    }

    #[test]
    fn turns_toward_stronger_side_sensor() {
        let params = quiet_params();
        let mut rng = ChaCha12Rng::seed_from_u64(1);

        // Heading 0 with 90° sensors: left sensor at -y, right sensor at +y.
        let mut field = PheromoneField::new(20, 20).unwrap();
        field.set(6, 10, 1.0);
        let mut agent = Agent::new(Vector::new(10.5, 10.5), 0.0);
        agent.step(&mut field, &params, &mut rng);
        assert_eq!(agent.heading(), -10.0);

        let mut field = PheromoneField::new(20, 20).unwrap();
        field.set(14, 10, 1.0);
        let mut agent = Agent::new(Vector::new(10.5, 10.5), 0.0);
        agent.step(&mut field, &params, &mut rng);
        assert_eq!(agent.heading(), 10.0);
    }

    #[test]
    fn sensors_wrap_around_field_edges() {
        let params = quiet_params();
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        let mut field = PheromoneField::new(10, 10).unwrap();
        // Left sensor from (0.5, 1.5) at heading 0 lands on row -3 == row 7.
        field.set(7, 0, 1.0);
        let mut agent = Agent::new(Vector::new(0.5, 1.5), 0.0);
        agent.step(&mut field, &params, &mut rng);
        assert_eq!(agent.heading(), -10.0);
    }

    #[test]
    fn position_is_not_wrapped() {
        let mut params = quiet_params();
        params.set_speed(3.0);
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let mut field = PheromoneField::new(4, 4).unwrap();
        let mut agent = Agent::new(Vector::new(3.5, 0.5), 0.0);
        agent.step(&mut field, &params, &mut rng);
        assert!((agent.position().x - 6.5).abs() < 1e-9);
        assert_eq!(field.get(0, 2), 0.5);
    }

    #[test]
    fn noise_stays_within_bounds() {
        let mut params = quiet_params();
        params.set_max_noise(15.0);
        params.set_rotate_by(0.0);
        let mut rng = ChaCha12Rng::seed_from_u64(4);
        let mut field = PheromoneField::new(30, 30).unwrap();
        let mut agent = Agent::new(Vector::new(15.0, 15.0), 100.0);
        for _ in 0..50 {
            let before = agent.heading();
            agent.step(&mut field, &params, &mut rng);
            assert!((agent.heading() - before).abs() <= 15.0);
        }
    }
}
