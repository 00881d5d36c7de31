use serde::{Deserialize, Serialize};

/// Running mean and variance (Welford's algorithm).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
    max: f64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub n_vals: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub max: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;

        self.max = self.max.max(val);
    }

    /// Summary of the values seen so far. Statistics without enough samples are NaN.
    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            n_vals: self.n_vals,
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
            max: if self.n_vals > 0 { self.max } else { f64::NAN },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_two_pass_statistics() {
        let vals = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut acc = Accumulator::new();
        vals.iter().for_each(|&v| acc.add(v));
        let report = acc.report();
        assert_eq!(report.n_vals, 8);
        assert!((report.mean - 5.0).abs() < 1e-12);
        assert!((report.std_dev - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(report.max, 9.0);
    }

    #[test]
    fn empty_and_single_reports() {
        let mut acc = Accumulator::new();
        assert!(acc.report().mean.is_nan());
        acc.add(1.5);
        let report = acc.report();
        assert_eq!(report.mean, 1.5);
        assert!(report.std_dev.is_nan());
    }
}
