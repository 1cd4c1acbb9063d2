//! Voltage-bracketed measurement ranges.
//!
//! Synthetic measurements need plausible limits and noise levels, both of
//! which depend on the voltage level of the measured equipment. A
//! [`MeasurementRangeSet`] maps a nominal voltage (kV) to a
//! [`MeasurementRange`] carrying the min/max/normal values written into the
//! generated `Analog` objects and the standard deviation used to distort the
//! true value.

use std::f64::consts::PI;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use cgmes_core::{CgmesError, CgmesResult};

/// Limits and noise level for one class of measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRange {
    pub min_value: f64,
    pub max_value: f64,
    pub normal_value: f64,
    /// Standard deviation of the additive gaussian noise.
    pub sigma: f64,
}

impl MeasurementRange {
    /// Adds gaussian noise to `value` and clamps the result into
    /// `[min_value, max_value]`.
    ///
    /// The same rng seed yields the same sequence of distorted values, so
    /// generated datasets are reproducible.
    pub fn distort<R: Rng>(&self, value: f64, rng: &mut R) -> f64 {
        // Box-Muller transform.
        let u1: f64 = rng.gen::<f64>().max(1e-10);
        let u2: f64 = rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        (value + z * self.sigma).clamp(self.min_value, self.max_value)
    }
}

/// One voltage bracket of a range set. `from_kv` is inclusive, `to_kv`
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBracket {
    pub from_kv: f64,
    pub to_kv: f64,
    #[serde(flatten)]
    pub range: MeasurementRange,
}

/// An ordered list of voltage brackets, loaded from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementRangeSet {
    brackets: Vec<RangeBracket>,
}

impl MeasurementRangeSet {
    /// Validates and wraps a list of brackets.
    pub fn new(brackets: Vec<RangeBracket>) -> CgmesResult<Self> {
        for bracket in &brackets {
            if bracket.from_kv > bracket.to_kv {
                return Err(CgmesError::Config(format!(
                    "range bracket [{}, {}) kV is inverted",
                    bracket.from_kv, bracket.to_kv
                )));
            }
            let r = &bracket.range;
            if !(r.min_value <= r.normal_value && r.normal_value <= r.max_value) {
                return Err(CgmesError::Config(format!(
                    "range bracket [{}, {}) kV: expected min <= normal <= max, \
                     got {} / {} / {}",
                    bracket.from_kv, bracket.to_kv, r.min_value, r.normal_value, r.max_value
                )));
            }
            if r.sigma < 0.0 {
                return Err(CgmesError::Config(format!(
                    "range bracket [{}, {}) kV: negative sigma {}",
                    bracket.from_kv, bracket.to_kv, r.sigma
                )));
            }
        }
        Ok(Self { brackets })
    }

    /// Loads a range set from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> CgmesResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let brackets: Vec<RangeBracket> = serde_yaml::from_str(&text)
            .map_err(|e| CgmesError::Config(format!("invalid range file: {e}")))?;
        Self::new(brackets)
    }

    /// Returns the range for `nominal_kv`, if a bracket covers it. Brackets
    /// are checked in order; the first match wins.
    pub fn by_voltage(&self, nominal_kv: f64) -> Option<&MeasurementRange> {
        self.brackets
            .iter()
            .find(|b| nominal_kv >= b.from_kv && nominal_kv < b.to_kv)
            .map(|b| &b.range)
    }

    pub fn brackets(&self) -> &[RangeBracket] {
        &self.brackets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    fn bracket(from_kv: f64, to_kv: f64, range: MeasurementRange) -> RangeBracket {
        RangeBracket { from_kv, to_kv, range }
    }

    fn mid_voltage() -> MeasurementRange {
        MeasurementRange {
            min_value: -50.0,
            max_value: 50.0,
            normal_value: 50.0,
            sigma: 0.5,
        }
    }

    #[test]
    fn brackets_are_half_open() {
        let set = MeasurementRangeSet::new(vec![
            bracket(0.0, 100.0, MeasurementRange {
                min_value: -10.0,
                max_value: 10.0,
                normal_value: 10.0,
                sigma: 0.1,
            }),
            bracket(100.0, 220.0, mid_voltage()),
        ])
        .unwrap();

        assert_eq!(set.by_voltage(110.0), Some(&mid_voltage()));
        assert_eq!(set.by_voltage(100.0), Some(&mid_voltage()));
        assert_eq!(set.by_voltage(99.9).unwrap().max_value, 10.0);
        assert!(set.by_voltage(220.0).is_none());
        assert!(set.by_voltage(380.0).is_none());
    }

    #[test]
    fn inverted_bracket_is_rejected() {
        let err = MeasurementRangeSet::new(vec![bracket(220.0, 100.0, mid_voltage())])
            .unwrap_err();
        assert!(err.to_string().contains("inverted"));
    }

    #[test]
    fn unordered_limits_are_rejected() {
        let err = MeasurementRangeSet::new(vec![bracket(
            0.0,
            100.0,
            MeasurementRange {
                min_value: 10.0,
                max_value: -10.0,
                normal_value: 0.0,
                sigma: 0.1,
            },
        )])
        .unwrap_err();
        assert!(err.to_string().contains("min <= normal <= max"));
    }

    #[test]
    fn negative_sigma_is_rejected() {
        let err = MeasurementRangeSet::new(vec![bracket(
            0.0,
            100.0,
            MeasurementRange {
                min_value: -10.0,
                max_value: 10.0,
                normal_value: 0.0,
                sigma: -1.0,
            },
        )])
        .unwrap_err();
        assert!(err.to_string().contains("negative sigma"));
    }

    #[test]
    fn distortion_is_deterministic_per_seed() {
        let range = mid_voltage();
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let mut c = StdRng::seed_from_u64(7);
        let va = range.distort(10.0, &mut a);
        let vb = range.distort(10.0, &mut b);
        let vc = range.distort(10.0, &mut c);
        assert_eq!(va, vb);
        assert_ne!(va, vc);
    }

    #[test]
    fn distortion_tracks_sigma() {
        // Wide bounds so clamping never kicks in.
        let range = MeasurementRange {
            min_value: -1e6,
            max_value: 1e6,
            normal_value: 0.0,
            sigma: 2.0,
        };
        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| range.distort(100.0, &mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;
        assert!((mean - 100.0).abs() < 0.1, "mean drifted: {mean}");
        assert!((var.sqrt() - 2.0).abs() < 0.1, "std dev off: {}", var.sqrt());
    }

    #[test]
    fn distortion_clamps_to_limits() {
        let range = MeasurementRange {
            min_value: 9.9,
            max_value: 10.1,
            normal_value: 10.0,
            sigma: 100.0,
        };
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let v = range.distort(10.0, &mut rng);
            assert!((9.9..=10.1).contains(&v), "escaped clamp: {v}");
        }
    }

    #[test]
    fn loads_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "- from_kv: 0.0\n  to_kv: 100.0\n  min_value: -10.0\n  max_value: 10.0\n  \
             normal_value: 10.0\n  sigma: 0.1\n\
             - from_kv: 100.0\n  to_kv: 220.0\n  min_value: -50.0\n  max_value: 50.0\n  \
             normal_value: 50.0\n  sigma: 0.5\n"
        )
        .unwrap();

        let set = MeasurementRangeSet::from_yaml_file(file.path()).unwrap();
        assert_eq!(set.brackets().len(), 2);
        assert_eq!(set.by_voltage(110.0).unwrap().sigma, 0.5);
    }
}
