use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::encoding::Dataset;
use crate::error::{ChartError, Result};

/// Largest code of the extended encoding (64 * 64 - 1)
pub const MAX_CODE: u16 = 4095;

const SCALE: f64 = MAX_CODE as f64;

/// Data min/max used to scale every dataset of one chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Global min/max over every present value of every dataset.
    /// Datasets without values are ignored; if none has any, the range
    /// cannot be inferred.
    pub fn from_datasets(datasets: &[Dataset]) -> Result<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for value in datasets.iter().flatten().flatten() {
            if *value < min {
                min = *value;
            }
            if *value > max {
                max = *value;
            }
        }

        if min == f64::INFINITY {
            return Err(ChartError::EmptyData);
        }

        debug!(min, max, "inferred data range");
        Ok(Self { min, max })
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// How single-sign ranges are mapped onto the code space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Baseline {
    /// `min -> 0` and `max -> 4095` whatever the signs of the bounds
    #[default]
    Extent,
    /// Single-sign ranges are anchored at zero: all-positive data scales by
    /// `value / max`, all-negative data by `value / min`. Mixed-sign ranges
    /// scale over their extent. This is the legacy chart-tag behaviour, under
    /// which `[10, 20, 30]` encodes as `VVqq..`.
    Zero,
}

/// Map `value` into `0..=4095`.
///
/// Rounds half away from zero. Values outside the range are clamped.
pub fn normalize(value: f64, range: &ValueRange, baseline: Baseline) -> Result<u16> {
    let ValueRange { min, max } = *range;

    let code = match baseline {
        Baseline::Zero if min >= 0.0 => {
            if max == 0.0 {
                return Err(ChartError::DegenerateRange { min, max });
            }
            (value / max * SCALE).round()
        }
        Baseline::Zero if max <= 0.0 => SCALE - (value * SCALE / min).round(),
        _ => {
            if max == min || !(max - min).is_finite() {
                return Err(ChartError::DegenerateRange { min, max });
            }
            ((value - min) * SCALE / (max - min)).round()
        }
    };

    Ok(code.clamp(0.0, SCALE) as u16)
}

/// Inverse of [`normalize`]: the value at the center of code `code`.
pub fn denormalize(code: u16, range: &ValueRange, baseline: Baseline) -> f64 {
    let ValueRange { min, max } = *range;
    let code = f64::from(code.min(MAX_CODE));

    match baseline {
        Baseline::Zero if min >= 0.0 => code / SCALE * max,
        Baseline::Zero if max <= 0.0 => (SCALE - code) * min / SCALE,
        _ => min + code * (max - min) / SCALE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: f64, max: f64) -> ValueRange {
        ValueRange::new(min, max)
    }

    #[test]
    fn test_range_from_datasets() {
        let datasets = vec![vec![Some(10.0), Some(20.0)], vec![], vec![None, Some(30.0), Some(-5.0)]];
        let r = ValueRange::from_datasets(&datasets).unwrap();
        assert_eq!(r, range(-5.0, 30.0));
    }

    #[test]
    fn test_range_from_empty_datasets_fails() {
        assert_eq!(ValueRange::from_datasets(&[]), Err(ChartError::EmptyData));
        assert_eq!(
            ValueRange::from_datasets(&[vec![], vec![None, None]]),
            Err(ChartError::EmptyData)
        );
    }

    #[test]
    fn test_endpoints_extent_all_regimes() {
        for r in [range(10.0, 30.0), range(-30.0, -10.0), range(-7.0, 12.0)] {
            assert_eq!(normalize(r.min, &r, Baseline::Extent).unwrap(), 0);
            assert_eq!(normalize(r.max, &r, Baseline::Extent).unwrap(), MAX_CODE);
        }
    }

    #[test]
    fn test_zero_baseline_positive() {
        let r = range(10.0, 30.0);
        assert_eq!(normalize(30.0, &r, Baseline::Zero).unwrap(), 4095);
        // 10 / 30 * 4095 = 1365
        assert_eq!(normalize(10.0, &r, Baseline::Zero).unwrap(), 1365);
        assert_eq!(normalize(0.0, &r, Baseline::Zero).unwrap(), 0);
    }

    #[test]
    fn test_zero_baseline_negative() {
        let r = range(-40.0, -10.0);
        assert_eq!(normalize(-40.0, &r, Baseline::Zero).unwrap(), 0);
        // 4095 - round(-10 * 4095 / -40) = 4095 - 1024
        assert_eq!(normalize(-10.0, &r, Baseline::Zero).unwrap(), 3071);
    }

    #[test]
    fn test_zero_baseline_mixed_matches_extent() {
        let r = range(-10.0, 30.0);
        for value in [-10.0, -3.0, 0.0, 12.5, 30.0] {
            assert_eq!(
                normalize(value, &r, Baseline::Zero).unwrap(),
                normalize(value, &r, Baseline::Extent).unwrap()
            );
        }
    }

    #[test]
    fn test_rounding_half_up_at_boundary() {
        // 1 * 4095 / 8190 = 0.5 exactly
        let r = range(0.0, 8190.0);
        assert_eq!(normalize(1.0, &r, Baseline::Extent).unwrap(), 1);
        // 3 * 4095 / 8190 = 1.5
        assert_eq!(normalize(3.0, &r, Baseline::Extent).unwrap(), 2);
    }

    #[test]
    fn test_monotonic() {
        let r = range(-3.0, 7.0);
        let mut last = 0;
        for i in -30..=70 {
            let code = normalize(f64::from(i) / 10.0, &r, Baseline::Extent).unwrap();
            assert!(code >= last);
            last = code;
        }
    }

    #[test]
    fn test_out_of_range_clamped() {
        let r = range(0.0, 10.0);
        assert_eq!(normalize(20.0, &r, Baseline::Extent).unwrap(), 4095);
        assert_eq!(normalize(-5.0, &r, Baseline::Extent).unwrap(), 0);
    }

    #[test]
    fn test_degenerate_ranges() {
        assert_eq!(
            normalize(5.0, &range(5.0, 5.0), Baseline::Extent),
            Err(ChartError::DegenerateRange { min: 5.0, max: 5.0 })
        );
        assert_eq!(
            normalize(0.0, &range(0.0, 0.0), Baseline::Zero),
            Err(ChartError::DegenerateRange { min: 0.0, max: 0.0 })
        );
        // zero-anchored positive data only needs a non-zero max
        assert_eq!(normalize(5.0, &range(5.0, 5.0), Baseline::Zero).unwrap(), 4095);
    }

    #[test]
    fn test_denormalize_inverts_normalize() {
        let r = range(12.0, 96.0);
        for baseline in [Baseline::Extent, Baseline::Zero] {
            for value in [12.0, 40.0, 77.7, 96.0] {
                let code = normalize(value, &r, baseline).unwrap();
                let back = denormalize(code, &r, baseline);
                assert!((back - value).abs() <= 96.0 / 4095.0);
            }
        }
    }
}
