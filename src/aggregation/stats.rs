//! Robust location/spread estimates and the outlier rule built on them.

use serde::{Deserialize, Serialize};

/// Minimum number of values for which outliers are ever reported.
pub const MIN_OUTLIER_SAMPLE: usize = 3;

/// Median of `values`, or `None` if empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(median_of_sorted(&sorted))
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Median absolute deviation from `center`.
pub fn median_absolute_deviation(values: &[f64], center: f64) -> Option<f64> {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

/// Mean absolute deviation from `center`.
pub fn mean_absolute_deviation(values: &[f64], center: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let total: f64 = values.iter().map(|v| (v - center).abs()).sum();
    Some(total / values.len() as f64)
}

/// Modified z-score outlier rule.
///
/// The center is the median. The spread is `mad_scale * MAD`, which estimates the standard
/// deviation of normally distributed data. When more than half of the values coincide the MAD is
/// zero, and the spread falls back to `mean_ad_scale * mean absolute deviation`. A value is an
/// outlier when its distance from the center exceeds `threshold` spreads. A zero spread means all
/// values are identical and nothing is flagged.
///
/// Under the fallback, a single value deviating from `n - 1` identical ones scores exactly
/// `n / mean_ad_scale` however far away it is. With the default constants it is flagged only when
/// `n >= 5`: `[5, 5, 5, 1000]` reports nothing while `[5, 5, 5, 5, 1000]` flags the last value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierRule {
    /// Number of spreads beyond which a value is an outlier.
    pub threshold: f64,
    /// Consistency constant applied to the median absolute deviation.
    pub mad_scale: f64,
    /// Consistency constant applied to the mean absolute deviation fallback.
    pub mean_ad_scale: f64,
}

impl Default for OutlierRule {
    fn default() -> Self {
        Self {
            threshold: 3.5,
            mad_scale: 1.4826,
            mean_ad_scale: 1.2533,
        }
    }
}

impl OutlierRule {
    /// Center and spread of `values`, or `None` when there are too few values to judge.
    pub fn bounds(&self, values: &[f64]) -> Option<(f64, f64)> {
        if values.len() < MIN_OUTLIER_SAMPLE {
            return None;
        }
        let center = median(values)?;
        let mad = median_absolute_deviation(values, center)?;
        let spread = if mad > 0.0 {
            self.mad_scale * mad
        } else {
            self.mean_ad_scale * mean_absolute_deviation(values, center)?
        };
        Some((center, spread))
    }

    /// Positions in `values` that are outliers.
    pub fn outlier_positions(&self, values: &[f64]) -> Vec<usize> {
        let Some((center, spread)) = self.bounds(values) else {
            return Vec::new();
        };
        if spread <= 0.0 {
            return Vec::new();
        }
        values
            .iter()
            .enumerate()
            .filter(|(_, v)| (*v - center).abs() / spread > self.threshold)
            .map(|(i, _)| i)
            .collect()
    }
}
