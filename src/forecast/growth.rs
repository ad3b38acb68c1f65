//! Growth-rate strategies for elderly population projection
//!
//! A strategy turns a district's observed history (or its supplied rate) into
//! a single annual fractional growth rate used for compounding.

use crate::district::DistrictRecord;
use serde::{Deserialize, Serialize};

/// How the annual growth rate of a district is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStrategy {
    /// Use the supplied `growth_rate`; districts without one are excluded
    Explicit,
    /// (last / first)^(1 / years) - 1 over the observed span
    CompoundAverage,
    /// Arithmetic mean of the annualised change between consecutive observations
    MeanAnnualChange,
    /// Least-squares slope over observed years divided by the fitted latest value
    LinearTrend,
    /// Supplied rate when present, otherwise compound average
    #[default]
    Auto,
}

/// A resolved growth rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthEstimate {
    pub rate: f64,
    /// Goodness of fit, only for `LinearTrend`
    pub fit_r2: Option<f64>,
}

impl GrowthEstimate {
    fn plain(rate: f64) -> Self {
        Self { rate, fit_r2: None }
    }
}

/// Why a growth rate could not be resolved
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GrowthError {
    #[error("no growth rate supplied")]
    NotSupplied,
    #[error("need at least two observed years, found {observed}")]
    InsufficientHistory { observed: usize },
    #[error("observed history contains a zero population")]
    NonPositiveHistory,
    #[error("growth rate {0} is not finite")]
    NonFinite(f64),
    #[error("growth rate {0} is not above -1")]
    BelowFloor(f64),
}

impl GrowthStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            GrowthStrategy::Explicit => "explicit",
            GrowthStrategy::CompoundAverage => "compound_average",
            GrowthStrategy::MeanAnnualChange => "mean_annual_change",
            GrowthStrategy::LinearTrend => "linear_trend",
            GrowthStrategy::Auto => "auto",
        }
    }

    /// Resolve the growth rate for a district
    pub fn estimate(&self, district: &DistrictRecord) -> Result<GrowthEstimate, GrowthError> {
        let estimate = match self {
            GrowthStrategy::Explicit => GrowthEstimate::plain(district.growth_rate.ok_or(GrowthError::NotSupplied)?),
            GrowthStrategy::CompoundAverage => GrowthEstimate::plain(compound_average(&district.history())?),
            GrowthStrategy::MeanAnnualChange => GrowthEstimate::plain(mean_annual_change(&district.history())?),
            GrowthStrategy::LinearTrend => linear_trend(&district.history())?,
            GrowthStrategy::Auto => match district.growth_rate {
                Some(rate) => GrowthEstimate::plain(rate),
                None => GrowthEstimate::plain(compound_average(&district.history())?),
            },
        };
        check_rate(estimate.rate)?;
        Ok(estimate)
    }
}

fn check_rate(rate: f64) -> Result<(), GrowthError> {
    if !rate.is_finite() {
        return Err(GrowthError::NonFinite(rate));
    }
    if rate <= -1.0 {
        return Err(GrowthError::BelowFloor(rate));
    }
    Ok(())
}

fn require_history(history: &[(i32, f64)]) -> Result<(), GrowthError> {
    if history.len() < 2 {
        return Err(GrowthError::InsufficientHistory { observed: history.len() });
    }
    Ok(())
}

/// Compound annual growth between the first and last observation
pub fn compound_average(history: &[(i32, f64)]) -> Result<f64, GrowthError> {
    require_history(history)?;
    let (first_year, first) = history[0];
    let (last_year, last) = history[history.len() - 1];
    if first <= 0.0 {
        return Err(GrowthError::NonPositiveHistory);
    }
    let years = (last_year - first_year) as f64;
    Ok((last / first).powf(1.0 / years) - 1.0)
}

/// Mean of annualised changes between consecutive observations
pub fn mean_annual_change(history: &[(i32, f64)]) -> Result<f64, GrowthError> {
    require_history(history)?;
    let mut total = 0.0;
    for pair in history.windows(2) {
        let (y0, p0) = pair[0];
        let (y1, p1) = pair[1];
        if p0 <= 0.0 {
            return Err(GrowthError::NonPositiveHistory);
        }
        total += (p1 / p0).powf(1.0 / (y1 - y0) as f64) - 1.0;
    }
    Ok(total / (history.len() - 1) as f64)
}

/// Ordinary least squares over (year, population); rate is slope relative to the fitted latest value
pub fn linear_trend(history: &[(i32, f64)]) -> Result<GrowthEstimate, GrowthError> {
    require_history(history)?;
    let n = history.len() as f64;
    let mean_x = history.iter().map(|&(y, _)| y as f64).sum::<f64>() / n;
    let mean_y = history.iter().map(|&(_, p)| p).sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for &(year, pop) in history {
        let dx = year as f64 - mean_x;
        sxy += dx * (pop - mean_y);
        sxx += dx * dx;
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let fitted = |year: i32| intercept + slope * year as f64;
    let last_year = history[history.len() - 1].0;
    let fitted_last = fitted(last_year);
    if fitted_last <= 0.0 {
        return Err(GrowthError::NonPositiveHistory);
    }

    let ss_tot: f64 = history.iter().map(|&(_, p)| (p - mean_y).powi(2)).sum();
    let ss_res: f64 = history.iter().map(|&(y, p)| (p - fitted(y)).powi(2)).sum();
    let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

    Ok(GrowthEstimate {
        rate: slope / fitted_last,
        fit_r2: Some(r2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn steady() -> DistrictRecord {
        // 10% a year, every year
        DistrictRecord::new("D1", 0)
            .with_population(2020, 10_000)
            .with_population(2021, 11_000)
            .with_population(2022, 12_100)
    }

    #[test]
    fn test_compound_average() {
        let est = GrowthStrategy::CompoundAverage.estimate(&steady()).unwrap();
        assert_relative_eq!(est.rate, 0.10, epsilon = 1e-12);
        assert_eq!(est.fit_r2, None);
    }

    #[test]
    fn test_mean_annual_change_annualises_gaps() {
        let d = DistrictRecord::new("D1", 0)
            .with_population(2020, 10_000)
            .with_population(2022, 12_100)
            .with_population(2023, 13_310);
        let rate = GrowthStrategy::MeanAnnualChange.estimate(&d).unwrap().rate;
        assert_relative_eq!(rate, 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_linear_trend_perfect_line() {
        let d = DistrictRecord::new("D1", 0)
            .with_population(2020, 1_000)
            .with_population(2021, 1_100)
            .with_population(2022, 1_200);
        let est = GrowthStrategy::LinearTrend.estimate(&d).unwrap();
        assert_relative_eq!(est.rate, 100.0 / 1_200.0, epsilon = 1e-12);
        assert_relative_eq!(est.fit_r2.unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_linear_trend_rate_is_relative_to_fitted_latest_year() {
        // slope 100, fitted 2024 value 3,800 / 3, observed 2024 value 1,200
        let d = DistrictRecord::new("D1", 0)
            .with_population(2022, 1_000)
            .with_population(2023, 1_300)
            .with_population(2024, 1_200);
        let est = GrowthStrategy::LinearTrend.estimate(&d).unwrap();
        assert_relative_eq!(est.rate, 3.0 / 38.0, epsilon = 1e-12);
    }

    #[test]
    fn test_explicit_requires_supplied_rate() {
        assert_eq!(
            GrowthStrategy::Explicit.estimate(&steady()),
            Err(GrowthError::NotSupplied)
        );
        let d = steady().with_growth_rate(0.02);
        assert_eq!(GrowthStrategy::Explicit.estimate(&d).unwrap().rate, 0.02);
    }

    #[test]
    fn test_auto_prefers_supplied_rate() {
        let supplied = steady().with_growth_rate(0.02);
        assert_eq!(GrowthStrategy::Auto.estimate(&supplied).unwrap().rate, 0.02);
        assert_relative_eq!(GrowthStrategy::Auto.estimate(&steady()).unwrap().rate, 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_unusable_rates() {
        let nan = steady().with_growth_rate(f64::NAN);
        assert!(matches!(GrowthStrategy::Auto.estimate(&nan), Err(GrowthError::NonFinite(_))));

        let collapse = steady().with_growth_rate(-1.0);
        assert_eq!(GrowthStrategy::Auto.estimate(&collapse), Err(GrowthError::BelowFloor(-1.0)));

        let single = DistrictRecord::new("D1", 0).with_population(2024, 500);
        assert_eq!(
            GrowthStrategy::CompoundAverage.estimate(&single),
            Err(GrowthError::InsufficientHistory { observed: 1 })
        );

        let zero_start = DistrictRecord::new("D1", 0)
            .with_population(2023, 0)
            .with_population(2024, 500);
        assert_eq!(
            GrowthStrategy::CompoundAverage.estimate(&zero_start),
            Err(GrowthError::NonPositiveHistory)
        );
    }
}
