//! # Horizon Calculators
//!
//! $$
//! R_{ann}=(1+R_{cum})^{P/n}-1,\qquad \sigma_{ann}=\sigma\sqrt P
//! $$
//!
//! Cumulative and annualized returns, central tendency and volatility over a
//! return horizon.

use ndarray::ArrayView1;

use super::valid;

/// Return aggregation over a horizon.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReturnMode {
  /// Compound return over the whole horizon.
  #[default]
  Cumulative,
  /// Compound return scaled to one year.
  Annualized,
  /// Arithmetic mean of periodic returns.
  Mean,
  /// Median of periodic returns.
  Median,
}

/// Volatility scale.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum VolatilityMode {
  #[default]
  Periodic,
  Annualized,
}

/// Number of non-missing observations.
pub fn observation_count(r: ArrayView1<'_, f64>) -> usize {
  r.iter().filter(|v| !v.is_nan()).count()
}

/// Compound return computed in log space.
pub fn cumulative_return(r: ArrayView1<'_, f64>) -> f64 {
  r.iter()
    .filter(|v| !v.is_nan())
    .map(|v| v.ln_1p())
    .sum::<f64>()
    .exp_m1()
}

/// Compound return annualized with `periods_per_year`. Horizons shorter than a
/// year are returned unscaled.
pub fn annualized_return(r: ArrayView1<'_, f64>, periods_per_year: usize) -> f64 {
  let days = observation_count(r);
  let exponent = if days >= periods_per_year && days > 0 {
    periods_per_year as f64 / days as f64
  } else {
    1.0
  };

  (1.0 + cumulative_return(r)).powf(exponent) - 1.0
}

pub fn mean(r: ArrayView1<'_, f64>) -> f64 {
  let xs = valid(r);
  if xs.is_empty() {
    return f64::NAN;
  }
  xs.iter().sum::<f64>() / xs.len() as f64
}

pub fn median(r: ArrayView1<'_, f64>) -> f64 {
  let mut xs = valid(r);
  if xs.is_empty() {
    return f64::NAN;
  }

  xs.sort_by(f64::total_cmp);
  let mid = xs.len() / 2;
  if xs.len() % 2 == 0 {
    0.5 * (xs[mid - 1] + xs[mid])
  } else {
    xs[mid]
  }
}

/// Sample standard deviation (n - 1 denominator).
pub fn periodic_volatility(r: ArrayView1<'_, f64>) -> f64 {
  let xs = valid(r);
  if xs.len() < 2 {
    return f64::NAN;
  }

  let m = xs.iter().sum::<f64>() / xs.len() as f64;
  let ss = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>();
  (ss / (xs.len() - 1) as f64).sqrt()
}

pub fn annualized_volatility(r: ArrayView1<'_, f64>, periods_per_year: usize) -> f64 {
  periodic_volatility(r) * (periods_per_year as f64).sqrt()
}

/// Dispatch over [`ReturnMode`].
pub fn horizon_return(r: ArrayView1<'_, f64>, mode: ReturnMode, periods_per_year: usize) -> f64 {
  match mode {
    ReturnMode::Cumulative => cumulative_return(r),
    ReturnMode::Annualized => annualized_return(r, periods_per_year),
    ReturnMode::Mean => mean(r),
    ReturnMode::Median => median(r),
  }
}

/// Dispatch over [`VolatilityMode`].
pub fn horizon_volatility(
  r: ArrayView1<'_, f64>,
  mode: VolatilityMode,
  periods_per_year: usize,
) -> f64 {
  match mode {
    VolatilityMode::Periodic => periodic_volatility(r),
    VolatilityMode::Annualized => annualized_volatility(r, periods_per_year),
  }
}
