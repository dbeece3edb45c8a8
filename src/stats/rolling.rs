//! # Rolling Windows
//!
//! $$
//! f_t = f\big(r_{t-w+1},\dots,r_t\big)
//! $$
//!
//! Trailing and expanding application of any single-series calculator, and the
//! trailing average pairwise correlation of a group against a market's trailing
//! annualized return.

use chrono::NaiveDate;
use ndarray::Array1;
use ndarray::ArrayView1;

use super::annualized_return;
use crate::data::ReturnTable;
use crate::data::Series;
use crate::error::Result;
use crate::error::StatsError;

/// Apply `f` over each trailing window of `window` periods.
///
/// The first `window - 1` points are `NaN`, as is any window holding a missing
/// observation.
pub fn rolling<F>(series: &Series, window: usize, f: F) -> Result<Series>
where
  F: Fn(ArrayView1<'_, f64>) -> f64,
{
  if window == 0 {
    return Err(StatsError::InvalidParameter(
      "rolling window must be positive".to_string(),
    ));
  }

  let v = series.values();
  let n = v.len();
  let mut out = Array1::<f64>::from_elem(n, f64::NAN);

  for t in (window.saturating_sub(1))..n {
    let w = v.slice(ndarray::s![t + 1 - window..=t]);
    if w.iter().all(|x| !x.is_nan()) {
      out[t] = f(w);
    }
  }

  Series::new(series.name(), series.dates().to_vec(), out)
}

/// Apply `f` over the expanding window `[0, t]` once it holds `min_periods`
/// valid observations.
pub fn expanding<F>(series: &Series, min_periods: usize, f: F) -> Result<Series>
where
  F: Fn(ArrayView1<'_, f64>) -> f64,
{
  let v = series.values();
  let n = v.len();
  let mut out = Array1::<f64>::from_elem(n, f64::NAN);
  let mut seen = 0usize;

  for t in 0..n {
    if !v[t].is_nan() {
      seen += 1;
    }
    if seen >= min_periods.max(1) {
      out[t] = f(v.slice(ndarray::s![..=t]));
    }
  }

  Series::new(series.name(), series.dates().to_vec(), out)
}

fn pearson(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
  let n = x.len() as f64;
  let mx = x.sum() / n;
  let my = y.sum() / n;

  let mut cov = 0.0;
  let mut sx = 0.0;
  let mut sy = 0.0;
  for (a, b) in x.iter().zip(y.iter()) {
    let dx = a - mx;
    let dy = b - my;
    cov += dx * dy;
    sx += dx * dx;
    sy += dy * dy;
  }

  cov / (sx * sy).sqrt()
}

/// Trailing average correlation of a group against a market's trailing return.
#[derive(Clone, Debug)]
pub struct AverageCorrelation {
  /// Dates where both trailing series are defined.
  pub dates: Vec<NaiveDate>,
  /// Mean of the trailing pairwise correlation matrix (diagonal included).
  pub average_correlation: Vec<f64>,
  /// Trailing annualized return of the market series.
  pub market_return: Vec<f64>,
  /// Correlation between the two trailing series.
  pub correlation: f64,
}

/// Trailing-window average pairwise correlation of `group` paired with the
/// trailing annualized return of `market`.
///
/// `market` must share the group's date index. Rows where every group member
/// is missing are discarded first.
pub fn average_correlation(
  group: &ReturnTable,
  market: &Series,
  window: usize,
  periods_per_year: usize,
) -> Result<AverageCorrelation> {
  if market.dates() != group.dates() {
    return Err(StatsError::ShapeMismatch(format!(
      "market series {} does not share the group's date index",
      market.name()
    )));
  }
  if window < 2 {
    return Err(StatsError::InvalidParameter(
      "correlation window needs at least two periods".to_string(),
    ));
  }

  let keep: Vec<usize> = (0..group.nrows())
    .filter(|&i| group.values().row(i).iter().any(|v| !v.is_nan()))
    .collect();
  let values = group.values().select(ndarray::Axis(0), &keep);
  let mkt: Array1<f64> = keep.iter().map(|&i| market.values()[i]).collect();
  let trailing = rolling(
    &Series::new(market.name(), keep.iter().map(|&i| group.dates()[i]).collect(), mkt)?,
    window,
    |w| annualized_return(w, periods_per_year),
  )?;

  let n_cols = values.ncols();
  let mut out = AverageCorrelation {
    dates: Vec::new(),
    average_correlation: Vec::new(),
    market_return: Vec::new(),
    correlation: f64::NAN,
  };

  for t in (window - 1)..values.nrows() {
    let block = values.slice(ndarray::s![t + 1 - window..=t, ..]);
    let mut acc = 0.0;
    let mut count = 0usize;

    for i in 0..n_cols {
      for j in 0..n_cols {
        let (x, y) = (block.column(i), block.column(j));
        if x.iter().chain(y.iter()).any(|v| v.is_nan()) {
          continue;
        }
        let c = if i == j { 1.0 } else { pearson(x, y) };
        if !c.is_nan() {
          acc += c;
          count += 1;
        }
      }
    }

    let avg = if count > 0 { acc / count as f64 } else { f64::NAN };
    let m = trailing.values()[t];
    if !avg.is_nan() && !m.is_nan() {
      out.dates.push(trailing.dates()[t]);
      out.average_correlation.push(avg);
      out.market_return.push(m);
    }
  }

  if out.dates.len() >= 2 {
    out.correlation = pearson(
      ArrayView1::from(&out.average_correlation[..]),
      ArrayView1::from(&out.market_return[..]),
    );
  }

  Ok(out)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use approx::assert_relative_eq;

  use super::*;
  use crate::data::tests::daily_dates;
  use crate::stats::cumulative_return;
  use crate::stats::periodic_volatility;

  fn series(values: Vec<f64>) -> Series {
    Series::from_vec("PAR", daily_dates(values.len()), values).unwrap()
  }

  #[test]
  fn rolling_fills_warmup_with_nan() {
    let s = series(vec![0.1, 0.2, 0.3, 0.4]);
    let out = rolling(&s, 2, cumulative_return).unwrap();
    let v = out.values();

    assert!(v[0].is_nan());
    assert_relative_eq!(v[1], 1.1 * 1.2 - 1.0, epsilon = 1e-12);
    assert_relative_eq!(v[3], 1.3 * 1.4 - 1.0, epsilon = 1e-12);
  }

  #[test]
  fn rolling_window_with_gap_is_nan() {
    let s = series(vec![0.1, f64::NAN, 0.3, 0.4]);
    let out = rolling(&s, 2, cumulative_return).unwrap();
    assert!(out.values()[1].is_nan());
    assert!(out.values()[2].is_nan());
    assert!(!out.values()[3].is_nan());
  }

  #[test]
  fn rolling_rejects_zero_window() {
    let s = series(vec![0.1]);
    assert!(matches!(
      rolling(&s, 0, cumulative_return),
      Err(StatsError::InvalidParameter(_))
    ));
  }

  #[test]
  fn expanding_waits_for_min_periods() {
    let s = series(vec![0.01, 0.03, 0.02, 0.04]);
    let out = expanding(&s, 3, periodic_volatility).unwrap();
    let v = out.values();

    assert!(v[0].is_nan() && v[1].is_nan());
    assert_relative_eq!(
      v[3],
      periodic_volatility(ndarray::aview1(&[0.01, 0.03, 0.02, 0.04])),
      epsilon = 1e-15
    );
  }

  #[test]
  fn perfectly_correlated_group_averages_to_one() {
    let dates = daily_dates(6);
    let a = vec![0.01, -0.02, 0.03, 0.01, -0.01, 0.02];
    let b: Vec<f64> = a.iter().map(|x| 2.0 * x + 0.001).collect();
    let group = ReturnTable::from_columns(
      dates.clone(),
      vec![("A".to_string(), a.clone()), ("B".to_string(), b)],
    )
    .unwrap();
    let market = Series::from_vec("SP500", dates, a).unwrap();

    let res = average_correlation(&group, &market, 3, 252).unwrap();
    assert_eq!(res.dates.len(), 4);
    for c in &res.average_correlation {
      assert_abs_diff_eq!(*c, 1.0, epsilon = 1e-9);
    }
  }

  #[test]
  fn average_correlation_requires_shared_index() {
    let group = ReturnTable::from_columns(daily_dates(3), vec![("A".to_string(), vec![0.0; 3])])
      .unwrap();
    let market = Series::from_vec("M", daily_dates(2), vec![0.0; 2]).unwrap();
    assert!(matches!(
      average_correlation(&group, &market, 2, 252),
      Err(StatsError::ShapeMismatch(_))
    ));
  }
}
