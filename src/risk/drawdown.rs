//! # Drawdown
//!
//! $$
//! W_t=100\prod_{s\le t}(1+r_s),\qquad P_t=\max\left(100,\max_{s\le t}W_s\right),\qquad DD_t=\frac{W_t}{P_t}-1
//! $$
//!
//! The anchor row at 100 takes part in the running peak, so an opening loss
//! counts as a drawdown.

use chrono::NaiveDate;

use crate::config::Periodicity;
use crate::data::Series;

/// Base value of the wealth index.
pub const WEALTH_BASE: f64 = 100.0;

/// Wealth index, running peak and drawdown of one return series.
///
/// Row 0 is a synthetic anchor one period before the first valid observation
/// with wealth = peak = 100 and drawdown = 0.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawdownSeries {
  pub dates: Vec<NaiveDate>,
  pub wealth: Vec<f64>,
  pub peaks: Vec<f64>,
  pub drawdown: Vec<f64>,
}

impl DrawdownSeries {
  pub fn len(&self) -> usize {
    self.dates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.dates.is_empty()
  }

  /// Most negative drawdown, or `NaN` for an empty series.
  pub fn max_drawdown(&self) -> f64 {
    self.trough().map_or(f64::NAN, |i| self.drawdown[i])
  }

  /// Date of the most negative drawdown (first occurrence on ties).
  pub fn max_drawdown_date(&self) -> Option<NaiveDate> {
    self.trough().map(|i| self.dates[i])
  }

  fn trough(&self) -> Option<usize> {
    // anchor row excluded
    let mut best: Option<usize> = None;
    for i in 1..self.drawdown.len() {
      let d = self.drawdown[i];
      if d.is_nan() {
        continue;
      }
      if best.map_or(true, |b| d < self.drawdown[b]) {
        best = Some(i);
      }
    }
    best
  }
}

/// Drawdown trace of `series`, compounding from a base of 100.
///
/// Missing returns are skipped; compounding continues across gaps.
pub fn drawdowns(series: &Series, periodicity: Periodicity) -> DrawdownSeries {
  let clean = series.dropna();
  let mut out = DrawdownSeries {
    dates: Vec::with_capacity(clean.len() + 1),
    wealth: Vec::with_capacity(clean.len() + 1),
    peaks: Vec::with_capacity(clean.len() + 1),
    drawdown: Vec::with_capacity(clean.len() + 1),
  };

  let Some(&first) = clean.dates().first() else {
    return out;
  };

  out.dates.push(periodicity.previous_period(first));
  out.wealth.push(WEALTH_BASE);
  out.peaks.push(WEALTH_BASE);
  out.drawdown.push(0.0);

  let mut wealth = WEALTH_BASE;
  let mut peak = WEALTH_BASE;
  for (date, r) in clean.dates().iter().zip(clean.values().iter()) {
    wealth *= 1.0 + r;
    peak = peak.max(wealth);
    out.dates.push(*date);
    out.wealth.push(wealth);
    out.peaks.push(peak);
    out.drawdown.push(wealth / peak - 1.0);
  }

  out
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;
  use crate::data::tests::daily_dates;

  #[test]
  fn matches_hand_computed_trace() {
    let dates = daily_dates(4);
    let s = Series::from_vec("PAR", dates.clone(), vec![0.1, -0.2, 0.05, 0.1]).unwrap();
    let dd = drawdowns(&s, Periodicity::Daily);

    // 110, 88, 92.4, 101.64 ; peak stays 110
    assert_eq!(dd.len(), 5);
    assert_relative_eq!(dd.wealth[1], 110.0, epsilon = 1e-9);
    assert_relative_eq!(dd.wealth[2], 88.0, epsilon = 1e-9);
    assert_relative_eq!(dd.wealth[3], 92.4, epsilon = 1e-9);
    assert_relative_eq!(dd.peaks[4], 110.0, epsilon = 1e-9);
    assert_relative_eq!(dd.max_drawdown(), -0.2, epsilon = 1e-12);
    assert_eq!(dd.max_drawdown_date(), Some(dates[1]));
  }

  #[test]
  fn anchor_row_precedes_first_observation() {
    let dates = daily_dates(3);
    let s = Series::from_vec("PAR", dates.clone(), vec![f64::NAN, 0.02, -0.01]).unwrap();
    let dd = drawdowns(&s, Periodicity::Daily);

    assert_eq!(dd.dates[0], dates[0]);
    assert_eq!(dd.dates[1], dates[1]);
    assert_eq!(dd.wealth[0], 100.0);
    assert_eq!(dd.peaks[0], 100.0);
    assert_eq!(dd.drawdown[0], 0.0);
  }

  #[test]
  fn drawdown_is_never_positive_and_peaks_never_fall() {
    let r = vec![0.03, -0.05, 0.02, 0.04, -0.10, 0.01, 0.12, -0.02];
    let s = Series::from_vec("PAR", daily_dates(r.len()), r).unwrap();
    let dd = drawdowns(&s, Periodicity::Daily);

    assert!(dd.drawdown.iter().all(|d| *d <= 0.0));
    assert!(dd.peaks.windows(2).all(|w| w[1] >= w[0]));
  }

  #[test]
  fn opening_loss_is_measured_from_the_anchor() {
    let dates = daily_dates(3);
    let s = Series::from_vec("PAR", dates.clone(), vec![-0.1, 0.05, -0.02]).unwrap();
    let dd = drawdowns(&s, Periodicity::Daily);

    assert_eq!(dd.peaks, vec![100.0; 4]);
    assert!(dd.peaks.windows(2).all(|w| w[1] >= w[0]));
    assert_relative_eq!(dd.drawdown[1], -0.1, epsilon = 1e-12);
    assert_relative_eq!(dd.max_drawdown(), -0.1, epsilon = 1e-12);
    assert_eq!(dd.max_drawdown_date(), Some(dates[0]));
  }

  #[test]
  fn ties_report_first_trough() {
    let dates = daily_dates(4);
    let s = Series::from_vec("PAR", dates.clone(), vec![0.0, -0.5, 1.0, -0.5]).unwrap();
    let dd = drawdowns(&s, Periodicity::Daily);
    assert_eq!(dd.max_drawdown(), -0.5);
    assert_eq!(dd.max_drawdown_date(), Some(dates[1]));
  }

  #[test]
  fn empty_series_has_no_trace() {
    let s = Series::from_vec("PAR", daily_dates(2), vec![f64::NAN, f64::NAN]).unwrap();
    let dd = drawdowns(&s, Periodicity::Daily);
    assert!(dd.is_empty());
    assert!(dd.max_drawdown().is_nan());
    assert_eq!(dd.max_drawdown_date(), None);
  }
}
