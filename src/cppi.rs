//! # CPPI
//!
//! $$
//! w^{risky}_t=\operatorname{clip}\!\left(m\,\frac{V_t-F_t}{V_t},\,0,\,1\right)
//! $$
//!
//! Constant-proportion portfolio insurance backtest of a risky return series
//! against a safe asset, with an optional peak-ratcheted floor.

use chrono::NaiveDate;
use impl_new_derive::ImplNew;
use ndarray::Array1;

use crate::config::StatsConfig;
use crate::data::AsSeries;
use crate::data::ReturnTable;
use crate::data::Series;
use crate::data::Window;
use crate::error::Result;
use crate::error::StatsError;
use crate::risk::VarMode;
use crate::summary::StatisticsTable;

/// Backtest parameters.
#[derive(ImplNew, Clone, Debug, PartialEq)]
pub struct CppiConfig {
  /// Risk multiplier applied to the cushion.
  pub multiplier: f64,
  /// Starting portfolio value.
  pub account0: f64,
  /// Static floor as a fraction of `account0`.
  pub floor_pct: f64,
  /// Annual safe rate used when no safe series is given.
  pub risk_free_rate: f64,
  /// Maximum drawdown from peak; replaces the static floor when set.
  pub drawdown: Option<f64>,
  /// Annual rate of the benchmark hurdle.
  pub hurdle_rate: f64,
  pub window: Window,
}

impl Default for CppiConfig {
  fn default() -> Self {
    Self {
      multiplier: 4.0,
      account0: 100.0,
      floor_pct: 0.8,
      risk_free_rate: 0.03,
      drawdown: None,
      hurdle_rate: 0.2,
      window: Window::all(),
    }
  }
}

/// State recorded at the end of one period.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CppiStep {
  pub date: NaiveDate,
  /// Portfolio value after the period's returns.
  pub value: f64,
  /// Value of `account0` invested only in the risky asset.
  pub risky_wealth: f64,
  pub hurdle: f64,
  /// Fraction of value above the floor at the start of the period.
  pub cushion: f64,
  pub risky_weight: f64,
  pub peak: f64,
  pub floor: f64,
}

#[derive(Clone, Debug)]
pub struct CppiResult {
  pub steps: Vec<CppiStep>,
  /// Statistics of the managed portfolio's period returns.
  pub managed: StatisticsTable,
  /// Statistics of the risky asset alone.
  pub unconstrained: StatisticsTable,
}

impl CppiResult {
  pub fn values(&self) -> Array1<f64> {
    self.steps.iter().map(|s| s.value).collect()
  }

  pub fn risky_wealth(&self) -> Array1<f64> {
    self.steps.iter().map(|s| s.risky_wealth).collect()
  }

  pub fn final_value(&self) -> Option<f64> {
    self.steps.last().map(|s| s.value)
  }
}

/// Run a CPPI backtest of `risky` inside `cfg.window`.
///
/// Safe returns come from `safe` when given (it must share the windowed risky
/// dates) and are `risk_free_rate / P` otherwise. Missing risky or safe
/// returns count as flat periods.
pub fn simulate<S: AsSeries + ?Sized>(
  risky: &S,
  safe: Option<&Series>,
  cfg: &CppiConfig,
  stats: &StatsConfig,
) -> Result<CppiResult> {
  if !(cfg.account0 > 0.0) {
    return Err(StatsError::InvalidParameter(format!(
      "account0 must be positive, got {}",
      cfg.account0
    )));
  }
  if let Some(dd) = cfg.drawdown {
    if !(0.0..1.0).contains(&dd) {
      return Err(StatsError::InvalidParameter(format!(
        "drawdown constraint must lie in [0, 1), got {dd}"
      )));
    }
  }

  let risky = risky.as_series("cppi")?.window(&cfg.window);
  let ppy = stats.periods_per_year() as f64;
  let safe_r: Vec<f64> = match safe {
    Some(s) => {
      let s = s.window(&cfg.window);
      if s.dates() != risky.dates() {
        return Err(StatsError::ShapeMismatch(format!(
          "safe series {} does not share the risky dates",
          s.name()
        )));
      }
      s.values().to_vec()
    }
    None => vec![cfg.risk_free_rate / ppy; risky.len()],
  };
  let hurdle_step = (1.0 + cfg.hurdle_rate).powf(1.0 / ppy) - 1.0;

  let mut value = cfg.account0;
  let mut risky_wealth = cfg.account0;
  let mut hurdle = cfg.account0;
  let mut peak = cfg.account0;
  let static_floor = cfg.account0 * cfg.floor_pct;
  let mut steps = Vec::with_capacity(risky.len());

  for (t, (&date, &r)) in risky.dates().iter().zip(risky.values().iter()).enumerate() {
    let r = if r.is_nan() { 0.0 } else { r };
    let s = if safe_r[t].is_nan() { 0.0 } else { safe_r[t] };

    peak = peak.max(value);
    let floor = match cfg.drawdown {
      Some(dd) => peak * (1.0 - dd),
      None => static_floor,
    };
    let cushion = (value - floor) / value;
    // NaN clips to fully safe
    let risky_weight = (cfg.multiplier * cushion).clamp(0.0, 1.0);
    let risky_weight = if risky_weight.is_nan() { 0.0 } else { risky_weight };

    let risky_alloc = value * risky_weight;
    let safe_alloc = value - risky_alloc;
    value = risky_alloc * (1.0 + r) + safe_alloc * (1.0 + s);
    risky_wealth *= 1.0 + r;
    hurdle *= 1.0 + hurdle_step;

    steps.push(CppiStep {
      date,
      value,
      risky_wealth,
      hurdle,
      cushion,
      risky_weight,
      peak,
      floor,
    });
  }

  tracing::debug!(
    periods = steps.len(),
    final_value = steps.last().map(|s| s.value),
    "cppi backtest finished"
  );

  let dates = risky.dates().to_vec();
  let managed_r = period_returns(cfg.account0, steps.iter().map(|s| s.value));
  let risky_r = period_returns(cfg.account0, steps.iter().map(|s| s.risky_wealth));
  let managed = StatisticsTable::build(
    &ReturnTable::from_columns(dates.clone(), vec![("CPPI".to_string(), managed_r)])?,
    stats,
    &VarMode::ALL,
  );
  let unconstrained = StatisticsTable::build(
    &ReturnTable::from_columns(dates, vec![(risky.name().to_string(), risky_r)])?,
    stats,
    &VarMode::ALL,
  );

  Ok(CppiResult {
    steps,
    managed,
    unconstrained,
  })
}

fn period_returns(start: f64, values: impl Iterator<Item = f64>) -> Vec<f64> {
  let mut prev = start;
  values
    .map(|v| {
      let r = v / prev - 1.0;
      prev = v;
      r
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;
  use crate::config::Periodicity;
  use crate::data::tests::daily_dates;

  fn risky(values: Vec<f64>) -> Series {
    Series::from_vec("PAR", daily_dates(values.len()), values).unwrap()
  }

  fn stats() -> StatsConfig {
    StatsConfig::new("ROE", Periodicity::Daily)
  }

  fn path() -> Vec<f64> {
    vec![0.02, -0.03, 0.05, -0.08, -0.06, 0.04, 0.01, -0.02, 0.07, -0.01, 0.03, -0.05]
  }

  #[test]
  fn weights_stay_in_unit_interval_and_peaks_ratchet() {
    let cfg = CppiConfig {
      drawdown: Some(0.1),
      ..CppiConfig::default()
    };
    let res = simulate(&risky(path()), None, &cfg, &stats()).unwrap();

    assert_eq!(res.steps.len(), 12);
    for s in &res.steps {
      assert!((0.0..=1.0).contains(&s.risky_weight));
      assert_relative_eq!(s.floor, s.peak * 0.9, epsilon = 1e-12);
    }
    assert!(res.steps.windows(2).all(|w| w[1].peak >= w[0].peak));
  }

  #[test]
  fn static_floor_without_drawdown_constraint() {
    let res = simulate(&risky(path()), None, &CppiConfig::default(), &stats()).unwrap();
    assert!(res.steps.iter().all(|s| s.floor == 80.0));

    // cushion 0.2 with multiplier 4 puts 80% at risk
    let first = res.steps[0];
    assert_relative_eq!(first.cushion, 0.2, epsilon = 1e-12);
    assert_relative_eq!(first.risky_weight, 0.8, epsilon = 1e-12);
  }

  #[test]
  fn breached_floor_fully_derisks() {
    let cfg = CppiConfig::new(10.0, 100.0, 0.99, 0.03, None, 0.2, Window::all());
    let res = simulate(&risky(vec![-0.5, 0.3, 0.2]), None, &cfg, &stats()).unwrap();

    // 10% of 100 at risk loses 5 -> value 95 under the 99 floor
    assert_relative_eq!(res.steps[0].value, 95.0 + 90.0 * 0.03 / 252.0, epsilon = 1e-9);
    assert!(res.steps[1].cushion <= 0.0);
    assert_eq!(res.steps[1].risky_weight, 0.0);
    assert_eq!(res.steps[2].risky_weight, 0.0);
  }

  #[test]
  fn hurdle_compounds_to_annual_rate() {
    let r = vec![0.0; 252];
    let res = simulate(&risky(r), None, &CppiConfig::default(), &stats()).unwrap();
    assert_relative_eq!(res.steps[251].hurdle, 120.0, epsilon = 1e-9);
  }

  #[test]
  fn risky_wealth_ignores_the_floor() {
    let res = simulate(&risky(vec![0.1, -0.1]), None, &CppiConfig::default(), &stats()).unwrap();
    assert_relative_eq!(res.steps[1].risky_wealth, 99.0, epsilon = 1e-12);
    assert_eq!(res.unconstrained.len(), 1);
    assert_eq!(res.managed.row("CPPI").map(|r| r.count), Some(2));
  }

  #[test]
  fn safe_series_must_share_dates() {
    let safe = Series::from_vec("CASH", daily_dates(3), vec![0.0; 3]).unwrap();
    assert!(matches!(
      simulate(&risky(path()), Some(&safe), &CppiConfig::default(), &stats()),
      Err(StatsError::ShapeMismatch(_))
    ));
  }

  #[test]
  fn multi_column_input_is_a_type_mismatch() {
    let table = ReturnTable::from_columns(
      daily_dates(2),
      vec![("A".to_string(), vec![0.0; 2]), ("B".to_string(), vec![0.0; 2])],
    )
    .unwrap();
    assert!(matches!(
      simulate(&table, None, &CppiConfig::default(), &stats()),
      Err(StatsError::TypeMismatch { .. })
    ));
  }
}
