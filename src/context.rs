//! # Session Context
//!
//! A full return table, its session parameters and the active analysis window.
//! Queries read the active window; the underlying table is never mutated.

use chrono::NaiveDate;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;

use crate::config::StatsConfig;
use crate::cppi;
use crate::cppi::CppiConfig;
use crate::cppi::CppiResult;
use crate::data::ReturnTable;
use crate::data::Series;
use crate::data::Window;
use crate::error::Result;
use crate::error::StatsError;
use crate::portfolio;
use crate::portfolio::MarkowitzSpace;
use crate::portfolio::OptimizationResult;
use crate::risk;
use crate::risk::DrawdownSeries;
use crate::risk::VarMode;
use crate::stats;
use crate::stats::rolling::AverageCorrelation;
use crate::stats::JarqueBeraOutcome;
use crate::stats::ReturnMode;
use crate::stats::VolatilityMode;
use crate::stochastic::GbmConfig;
use crate::summary::StatisticsTable;

#[derive(Clone, Debug)]
pub struct StatsContext {
  table: ReturnTable,
  config: StatsConfig,
  window: Window,
}

impl StatsContext {
  pub fn new(table: ReturnTable, config: StatsConfig) -> Self {
    tracing::debug!(
      name = %config.name,
      columns = table.ncols(),
      rows = table.nrows(),
      periodicity = %config.periodicity,
      "stats context created"
    );
    Self {
      table,
      config,
      window: Window::all(),
    }
  }

  /// The full, unwindowed table.
  pub fn table(&self) -> &ReturnTable {
    &self.table
  }

  pub fn config(&self) -> &StatsConfig {
    &self.config
  }

  pub fn window(&self) -> Window {
    self.window
  }

  pub fn set_window(&mut self, window: Window) {
    self.window = window;
  }

  pub fn set_risk_free_rate(&mut self, rate: f64) {
    self.config.risk_free_rate = rate;
  }

  /// Set the VaR tail probability as a fraction in (0, 1).
  pub fn set_var_level(&mut self, level: f64) -> Result<()> {
    if !(level > 0.0 && level < 1.0) {
      return Err(StatsError::InvalidParameter(format!(
        "var level must lie in (0, 1), got {level}"
      )));
    }
    self.config.var_level = level;
    Ok(())
  }

  /// Rows of the full table inside `window`, independent of the active one.
  pub fn view(&self, window: &Window) -> ReturnTable {
    self.table.window(window)
  }

  /// Rows inside the active window.
  pub fn active(&self) -> ReturnTable {
    self.view(&self.window)
  }

  /// One column restricted to the active window.
  pub fn series(&self, name: &str) -> Result<Series> {
    Ok(self.table.column(name)?.window(&self.window))
  }

  pub fn summary(&self, modes: &[VarMode]) -> StatisticsTable {
    StatisticsTable::build(&self.active(), &self.config, modes)
  }

  pub fn horizon_return(&self, name: &str, mode: ReturnMode) -> Result<f64> {
    let s = self.series(name)?;
    Ok(stats::horizon_return(s.values(), mode, self.config.periods_per_year()))
  }

  pub fn horizon_volatility(&self, name: &str, mode: VolatilityMode) -> Result<f64> {
    let s = self.series(name)?;
    Ok(stats::horizon_volatility(s.values(), mode, self.config.periods_per_year()))
  }

  pub fn drawdowns(&self, name: &str) -> Result<DrawdownSeries> {
    Ok(risk::drawdowns(&self.series(name)?, self.config.periodicity))
  }

  /// VaR at the session level.
  pub fn value_at_risk(&self, name: &str, mode: VarMode) -> Result<f64> {
    let s = self.series(name)?;
    Ok(risk::value_at_risk(s.values(), self.config.var_level_pct(), mode))
  }

  pub fn jarque_bera(&self, name: &str) -> Result<JarqueBeraOutcome> {
    Ok(stats::jarque_bera(self.series(name)?.values()))
  }

  /// First and last valid dates of `name` inside the active window.
  pub fn valid_span(&self, name: &str) -> Result<Option<(NaiveDate, NaiveDate)>> {
    Ok(self.series(name)?.valid_span())
  }

  /// Trailing-window version of any single-series calculator.
  pub fn rolling<F>(&self, name: &str, window: usize, f: F) -> Result<Series>
  where
    F: Fn(ArrayView1<'_, f64>) -> f64,
  {
    stats::rolling::rolling(&self.series(name)?, window, f)
  }

  pub fn average_correlation(&self, group: &[&str], market: &str, window: usize) -> Result<AverageCorrelation> {
    let members = self.active().select(group)?;
    stats::rolling::average_correlation(
      &members,
      &self.series(market)?,
      window,
      self.config.periods_per_year(),
    )
  }

  /// CPPI backtest of `risky`, optionally against the `safe` column.
  pub fn cppi(&self, risky: &str, safe: Option<&str>, cfg: &CppiConfig) -> Result<CppiResult> {
    let risky = self.series(risky)?;
    let safe = safe.map(|s| self.series(s)).transpose()?;
    cppi::simulate(&risky, safe.as_ref(), cfg, &self.config)
  }

  /// Annualized returns of the named columns (all when `names` is empty).
  pub fn expected_returns(&self, names: &[&str]) -> Result<Array1<f64>> {
    portfolio::expected_returns(&self.active(), names, self.config.periods_per_year())
  }

  /// Sample covariance of the named columns scaled to annual units.
  pub fn covariance(&self, names: &[&str]) -> Result<Array2<f64>> {
    let cov = portfolio::covariance_of(&self.active(), names)?;
    Ok(cov * self.config.periods_per_year() as f64)
  }

  pub fn minimize_volatility(&self, names: &[&str], target_return: f64) -> Result<OptimizationResult> {
    let (er, cov) = self.optimizer_inputs(names)?;
    portfolio::minimize_volatility(target_return, er.view(), cov.view())
  }

  pub fn max_sharpe(&self, names: &[&str]) -> Result<OptimizationResult> {
    let (er, cov) = self.optimizer_inputs(names)?;
    portfolio::max_sharpe_weights(er.view(), cov.view(), self.config.risk_free_rate)
  }

  pub fn global_min_variance(&self, names: &[&str]) -> Result<OptimizationResult> {
    let (er, cov) = self.optimizer_inputs(names)?;
    let gmv = portfolio::global_min_variance_weights(cov.view(), self.config.risk_free_rate)?;
    Ok(OptimizationResult::evaluate(gmv.weights, er.view(), cov.view()))
  }

  pub fn efficient_frontier(&self, names: &[&str], n_points: usize) -> Result<Vec<OptimizationResult>> {
    let (er, cov) = self.optimizer_inputs(names)?;
    portfolio::efficient_frontier(n_points, er.view(), cov.view())
  }

  pub fn markowitz_space(&self, names: &[&str], n_points: usize) -> Result<MarkowitzSpace> {
    let (er, cov) = self.optimizer_inputs(names)?;
    portfolio::markowitz_space(n_points, er.view(), cov.view(), self.config.risk_free_rate)
  }

  fn optimizer_inputs(&self, names: &[&str]) -> Result<(Array1<f64>, Array2<f64>)> {
    Ok((self.expected_returns(names)?, self.covariance(names)?))
  }

  /// GBM scenario settings at the session periodicity.
  pub fn gbm_config(&self, n_years: f64, n_scenarios: usize) -> GbmConfig {
    GbmConfig {
      n_years,
      n_scenarios,
      periodicity: self.config.periodicity,
      ..GbmConfig::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;
  use crate::config::Periodicity;
  use crate::data::tests::daily_dates;

  fn context() -> StatsContext {
    let table = ReturnTable::from_columns(
      daily_dates(8),
      vec![
        ("A".to_string(), vec![0.01, -0.02, 0.03, 0.01, -0.01, 0.02, 0.00, 0.01]),
        ("B".to_string(), vec![0.02, 0.01, -0.01, 0.00, 0.03, -0.02, 0.01, 0.02]),
        ("C".to_string(), vec![f64::NAN; 8]),
      ],
    )
    .unwrap();
    StatsContext::new(table, StatsConfig::new("ROE", Periodicity::Daily))
  }

  #[test]
  fn view_leaves_full_table_untouched() {
    let ctx = context();
    let dates = daily_dates(8);
    let view = ctx.view(&Window::between(dates[2], dates[4]));

    assert_eq!(view.nrows(), 3);
    assert_eq!(ctx.table().nrows(), 8);
    assert_eq!(ctx.active().nrows(), 8);
  }

  #[test]
  fn queries_follow_the_active_window() {
    let mut ctx = context();
    let dates = daily_dates(8);
    let full = ctx.horizon_return("A", ReturnMode::Cumulative).unwrap();

    ctx.set_window(Window::new(Some(dates[5]), None));
    let windowed = ctx.horizon_return("A", ReturnMode::Cumulative).unwrap();

    assert_relative_eq!(windowed, 1.02 * 1.0 * 1.01 - 1.0, epsilon = 1e-12);
    assert!((full - windowed).abs() > 1e-6);
    assert_eq!(ctx.valid_span("A").unwrap(), Some((dates[5], dates[7])));
  }

  #[test]
  fn var_level_is_validated() {
    let mut ctx = context();
    assert!(ctx.set_var_level(0.01).is_ok());
    assert!(matches!(ctx.set_var_level(5.0), Err(StatsError::InvalidParameter(_))));
    assert_eq!(ctx.config().var_level, 0.01);
  }

  #[test]
  fn summary_skips_empty_columns() {
    let ctx = context();
    let table = ctx.summary(&VarMode::ALL);
    assert_eq!(table.len(), 2);
  }

  #[test]
  fn covariance_is_annualized() {
    let ctx = context();
    let cov = ctx.covariance(&["A"]).unwrap();
    let vol = stats::periodic_volatility(ctx.table().column_values(0));
    assert_relative_eq!(cov[[0, 0]], vol * vol * 252.0, epsilon = 1e-12);
  }

  #[test]
  fn unknown_column_is_an_error() {
    let ctx = context();
    assert!(matches!(ctx.drawdowns("Z"), Err(StatsError::ColumnNotFound(_))));
  }

  #[test]
  fn gbm_uses_session_periodicity() {
    let ctx = StatsContext::new(
      context().table().clone(),
      StatsConfig::new("ROE", Periodicity::Monthly),
    );
    assert_eq!(ctx.gbm_config(1.0, 2).n_steps(), 12);
  }
}
