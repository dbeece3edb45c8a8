//! # Summary Table
//!
//! $$
//! SR_{ann}=\frac{R_{ann}-r_f}{\sigma_{ann}}
//! $$
//!
//! One row of horizon, moment, drawdown and VaR statistics per column of a
//! return table.

use std::fmt::Display;

use chrono::NaiveDate;
use prettytable::Cell;
use prettytable::Row;
use prettytable::Table;

use crate::config::StatsConfig;
use crate::data::ReturnTable;
use crate::risk::drawdowns;
use crate::risk::value_at_risk;
use crate::risk::VarMode;
use crate::stats::annualized_return;
use crate::stats::annualized_volatility;
use crate::stats::cumulative_return;
use crate::stats::kurtosis;
use crate::stats::mean;
use crate::stats::observation_count;
use crate::stats::periodic_volatility;
use crate::stats::skewness;

/// Statistics of one column.
#[derive(Clone, Debug, PartialEq)]
pub struct StatisticsRow {
  pub name: String,
  /// Number of valid observations.
  pub count: usize,
  pub start: NaiveDate,
  pub end: NaiveDate,
  pub cumulative_return: f64,
  pub annualized_return: f64,
  pub annualized_volatility: f64,
  pub sharpe_ratio: f64,
  pub mean: f64,
  pub volatility: f64,
  pub skewness: f64,
  pub kurtosis: f64,
  pub max_drawdown: f64,
  pub max_drawdown_date: Option<NaiveDate>,
  /// VaR estimates in the order they were requested.
  pub var: Vec<(VarMode, f64)>,
}

impl StatisticsRow {
  pub fn var(&self, mode: VarMode) -> Option<f64> {
    self.var.iter().find(|(m, _)| *m == mode).map(|(_, v)| *v)
  }
}

/// Per-entity statistics; entities without observations are absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatisticsTable {
  rows: Vec<StatisticsRow>,
}

impl StatisticsTable {
  /// Statistics of every column of `table` under the session parameters in
  /// `config`. VaR is evaluated at `config.var_level` for each of `modes`.
  pub fn build(table: &ReturnTable, config: &StatsConfig, modes: &[VarMode]) -> Self {
    let ppy = config.periods_per_year();
    let level = config.var_level_pct();
    let mut rows = Vec::with_capacity(table.ncols());

    for series in table.iter_series() {
      let r = series.values();
      let count = observation_count(r);
      let Some((start, end)) = series.valid_span().filter(|_| count > 0) else {
        tracing::debug!(column = series.name(), "dropping column without observations");
        continue;
      };

      let ann_ret = annualized_return(r, ppy);
      let ann_vol = annualized_volatility(r, ppy);
      let dd = drawdowns(&series, config.periodicity);

      rows.push(StatisticsRow {
        name: series.name().to_string(),
        count,
        start,
        end,
        cumulative_return: cumulative_return(r),
        annualized_return: ann_ret,
        annualized_volatility: ann_vol,
        sharpe_ratio: (ann_ret - config.risk_free_rate) / ann_vol,
        mean: mean(r),
        volatility: periodic_volatility(r),
        skewness: skewness(r),
        kurtosis: kurtosis(r),
        max_drawdown: dd.max_drawdown(),
        max_drawdown_date: dd.max_drawdown_date(),
        var: modes
          .iter()
          .map(|&m| (m, value_at_risk(r, level, m)))
          .collect(),
      });
    }

    Self { rows }
  }

  pub fn rows(&self) -> &[StatisticsRow] {
    &self.rows
  }

  pub fn row(&self, name: &str) -> Option<&StatisticsRow> {
    self.rows.iter().find(|r| r.name == name)
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &StatisticsRow> {
    self.rows.iter()
  }

  /// Render as a text table, one entity per row.
  pub fn to_table(&self) -> Table {
    let mut table = Table::new();
    let mut titles = vec![
      "",
      "Days",
      "Start",
      "End",
      "Cumulative Return",
      "Annualized Return",
      "Annualized Volatility",
      "Annualized Sharpe Ratio",
      "Mean",
      "Volatility",
      "Skewness",
      "Kurtosis",
      "Max Drawdown",
      "Max Drawdown Date",
    ]
    .into_iter()
    .map(Cell::new)
    .collect::<Vec<_>>();
    if let Some(first) = self.rows.first() {
      titles.extend(first.var.iter().map(|(m, _)| Cell::new(&m.to_string())));
    }
    table.set_titles(Row::new(titles));

    for r in &self.rows {
      let mut cells = vec![
        Cell::new(&r.name),
        Cell::new(&r.count.to_string()),
        Cell::new(&r.start.to_string()),
        Cell::new(&r.end.to_string()),
        Cell::new(&pct(r.cumulative_return)),
        Cell::new(&pct(r.annualized_return)),
        Cell::new(&pct(r.annualized_volatility)),
        Cell::new(&format!("{:.2}", r.sharpe_ratio)),
        Cell::new(&pct(r.mean)),
        Cell::new(&pct(r.volatility)),
        Cell::new(&format!("{:.2}", r.skewness)),
        Cell::new(&format!("{:.2}", r.kurtosis)),
        Cell::new(&pct(r.max_drawdown)),
        Cell::new(
          &r.max_drawdown_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        ),
      ];
      cells.extend(r.var.iter().map(|(_, v)| Cell::new(&pct(*v))));
      table.add_row(Row::new(cells));
    }

    table
  }
}

fn pct(x: f64) -> String {
  format!("{:.2}%", x * 100.0)
}

impl Display for StatisticsTable {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.to_table())
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use tracing_test::traced_test;

  use super::*;
  use crate::config::Periodicity;
  use crate::data::tests::daily_dates;

  fn three_asset_table() -> ReturnTable {
    let nan = f64::NAN;
    ReturnTable::from_columns(
      daily_dates(10),
      vec![
        (
          "Paul".to_string(),
          vec![0.1, -0.2, 0.05, 0.02, -0.01, 0.03, 0.0, 0.01, -0.04, 0.02],
        ),
        (
          "Kevin".to_string(),
          vec![nan, 0.01, 0.02, -0.03, 0.01, 0.0, 0.02, -0.01, 0.01, nan],
        ),
        ("Empty".to_string(), vec![nan; 10]),
      ],
    )
    .unwrap()
  }

  #[test]
  #[traced_test]
  fn drops_columns_without_observations() {
    let cfg = StatsConfig::new("ROE", Periodicity::Daily);
    let stats = StatisticsTable::build(&three_asset_table(), &cfg, &VarMode::ALL);

    assert_eq!(stats.len(), 2);
    assert!(stats.row("Empty").is_none());
    assert!(logs_contain("dropping column without observations"));
  }

  #[test]
  fn row_matches_hand_computed_values() {
    let cfg = StatsConfig::new("ROE", Periodicity::Daily);
    let stats = StatisticsTable::build(&three_asset_table(), &cfg, &VarMode::ALL);
    let dates = daily_dates(10);

    let paul = stats.row("Paul").unwrap();
    assert_eq!(paul.count, 10);
    assert_eq!(paul.start, dates[0]);
    assert_relative_eq!(paul.max_drawdown, -0.2, epsilon = 1e-12);
    assert_eq!(paul.max_drawdown_date, Some(dates[1]));

    let kevin = stats.row("Kevin").unwrap();
    assert_eq!(kevin.count, 8);
    assert_eq!(kevin.start, dates[1]);
    assert_eq!(kevin.end, dates[8]);
  }

  #[test]
  fn sharpe_uses_session_risk_free_rate() {
    let mut cfg = StatsConfig::new("ROE", Periodicity::Daily);
    cfg.risk_free_rate = 0.01;
    let stats = StatisticsTable::build(&three_asset_table(), &cfg, &[VarMode::Historic]);
    let paul = stats.row("Paul").unwrap();

    assert_relative_eq!(
      paul.sharpe_ratio,
      (paul.annualized_return - 0.01) / paul.annualized_volatility,
      epsilon = 1e-12
    );
    assert!(paul.var(VarMode::Historic).is_some());
    assert!(paul.var(VarMode::Modified).is_none());
  }

  #[test]
  fn renders_every_row() {
    let cfg = StatsConfig::new("ROE", Periodicity::Daily);
    let stats = StatisticsTable::build(&three_asset_table(), &cfg, &VarMode::ALL);
    let text = stats.to_string();

    assert!(text.contains("Paul"));
    assert!(text.contains("Kevin"));
    assert!(text.contains("Conditional VaR"));
    assert!(!text.contains("Empty"));
  }
}
