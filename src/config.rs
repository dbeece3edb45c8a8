//! # Config
//!
//! $$
//! \sigma_{ann} = \sigma_{per}\sqrt{P}
//! $$
//!
//! Periodicity tags and the session parameters shared by every computation in a
//! [`crate::context::StatsContext`].

use std::fmt::Display;
use std::str::FromStr;

use chrono::Duration;
use chrono::Months;
use chrono::NaiveDate;

use crate::error::StatsError;

/// Sampling frequency of a return table.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Periodicity {
  #[default]
  Daily,
  Monthly,
  Quarterly,
}

impl Periodicity {
  /// Trading periods per year used by every annualization.
  pub fn periods_per_year(&self) -> usize {
    match self {
      Periodicity::Daily => 252,
      Periodicity::Monthly => 12,
      Periodicity::Quarterly => 4,
    }
  }

  /// Length of one period expressed in years.
  pub fn dt(&self) -> f64 {
    1.0 / self.periods_per_year() as f64
  }

  /// Date one period before `date`.
  pub fn previous_period(&self, date: NaiveDate) -> NaiveDate {
    match self {
      Periodicity::Daily => date - Duration::days(1),
      Periodicity::Monthly => date.checked_sub_months(Months::new(1)).unwrap_or(date),
      Periodicity::Quarterly => date.checked_sub_months(Months::new(3)).unwrap_or(date),
    }
  }

  /// Date `k` periods after `start`, counted from `start` so month ends do not
  /// drift. `None` when out of range.
  pub fn nth_period(&self, start: NaiveDate, k: u32) -> Option<NaiveDate> {
    match self {
      Periodicity::Daily => start.checked_add_signed(Duration::days(i64::from(k))),
      Periodicity::Monthly => start.checked_add_months(Months::new(k)),
      Periodicity::Quarterly => start.checked_add_months(Months::new(k.checked_mul(3)?)),
    }
  }
}

impl FromStr for Periodicity {
  type Err = StatsError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "daily" => Ok(Self::Daily),
      "monthly" => Ok(Self::Monthly),
      "quarterly" => Ok(Self::Quarterly),
      other => Err(StatsError::UnknownPeriodicity(other.to_string())),
    }
  }
}

impl Display for Periodicity {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Periodicity::Daily => write!(f, "daily"),
      Periodicity::Monthly => write!(f, "monthly"),
      Periodicity::Quarterly => write!(f, "quarterly"),
    }
  }
}

/// Session parameters applied uniformly across all columns.
#[derive(Clone, Debug, PartialEq)]
pub struct StatsConfig {
  /// Display name of the entity group (e.g. "ROE", "SP500").
  pub name: String,
  /// Sampling frequency of the data.
  pub periodicity: Periodicity,
  /// Annualized risk-free rate.
  pub risk_free_rate: f64,
  /// VaR tail probability as a fraction (0.05 = 5%).
  pub var_level: f64,
}

impl Default for StatsConfig {
  fn default() -> Self {
    Self {
      name: String::new(),
      periodicity: Periodicity::Daily,
      risk_free_rate: 0.04,
      var_level: 0.05,
    }
  }
}

impl StatsConfig {
  /// Config with default session parameters for a named group.
  pub fn new(name: impl Into<String>, periodicity: Periodicity) -> Self {
    Self {
      name: name.into(),
      periodicity,
      ..Self::default()
    }
  }

  /// Shorthand for `periodicity.periods_per_year()`.
  pub fn periods_per_year(&self) -> usize {
    self.periodicity.periods_per_year()
  }

  /// VaR level in percent, the unit expected by [`crate::risk::var::value_at_risk`].
  pub fn var_level_pct(&self) -> f64 {
    self.var_level * 100.0
  }
}
