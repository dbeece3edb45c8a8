use chrono::NaiveDate;
use impl_new_derive::ImplNew;
use ndarray::Array2;
use ndarray::Axis;
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::StandardNormal;

use super::PathSampler;
use crate::config::Periodicity;
use crate::data::ReturnTable;
use crate::error::Result;
use crate::error::StatsError;

/// Discretised geometric Brownian motion scenarios.
#[derive(ImplNew, Clone, Debug, PartialEq)]
pub struct GbmConfig {
  pub n_years: f64,
  pub n_scenarios: usize,
  /// Annual drift in percent.
  pub mu_pct: f64,
  /// Annual volatility in percent.
  pub sigma_pct: f64,
  pub periodicity: Periodicity,
  pub price0: f64,
}

impl Default for GbmConfig {
  fn default() -> Self {
    Self {
      n_years: 1.0,
      n_scenarios: 10,
      mu_pct: 7.0,
      sigma_pct: 15.0,
      periodicity: Periodicity::Daily,
      price0: 100.0,
    }
  }
}

impl GbmConfig {
  pub fn n_steps(&self) -> usize {
    (self.n_years * self.periodicity.periods_per_year() as f64).floor() as usize
  }
}

/// Simulated returns and prices; rows are steps, columns are scenarios.
#[derive(Clone, Debug, PartialEq)]
pub struct GbmPaths {
  pub returns: Array2<f64>,
  pub prices: Array2<f64>,
  periodicity: Periodicity,
}

impl GbmPaths {
  pub fn n_steps(&self) -> usize {
    self.returns.nrows()
  }

  pub fn n_scenarios(&self) -> usize {
    self.returns.ncols()
  }

  /// Returns as a table dated from `start` at the simulated periodicity,
  /// one column per scenario.
  pub fn returns_table(&self, start: NaiveDate) -> Result<ReturnTable> {
    let dates = (0..self.n_steps())
      .map(|k| {
        u32::try_from(k)
          .ok()
          .and_then(|k| self.periodicity.nth_period(start, k))
          .ok_or_else(|| StatsError::InvalidParameter(format!("step {k} from {start} is out of the date range")))
      })
      .collect::<Result<Vec<_>>>()?;
    let columns = (0..self.n_scenarios()).map(|j| j.to_string()).collect();
    ReturnTable::new(dates, columns, self.returns.clone())
  }
}

impl PathSampler for GbmConfig {
  type Output = Result<GbmPaths>;

  fn sample_using<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Output {
    if !(self.n_years > 0.0) || self.n_scenarios == 0 {
      return Err(StatsError::InvalidParameter(format!(
        "gbm needs a positive horizon and scenario count, got {} years x {}",
        self.n_years, self.n_scenarios
      )));
    }
    if !(self.sigma_pct >= 0.0) {
      return Err(StatsError::InvalidParameter(format!(
        "volatility must be non-negative, got {}",
        self.sigma_pct
      )));
    }

    let dt = self.periodicity.dt();
    let mu = self.mu_pct / 100.0;
    let sigma = self.sigma_pct / 100.0;
    let shape = (self.n_steps(), self.n_scenarios);

    let xi = Array2::<f64>::random_using(shape, StandardNormal, rng);
    let mut returns = xi.mapv(|x| mu * dt + sigma * dt.sqrt() * x);
    if let Some(mut first) = returns.axis_iter_mut(Axis(0)).next() {
      first.fill(0.0);
    }

    let mut prices = Array2::<f64>::zeros(shape);
    for j in 0..shape.1 {
      let mut p = self.price0;
      for i in 0..shape.0 {
        p *= 1.0 + returns[[i, j]];
        prices[[i, j]] = p;
      }
    }

    tracing::debug!(steps = shape.0, scenarios = shape.1, "gbm paths sampled");
    Ok(GbmPaths {
      returns,
      prices,
      periodicity: self.periodicity,
    })
  }
}
