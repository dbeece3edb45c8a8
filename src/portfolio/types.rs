//! # Portfolio Types
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}} \frac{\mathbb E[R_p]-r_f}{\sigma_p}
//! $$
//!
//! Result containers shared by the optimizers and the frontier builder.

use ndarray::Array1;
use ndarray::ArrayView1;
use ndarray::ArrayView2;

/// Long-only allocation together with its model return and volatility.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptimizationResult {
  /// Final portfolio weights, summing to one.
  pub weights: Array1<f64>,
  /// Model expected portfolio return, in the units of the expected returns.
  pub expected_return: f64,
  /// Model portfolio volatility, in the units of the covariance matrix.
  pub volatility: f64,
}

impl OptimizationResult {
  pub(crate) fn evaluate(weights: Array1<f64>, er: ArrayView1<'_, f64>, cov: ArrayView2<'_, f64>) -> Self {
    let expected_return = portfolio_return(weights.view(), er);
    let volatility = portfolio_volatility(weights.view(), cov);
    Self {
      weights,
      expected_return,
      volatility,
    }
  }

  /// `(expected_return - risk_free_rate) / volatility`.
  pub fn sharpe_ratio(&self, risk_free_rate: f64) -> f64 {
    (self.expected_return - risk_free_rate) / self.volatility
  }
}

/// Dot product of weights and expected returns.
pub fn portfolio_return(w: ArrayView1<'_, f64>, er: ArrayView1<'_, f64>) -> f64 {
  w.dot(&er)
}

/// `sqrt(w' Cov w)`.
pub fn portfolio_volatility(w: ArrayView1<'_, f64>, cov: ArrayView2<'_, f64>) -> f64 {
  w.dot(&cov.dot(&w)).sqrt()
}

/// A point of the mean-variance plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrontierPoint {
  pub volatility: f64,
  pub expected_return: f64,
}

impl From<&OptimizationResult> for FrontierPoint {
  fn from(r: &OptimizationResult) -> Self {
    Self {
      volatility: r.volatility,
      expected_return: r.expected_return,
    }
  }
}

/// Efficient frontier with the reference portfolios drawn alongside it.
#[derive(Clone, Debug)]
pub struct MarkowitzSpace {
  /// Minimum-volatility portfolios in increasing target-return order.
  pub frontier: Vec<OptimizationResult>,
  pub max_sharpe: OptimizationResult,
  pub global_min_variance: OptimizationResult,
  pub equal_weight: OptimizationResult,
  /// Capital market line from `(0, risk_free_rate)` to the max-Sharpe point.
  pub capital_market_line: [FrontierPoint; 2],
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn volatility_of_uncorrelated_pair() {
    let cov = array![[0.04, 0.0], [0.0, 0.09]];
    let w = array![0.5, 0.5];
    // 0.25 * 0.04 + 0.25 * 0.09
    assert_relative_eq!(
      portfolio_volatility(w.view(), cov.view()),
      0.0325_f64.sqrt(),
      epsilon = 1e-15
    );
  }

  #[test]
  fn sharpe_ratio_uses_excess_return() {
    let er = array![0.1, 0.2];
    let cov = array![[0.04, 0.0], [0.0, 0.04]];
    let r = OptimizationResult::evaluate(array![1.0, 0.0], er.view(), cov.view());
    assert_relative_eq!(r.sharpe_ratio(0.02), (0.1 - 0.02) / 0.2, epsilon = 1e-12);
  }
}
