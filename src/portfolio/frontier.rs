//! # Efficient Frontier
//!
//! $$
//! \sigma^\*(r)=\min\left\{\sqrt{\mathbf w^\top\Sigma\mathbf w}\;:\;\mathbf 1^\top\mathbf w=1,\ \mu^\top\mathbf w=r,\ \mathbf w\ge 0\right\},\qquad r\in[\min\mu,\max\mu]
//! $$
//!
//! Frontier sweeps and the Markowitz space built around them.

use ndarray::Array1;
use ndarray::ArrayView1;
use ndarray::ArrayView2;

use super::optimizers::equal_weights;
use super::optimizers::global_min_variance_weights;
use super::optimizers::max_sharpe_weights;
use super::optimizers::minimize_volatility;
use super::types::FrontierPoint;
use super::types::MarkowitzSpace;
use super::types::OptimizationResult;
use crate::error::Result;

/// Minimum-volatility portfolios at `n_points` targets spaced evenly from
/// `min(er)` to `max(er)` inclusive, in increasing target order.
pub fn efficient_frontier(
  n_points: usize,
  er: ArrayView1<'_, f64>,
  cov: ArrayView2<'_, f64>,
) -> Result<Vec<OptimizationResult>> {
  if n_points == 0 || er.is_empty() {
    return Ok(Vec::new());
  }

  let min = er.iter().cloned().fold(f64::INFINITY, f64::min);
  let max = er.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let targets = Array1::linspace(min, max, n_points);

  let frontier = targets
    .iter()
    .map(|&t| minimize_volatility(t, er, cov))
    .collect::<Result<Vec<_>>>()?;
  tracing::debug!(points = frontier.len(), "efficient frontier built");

  Ok(frontier)
}

/// Frontier plus the max-Sharpe, global minimum-variance and equal-weight
/// portfolios and the capital market line.
pub fn markowitz_space(
  n_points: usize,
  er: ArrayView1<'_, f64>,
  cov: ArrayView2<'_, f64>,
  risk_free_rate: f64,
) -> Result<MarkowitzSpace> {
  let frontier = efficient_frontier(n_points, er, cov)?;
  let max_sharpe = max_sharpe_weights(er, cov, risk_free_rate)?;
  let gmv = global_min_variance_weights(cov, risk_free_rate)?;
  let global_min_variance = OptimizationResult::evaluate(gmv.weights, er, cov);
  let equal_weight = equal_weights(er, cov)?;

  let capital_market_line = [
    FrontierPoint {
      volatility: 0.0,
      expected_return: risk_free_rate,
    },
    FrontierPoint::from(&max_sharpe),
  ];

  Ok(MarkowitzSpace {
    frontier,
    max_sharpe,
    global_min_variance,
    equal_weight,
    capital_market_line,
  })
}
