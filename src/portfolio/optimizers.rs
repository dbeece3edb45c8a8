//! # Portfolio Optimizers
//!
//! $$
//! \min_{\mathbf{w}} \ \tfrac12\mathbf{w}^\top\Sigma\mathbf{w}
//! \quad\text{s.t.}\quad \mathbf 1^\top\mathbf w=1,\ \mu^\top\mathbf w=r^\*,\ 0\le w_i\le 1
//! $$
//!
//! Long-only allocation optimizers: an exact active-set solve of the
//! target-return program and a Nelder-Mead search for the tangency portfolio.

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::State;
use argmin::core::TerminationReason;
use argmin::solver::neldermead::NelderMead;
use nalgebra::DMatrix;
use nalgebra::DVector;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::ArrayView2;

use super::types::portfolio_return;
use super::types::portfolio_volatility;
use super::types::OptimizationResult;
use crate::error::Result;
use crate::error::StatsError;

/// Tolerance on the equality constraints of a returned allocation.
pub const FEASIBILITY_TOL: f64 = 1e-8;
const STEP_TOL: f64 = 1e-9;
const MULTIPLIER_TOL: f64 = 1e-12;
const SVD_EPS: f64 = 1e-14;
const RANK_TOL: f64 = 1e-10;

const NM_SD_TOLERANCE: f64 = 1e-12;
const NM_MAX_ITERS: u64 = 20_000;
/// Cost assigned to allocations with zero volatility.
const DEGENERATE_COST: f64 = 1e10;

fn validate(er: ArrayView1<'_, f64>, cov: ArrayView2<'_, f64>) -> Result<usize> {
  let n = er.len();
  if n == 0 {
    return Err(StatsError::ShapeMismatch(
      "expected returns are empty".to_string(),
    ));
  }
  if cov.dim() != (n, n) {
    return Err(StatsError::ShapeMismatch(format!(
      "covariance is {:?}, expected ({n}, {n})",
      cov.dim()
    )));
  }
  if er.iter().chain(cov.iter()).any(|x| !x.is_finite()) {
    return Err(StatsError::InvalidParameter(
      "expected returns and covariance must be finite".to_string(),
    ));
  }
  Ok(n)
}

fn softmax(x: &[f64]) -> Vec<f64> {
  if x.is_empty() {
    return Vec::new();
  }

  let max_x = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let exps: Vec<f64> = x.iter().map(|&v| (v - max_x).exp()).collect();
  let sum: f64 = exps.iter().sum();

  if sum < 1e-15 {
    vec![1.0 / x.len() as f64; x.len()]
  } else {
    exps.iter().map(|&e| e / sum).collect()
  }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Bound {
  Lower,
  Upper,
}

impl Bound {
  fn value(self) -> f64 {
    match self {
      Bound::Lower => 0.0,
      Bound::Upper => 1.0,
    }
  }

  /// Sign-corrected multiplier; negative means the bound should be released.
  fn multiplier(self, lambda: f64) -> f64 {
    match self {
      Bound::Lower => -lambda,
      Bound::Upper => lambda,
    }
  }
}

/// Whether bound row `candidate` is linearly independent of the equality rows
/// and the working bounds.
fn is_independent(eq_rows: &[DVector<f64>], working: &[(usize, Bound)], candidate: usize, n: usize) -> bool {
  let m = eq_rows.len() + working.len() + 1;
  if m > n {
    return false;
  }

  let mut a = DMatrix::<f64>::zeros(m, n);
  for (r, row) in eq_rows.iter().enumerate() {
    for j in 0..n {
      a[(r, j)] = row[j];
    }
  }
  for (k, &(i, _)) in working.iter().enumerate() {
    a[(eq_rows.len() + k, i)] = 1.0;
  }
  a[(m - 1, candidate)] = 1.0;

  a.rank(RANK_TOL) == m
}

/// Bounds active at `w`, kept only while they stay linearly independent.
fn active_bounds(w: &DVector<f64>, eq_rows: &[DVector<f64>]) -> Vec<(usize, Bound)> {
  let n = w.len();
  let mut working = Vec::new();
  for i in 0..n {
    let bound = if w[i] <= 0.0 {
      Bound::Lower
    } else if w[i] >= 1.0 {
      Bound::Upper
    } else {
      continue;
    };
    if is_independent(eq_rows, &working, i, n) {
      working.push((i, bound));
    }
  }
  working
}

/// Index of the only asset whose expected return sits at `target` when the
/// target is an end of the return range.
fn single_asset_endpoint(target: f64, er: ArrayView1<'_, f64>, min: f64, max: f64) -> Option<usize> {
  for edge in [max, min] {
    if (target - edge).abs() > FEASIBILITY_TOL {
      continue;
    }
    let mut at_edge = er
      .iter()
      .enumerate()
      .filter(|(_, r)| (**r - edge).abs() <= FEASIBILITY_TOL)
      .map(|(i, _)| i);
    if let (Some(i), None) = (at_edge.next(), at_edge.next()) {
      return Some(i);
    }
  }
  None
}

/// Solve the equality-constrained step problem
/// `min 1/2 p' S p + g' p` s.t. `A p = 0`, `p_i = 0` for the working bounds.
///
/// Returns the step and the multipliers, equality rows first.
fn kkt_step(
  sigma: &DMatrix<f64>,
  g: &DVector<f64>,
  eq_rows: &[DVector<f64>],
  working: &[(usize, Bound)],
) -> Result<(DVector<f64>, DVector<f64>)> {
  let n = g.len();
  let m = eq_rows.len() + working.len();
  let mut kkt = DMatrix::<f64>::zeros(n + m, n + m);
  kkt.view_mut((0, 0), (n, n)).copy_from(sigma);

  for (r, row) in eq_rows.iter().enumerate() {
    for j in 0..n {
      kkt[(n + r, j)] = row[j];
      kkt[(j, n + r)] = row[j];
    }
  }
  for (k, &(i, _)) in working.iter().enumerate() {
    let r = n + eq_rows.len() + k;
    kkt[(r, i)] = 1.0;
    kkt[(i, r)] = 1.0;
  }

  let mut rhs = DVector::<f64>::zeros(n + m);
  for i in 0..n {
    rhs[i] = -g[i];
  }

  let sol = kkt
    .svd(true, true)
    .solve(&rhs, SVD_EPS)
    .map_err(|e| StatsError::NonConvergence(e.to_string()))?;

  Ok((sol.rows(0, n).into_owned(), sol.rows(n, m).into_owned()))
}

/// Feasible starting point: equal weights when they already hit the target,
/// otherwise the mix of the lowest and highest expected-return assets.
fn initial_weights(target: f64, er: ArrayView1<'_, f64>) -> DVector<f64> {
  let n = er.len();
  let equal = DVector::from_element(n, 1.0 / n as f64);
  if (er.sum() / n as f64 - target).abs() <= FEASIBILITY_TOL {
    return equal;
  }

  let (mut lo, mut hi) = (0, 0);
  for i in 1..n {
    if er[i] < er[lo] {
      lo = i;
    }
    if er[i] > er[hi] {
      hi = i;
    }
  }

  let mut w = DVector::<f64>::zeros(n);
  let spread = er[hi] - er[lo];
  if spread <= FEASIBILITY_TOL {
    return equal;
  }
  let theta = ((target - er[lo]) / spread).clamp(0.0, 1.0);
  w[lo] = 1.0 - theta;
  w[hi] += theta;
  w
}

/// Minimum-volatility long-only allocation whose expected return equals
/// `target_return`.
///
/// Solved exactly by a primal active-set method on the bound constraints, so
/// the result satisfies all constraints to [`FEASIBILITY_TOL`] or the call
/// fails. Targets outside `[min er, max er]` have no long-only solution and
/// give [`StatsError::InfeasibleTarget`].
pub fn minimize_volatility(
  target_return: f64,
  er: ArrayView1<'_, f64>,
  cov: ArrayView2<'_, f64>,
) -> Result<OptimizationResult> {
  let n = validate(er, cov)?;
  let min = er.iter().cloned().fold(f64::INFINITY, f64::min);
  let max = er.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  if !target_return.is_finite()
    || target_return < min - FEASIBILITY_TOL
    || target_return > max + FEASIBILITY_TOL
  {
    return Err(StatsError::InfeasibleTarget {
      target: target_return,
      min,
      max,
    });
  }

  if let Some(i) = single_asset_endpoint(target_return, er, min, max) {
    tracing::debug!(asset = i, "target at an end of the return range");
    let mut weights = Array1::<f64>::zeros(n);
    weights[i] = 1.0;
    return Ok(OptimizationResult::evaluate(weights, er, cov));
  }

  let sigma = DMatrix::from_fn(n, n, |i, j| cov[[i, j]]);
  let mut eq_rows = vec![DVector::from_element(n, 1.0)];
  // constant expected returns make the return row redundant
  if max - min > FEASIBILITY_TOL {
    eq_rows.push(DVector::from_iterator(n, er.iter().copied()));
  }

  let mut w = initial_weights(target_return, er);
  let mut working = active_bounds(&w, &eq_rows);
  let mut at_minimizer = false;
  let max_iters = 50 * (n + 2);

  for iter in 0..max_iters {
    let g = &sigma * &w;
    let (p, lambda) = kkt_step(&sigma, &g, &eq_rows, &working)?;

    if at_minimizer || p.amax() < STEP_TOL {
      // release the lowest-index bound with a negative multiplier
      let offset = eq_rows.len();
      let leaving = working
        .iter()
        .enumerate()
        .filter(|&(k, &(_, b))| b.multiplier(lambda[offset + k]) < -MULTIPLIER_TOL)
        .min_by_key(|&(_, &(i, _))| i)
        .map(|(k, _)| k);

      match leaving {
        Some(k) => {
          working.remove(k);
          at_minimizer = false;
        }
        None => {
          tracing::debug!(iterations = iter, active = working.len(), "active set converged");
          return finish(w, target_return, er, cov);
        }
      }
      continue;
    }

    let mut ratios = Vec::new();
    for i in 0..n {
      if working.iter().any(|&(j, _)| j == i) {
        continue;
      }
      if p[i] < -STEP_TOL {
        ratios.push((i, Bound::Lower, (w[i] / -p[i]).max(0.0)));
      } else if p[i] > STEP_TOL {
        ratios.push((i, Bound::Upper, ((1.0 - w[i]) / p[i]).max(0.0)));
      }
    }
    let alpha = ratios.iter().map(|r| r.2).fold(1.0, f64::min);
    // ties go to the lowest index
    let blocking = ratios.iter().find(|r| r.2 <= alpha + STEP_TOL);

    w.axpy(alpha, &p, 1.0);
    match blocking {
      Some(&(i, b, _)) => {
        w[i] = b.value();
        working.push((i, b));
        at_minimizer = false;
      }
      None => at_minimizer = true,
    }
  }

  tracing::warn!(target_return, max_iters, "active set did not converge");
  Err(StatsError::NonConvergence(format!(
    "active set exceeded {max_iters} iterations for target {target_return}"
  )))
}

fn finish(
  w: DVector<f64>,
  target_return: f64,
  er: ArrayView1<'_, f64>,
  cov: ArrayView2<'_, f64>,
) -> Result<OptimizationResult> {
  let weights: Array1<f64> = w.iter().map(|x| x.clamp(0.0, 1.0)).collect();
  let sum = weights.sum();
  let ret = portfolio_return(weights.view(), er);

  if (sum - 1.0).abs() > FEASIBILITY_TOL || (ret - target_return).abs() > FEASIBILITY_TOL {
    return Err(StatsError::NonConvergence(format!(
      "solution violates constraints: sum {sum}, return {ret} for target {target_return}"
    )));
  }

  Ok(OptimizationResult::evaluate(weights, er, cov))
}

struct NegativeSharpe {
  er: Array1<f64>,
  cov: Array2<f64>,
  risk_free_rate: f64,
}

impl CostFunction for NegativeSharpe {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
    let w = Array1::from(softmax(x));
    let vol = portfolio_volatility(w.view(), self.cov.view());
    if !(vol > 0.0) {
      return Ok(DEGENERATE_COST);
    }
    let ret = portfolio_return(w.view(), self.er.view());
    Ok(-(ret - self.risk_free_rate) / vol)
  }
}

/// Long-only allocation with the highest Sharpe ratio.
///
/// Weights are the softmax of the search point, so the budget and bound
/// constraints hold by construction.
pub fn max_sharpe_weights(
  er: ArrayView1<'_, f64>,
  cov: ArrayView2<'_, f64>,
  risk_free_rate: f64,
) -> Result<OptimizationResult> {
  let n = validate(er, cov)?;

  let cost = NegativeSharpe {
    er: er.to_owned(),
    cov: cov.to_owned(),
    risk_free_rate,
  };

  let x0 = vec![0.0; n];
  let mut simplex = Vec::with_capacity(n + 1);
  simplex.push(x0.clone());
  for i in 0..n {
    let mut point = x0.clone();
    point[i] = 1.0;
    simplex.push(point);
  }

  let solver = NelderMead::new(simplex)
    .with_sd_tolerance(NM_SD_TOLERANCE)
    .map_err(|e| StatsError::NonConvergence(e.to_string()))?;
  let res = Executor::new(cost, solver)
    .configure(|state| state.max_iters(NM_MAX_ITERS))
    .run()
    .map_err(|e| StatsError::NonConvergence(e.to_string()))?;

  if let Some(TerminationReason::MaxItersReached) = res.state.get_termination_reason() {
    tracing::warn!(iters = NM_MAX_ITERS, "max-sharpe search hit the iteration cap");
    return Err(StatsError::NonConvergence(format!(
      "max-sharpe search did not converge in {NM_MAX_ITERS} iterations"
    )));
  }

  let best = res
    .state
    .best_param
    .ok_or_else(|| StatsError::NonConvergence("solver returned no parameters".to_string()))?;
  tracing::debug!(iters = res.state.iter, cost = res.state.best_cost, "max-sharpe search finished");

  Ok(OptimizationResult::evaluate(Array1::from(softmax(&best)), er, cov))
}

/// Global minimum-variance allocation.
///
/// With identical expected returns the Sharpe objective is decreasing in
/// volatility, so the max-Sharpe search lands on the minimum-variance point.
pub fn global_min_variance_weights(cov: ArrayView2<'_, f64>, risk_free_rate: f64) -> Result<OptimizationResult> {
  let unit = Array1::<f64>::ones(cov.nrows());
  let res = max_sharpe_weights(unit.view(), cov, risk_free_rate)?;
  Ok(OptimizationResult {
    expected_return: f64::NAN,
    ..res
  })
}

/// Equal-weight allocation evaluated under `er` and `cov`.
pub fn equal_weights(er: ArrayView1<'_, f64>, cov: ArrayView2<'_, f64>) -> Result<OptimizationResult> {
  let n = validate(er, cov)?;
  Ok(OptimizationResult::evaluate(
    Array1::from_elem(n, 1.0 / n as f64),
    er,
    cov,
  ))
}
