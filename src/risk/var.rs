//! # Value-at-Risk
//!
//! $$
//! \mathrm{VaR}_p=-\left(\bar r+z_p\,\sigma\right),\qquad \tilde z_p=z_p+\frac{(z_p^2-1)S}{6}+\frac{(z_p^3-3z_p)(K-3)}{24}-\frac{(2z_p^3-5z_p)S^2}{36}
//! $$

use std::fmt::Display;

use ndarray::ArrayView1;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;

use crate::stats::kurtosis;
use crate::stats::mean;
use crate::stats::periodic_volatility;
use crate::stats::skewness;
use crate::stats::valid;

/// Value-at-Risk estimator.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum VarMode {
  /// Empirical percentile of the observed returns.
  Historic,
  /// Gaussian quantile scaled by mean and volatility.
  Parametric,
  /// Gaussian quantile corrected by the Cornish-Fisher expansion.
  Modified,
  /// Expected shortfall beyond the historic VaR.
  Conditional,
}

impl VarMode {
  pub const ALL: [VarMode; 4] = [
    VarMode::Historic,
    VarMode::Parametric,
    VarMode::Modified,
    VarMode::Conditional,
  ];
}

impl Display for VarMode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      VarMode::Historic => write!(f, "Historic VaR"),
      VarMode::Parametric => write!(f, "Parametric VaR"),
      VarMode::Modified => write!(f, "Modified VaR"),
      VarMode::Conditional => write!(f, "Conditional VaR"),
    }
  }
}

/// Percentile with linear interpolation between order statistics, skipping
/// missing values. `q` is a fraction in [0, 1].
pub(crate) fn percentile(r: ArrayView1<'_, f64>, q: f64) -> f64 {
  let mut xs = valid(r);
  if xs.is_empty() || !(0.0..=1.0).contains(&q) {
    return f64::NAN;
  }

  xs.sort_by(f64::total_cmp);
  let pos = q * (xs.len() - 1) as f64;
  let lo = pos.floor() as usize;
  let hi = pos.ceil() as usize;
  xs[lo] + (xs[hi] - xs[lo]) * (pos - lo as f64)
}

/// Cornish-Fisher adjusted quantile for skewness `s` and raw kurtosis `k`.
pub fn cornish_fisher_z(z: f64, s: f64, k: f64) -> f64 {
  z + (z.powi(2) - 1.0) * s / 6.0 + (z.powi(3) - 3.0 * z) * (k - 3.0) / 24.0
    - (2.0 * z.powi(3) - 5.0 * z) * s.powi(2) / 36.0
}

fn standard_normal_quantile(p: f64) -> f64 {
  let Ok(n) = Normal::new(0.0, 1.0) else {
    return f64::NAN;
  };
  n.inverse_cdf(p)
}

/// Value-at-Risk of `r` at `level` percent (5 means 5%), reported as a
/// positive loss. Levels outside (0, 100) give `NaN`.
pub fn value_at_risk(r: ArrayView1<'_, f64>, level: f64, mode: VarMode) -> f64 {
  if !(level > 0.0 && level < 100.0) {
    return f64::NAN;
  }
  let p = level / 100.0;

  match mode {
    VarMode::Historic => -percentile(r, p),
    VarMode::Parametric => {
      let z = standard_normal_quantile(p);
      -(mean(r) + z * periodic_volatility(r))
    }
    VarMode::Modified => {
      let z = cornish_fisher_z(standard_normal_quantile(p), skewness(r), kurtosis(r));
      -(mean(r) + z * periodic_volatility(r))
    }
    VarMode::Conditional => {
      let threshold = percentile(r, p);
      let tail: Vec<f64> = r.iter().copied().filter(|x| *x <= threshold).collect();
      if tail.is_empty() {
        return f64::NAN;
      }
      -(tail.iter().sum::<f64>() / tail.len() as f64)
    }
  }
}
