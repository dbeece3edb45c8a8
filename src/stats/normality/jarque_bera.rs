use ndarray::ArrayView1;
use statrs::distribution::ChiSquared;
use statrs::distribution::ContinuousCDF;

use crate::stats::valid;

/// Statistic and p-value of a computed Jarque-Bera test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JarqueBeraResult {
  /// JB test statistic.
  pub statistic: f64,
  /// p-value under chi-square(2) asymptotics.
  pub p_value: f64,
  /// Sample skewness.
  pub skewness: f64,
  /// Sample excess kurtosis.
  pub excess_kurtosis: f64,
}

/// Outcome of the Jarque-Bera test.
///
/// `Degenerate` is a regular outcome, not an error: empty, single-point,
/// constant or non-finite samples have no defined statistic and report `NaN`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JarqueBeraOutcome {
  Computed(JarqueBeraResult),
  Degenerate,
}

impl JarqueBeraOutcome {
  pub fn statistic(&self) -> f64 {
    match self {
      Self::Computed(res) => res.statistic,
      Self::Degenerate => f64::NAN,
    }
  }

  pub fn p_value(&self) -> f64 {
    match self {
      Self::Computed(res) => res.p_value,
      Self::Degenerate => f64::NAN,
    }
  }

  pub fn is_degenerate(&self) -> bool {
    matches!(self, Self::Degenerate)
  }

  /// Whether normality is rejected at `alpha`. Degenerate samples never reject.
  pub fn rejects_normality(&self, alpha: f64) -> bool {
    match self {
      Self::Computed(res) => res.p_value < alpha,
      Self::Degenerate => false,
    }
  }
}

/// Jarque-Bera test for normality on the non-missing observations of `r`.
pub fn jarque_bera(r: ArrayView1<'_, f64>) -> JarqueBeraOutcome {
  let sample = valid(r);
  if sample.len() < 2 || sample.iter().any(|x| !x.is_finite()) {
    return JarqueBeraOutcome::Degenerate;
  }

  let n = sample.len() as f64;
  let mean = sample.iter().sum::<f64>() / n;

  let mut m2 = 0.0;
  let mut m3 = 0.0;
  let mut m4 = 0.0;
  for &x in &sample {
    let d = x - mean;
    let d2 = d * d;
    m2 += d2;
    m3 += d2 * d;
    m4 += d2 * d2;
  }
  m2 /= n;
  m3 /= n;
  m4 /= n;

  if m2 <= 0.0 || !m2.is_finite() {
    return JarqueBeraOutcome::Degenerate;
  }

  let skewness = m3 / m2.powf(1.5);
  let kurtosis = m4 / (m2 * m2);
  let excess_kurtosis = kurtosis - 3.0;
  let statistic = (n / 6.0) * (skewness * skewness + 0.25 * excess_kurtosis * excess_kurtosis);

  let Ok(chi2) = ChiSquared::new(2.0) else {
    return JarqueBeraOutcome::Degenerate;
  };
  let p_value = (1.0 - chi2.cdf(statistic)).clamp(0.0, 1.0);

  JarqueBeraOutcome::Computed(JarqueBeraResult {
    statistic,
    p_value,
    skewness,
    excess_kurtosis,
  })
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use ndarray::aview1;
  use ndarray::Array1;
  use ndarray_rand::RandomExt;
  use rand::rngs::StdRng;
  use rand::Rng;
  use rand::SeedableRng;
  use rand_distr::StandardNormal;

  use super::*;
  use crate::stats::kurtosis;
  use crate::stats::skewness;

  #[test]
  fn jarque_bera_accepts_normal_sample() {
    let mut rng = StdRng::seed_from_u64(42);
    let x = Array1::<f64>::random_using(5000, StandardNormal, &mut rng);

    let res = jarque_bera(x.view());
    assert!(
      res.p_value() > 0.01,
      "p-value too small for normal sample: {res:?}"
    );
  }

  #[test]
  fn jarque_bera_rejects_bimodal_sample() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut x = Array1::<f64>::random_using(5000, StandardNormal, &mut rng);

    for v in x.iter_mut() {
      let u: f64 = rng.gen();
      *v += if u < 0.5 { -2.0 } else { 2.0 };
    }

    let res = jarque_bera(x.view());
    assert!(
      res.rejects_normality(0.05),
      "expected rejection for non-normal sample, got {res:?}"
    );
  }

  #[test]
  fn statistic_matches_moment_formula() {
    let r = [0.01, -0.02, 0.03, 0.0, 0.05, -0.04, 0.02, 0.01, f64::NAN];
    let v = aview1(&r);
    let s = skewness(v);
    let k = kurtosis(v);
    let expected = 8.0 / 6.0 * (s * s + (k - 3.0).powi(2) / 4.0);

    assert_relative_eq!(jarque_bera(v).statistic(), expected, epsilon = 1e-12);
  }

  #[test]
  fn degenerate_samples_yield_nan() {
    for r in [vec![], vec![0.01], vec![0.5, 0.5, 0.5], vec![f64::NAN, f64::NAN]] {
      let res = jarque_bera(aview1(&r));
      assert!(res.is_degenerate());
      assert!(res.statistic().is_nan());
      assert!(res.p_value().is_nan());
      assert!(!res.rejects_normality(0.05));
    }
  }
}
