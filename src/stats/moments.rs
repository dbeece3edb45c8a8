//! # Higher Moments
//!
//! $$
//! S=\frac{\frac1n\sum(r-\bar r)^3}{\sigma_n^3},\qquad K=\frac{\frac1n\sum(r-\bar r)^4}{\sigma_n^4}
//! $$
//!
//! Both moments use the population standard deviation $\sigma_n$ (divide by
//! `n`), unlike [`super::periodic_volatility`] which divides by `n - 1`.
//! Kurtosis is raw, not excess.

use ndarray::ArrayView1;

use super::valid;

fn standardized_moment(r: ArrayView1<'_, f64>, order: i32) -> f64 {
  let xs = valid(r);
  if xs.is_empty() {
    return f64::NAN;
  }

  let n = xs.len() as f64;
  let m = xs.iter().sum::<f64>() / n;
  let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n;
  let central = xs.iter().map(|x| (x - m).powi(order)).sum::<f64>() / n;

  central / var.sqrt().powi(order)
}

pub fn skewness(r: ArrayView1<'_, f64>) -> f64 {
  standardized_moment(r, 3)
}

pub fn kurtosis(r: ArrayView1<'_, f64>) -> f64 {
  standardized_moment(r, 4)
}
