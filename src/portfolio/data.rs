//! # Portfolio Inputs
//!
//! $$
//! \hat\Sigma_{ij}=\frac{1}{n_{ij}-1}\sum_{t\in T_{ij}}(r_{it}-\bar r_i)(r_{jt}-\bar r_j)
//! $$
//!
//! Expected returns and sample covariance built from the columns of a return
//! table.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;

use crate::data::ReturnTable;
use crate::error::Result;
use crate::stats::annualized_return;

fn pairwise_covariance(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
  let pairs: Vec<(f64, f64)> = x
    .iter()
    .zip(y.iter())
    .filter(|(a, b)| !a.is_nan() && !b.is_nan())
    .map(|(a, b)| (*a, *b))
    .collect();
  if pairs.len() < 2 {
    return f64::NAN;
  }

  let n = pairs.len() as f64;
  let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
  let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
  pairs.iter().map(|(a, b)| (a - mx) * (b - my)).sum::<f64>() / (n - 1.0)
}

fn columns_of(table: &ReturnTable, names: &[&str]) -> Result<ReturnTable> {
  if names.is_empty() {
    Ok(table.clone())
  } else {
    table.select(names)
  }
}

/// Periodic sample covariance of the named columns (all columns when `names`
/// is empty). Each entry uses the rows where both columns are observed.
pub fn covariance_of(table: &ReturnTable, names: &[&str]) -> Result<Array2<f64>> {
  let t = columns_of(table, names)?;
  let n = t.ncols();
  let mut cov = Array2::<f64>::from_elem((n, n), f64::NAN);

  for i in 0..n {
    for j in i..n {
      let c = pairwise_covariance(t.column_values(i), t.column_values(j));
      cov[[i, j]] = c;
      cov[[j, i]] = c;
    }
  }

  Ok(cov)
}

/// Annualized return of each named column (all columns when `names` is empty).
pub fn expected_returns(table: &ReturnTable, names: &[&str], periods_per_year: usize) -> Result<Array1<f64>> {
  let t = columns_of(table, names)?;
  Ok(
    (0..t.ncols())
      .map(|j| annualized_return(t.column_values(j), periods_per_year))
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;
  use crate::data::tests::daily_dates;
  use crate::error::StatsError;

  fn table() -> ReturnTable {
    ReturnTable::from_columns(
      daily_dates(5),
      vec![
        ("A".to_string(), vec![0.01, 0.02, 0.03, 0.04, 0.05]),
        ("B".to_string(), vec![0.02, 0.04, 0.06, 0.08, 0.10]),
        ("C".to_string(), vec![f64::NAN, 0.01, -0.01, 0.01, f64::NAN]),
      ],
    )
    .unwrap()
  }

  #[test]
  fn covariance_is_symmetric_with_unbiased_diagonal() {
    let cov = covariance_of(&table(), &["A", "B"]).unwrap();
    // var(A) with ddof = 1 over 0.01..0.05
    assert_relative_eq!(cov[[0, 0]], 0.00025, epsilon = 1e-15);
    assert_relative_eq!(cov[[0, 1]], 2.0 * cov[[0, 0]], epsilon = 1e-15);
    assert_eq!(cov[[0, 1]], cov[[1, 0]]);
  }

  #[test]
  fn pairwise_complete_rows_only() {
    let cov = covariance_of(&table(), &[]).unwrap();
    assert_eq!(cov.dim(), (3, 3));
    // C is observed on rows 1..=3 only
    let c: [f64; 3] = [0.01, -0.01, 0.01];
    let mean = 0.01 / 3.0;
    let var = c.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 2.0;
    assert_relative_eq!(cov[[2, 2]], var, epsilon = 1e-15);
    assert!(cov[[0, 2]].is_finite());
  }

  #[test]
  fn unknown_column_is_reported() {
    assert!(matches!(
      covariance_of(&table(), &["Z"]),
      Err(StatsError::ColumnNotFound(_))
    ));
  }

  #[test]
  fn expected_returns_are_annualized() {
    let er = expected_returns(&table(), &["A"], 252).unwrap();
    assert_relative_eq!(
      er[0],
      annualized_return(table().column_values(0), 252),
      epsilon = 1e-15
    );
  }
}
