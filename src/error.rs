//! # Errors
//!
//! Failure modes surfaced by the analytics core. Numerical degeneracy (zero
//! volatility, empty windows) is not an error: it propagates as `NaN`.

use thiserror::Error;

/// Result type alias using [`StatsError`].
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors that can occur while building tables or running computations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
  /// An operation that needs a single return series received a table.
  #[error("{operation}() can only take a single return series, got a table with {columns} columns")]
  TypeMismatch {
    /// Name of the rejected operation.
    operation: &'static str,
    /// Number of columns in the offending table.
    columns: usize,
  },

  /// Column lookup by name failed.
  #[error("column not found: {0}")]
  ColumnNotFound(String),

  /// Inputs with incompatible dimensions.
  #[error("shape mismatch: {0}")]
  ShapeMismatch(String),

  /// Date index is not non-decreasing.
  #[error("date index must be non-decreasing (row {row})")]
  UnsortedIndex {
    /// First row that is earlier than its predecessor.
    row: usize,
  },

  /// Periodicity tag not in {daily, monthly, quarterly}.
  #[error("unknown periodicity: {0}")]
  UnknownPeriodicity(String),

  /// Parameter outside its admissible range.
  #[error("invalid parameter: {0}")]
  InvalidParameter(String),

  /// Target return cannot be reached by a long-only, fully invested portfolio.
  #[error("target return {target} is outside the attainable range [{min}, {max}]")]
  InfeasibleTarget {
    /// Requested portfolio return.
    target: f64,
    /// Smallest expected return in the universe.
    min: f64,
    /// Largest expected return in the universe.
    max: f64,
  },

  /// Optimizer stopped without a feasible optimum.
  #[error("optimizer did not converge: {0}")]
  NonConvergence(String),
}
