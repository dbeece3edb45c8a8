//! # Stats
//!
//! $$
//! R_{cum}=\exp\Big(\sum_t \log(1+r_t)\Big)-1
//! $$
//!
//! Horizon returns, volatility, higher moments, normality testing and the
//! rolling-window drivers built on top of them. Every calculator works on a
//! single column view and skips missing (`NaN`) observations.

pub mod horizon;
pub mod moments;
pub mod normality;
pub mod rolling;

pub use horizon::annualized_return;
pub use horizon::annualized_volatility;
pub use horizon::cumulative_return;
pub use horizon::horizon_return;
pub use horizon::horizon_volatility;
pub use horizon::mean;
pub use horizon::median;
pub use horizon::observation_count;
pub use horizon::periodic_volatility;
pub use horizon::ReturnMode;
pub use horizon::VolatilityMode;
pub use moments::kurtosis;
pub use moments::skewness;
pub use normality::jarque_bera;
pub use normality::JarqueBeraOutcome;
pub use normality::JarqueBeraResult;

use ndarray::ArrayView1;

/// Valid observations of `r`, in order.
pub(crate) fn valid(r: ArrayView1<'_, f64>) -> Vec<f64> {
  r.iter().copied().filter(|v| !v.is_nan()).collect()
}
