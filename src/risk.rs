//! # Risk
//!
//! $$
//! DD_t=\frac{W_t}{\max_{s\le t}W_s}-1
//! $$
//!
//! Drawdown tracking and Value-at-Risk estimators for a single return series.

pub mod drawdown;
pub mod var;

pub use drawdown::drawdowns;
pub use drawdown::DrawdownSeries;
pub use var::cornish_fisher_z;
pub use var::value_at_risk;
pub use var::VarMode;
