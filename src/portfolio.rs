//! # Portfolio
//!
//! $$
//! \sigma_p=\sqrt{\mathbf w^\top\Sigma\mathbf w},\qquad \mu_p=\mathbf w^\top\mu
//! $$
//!
//! Long-only mean-variance optimization over expected returns and a
//! covariance matrix.

pub mod data;
pub mod frontier;
pub mod optimizers;
pub mod types;

pub use data::covariance_of;
pub use data::expected_returns;
pub use frontier::efficient_frontier;
pub use frontier::markowitz_space;
pub use optimizers::equal_weights;
pub use optimizers::global_min_variance_weights;
pub use optimizers::max_sharpe_weights;
pub use optimizers::minimize_volatility;
pub use types::portfolio_return;
pub use types::portfolio_volatility;
pub use types::FrontierPoint;
pub use types::MarkowitzSpace;
pub use types::OptimizationResult;
