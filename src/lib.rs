//! # perfstats
//!
//! Portfolio performance analytics over time-indexed tables of periodic
//! returns.
//!
//! ## Modules
//!
//! | Module           | Description                                                                 |
//! |------------------|-----------------------------------------------------------------------------|
//! | [`config`]       | Periodicity and session parameters (risk-free rate, VaR level).             |
//! | [`data`]         | Dated return series and tables, windows, gap filling and weighted groups.   |
//! | [`stats`]        | Horizon returns, volatility, moments, Jarque-Bera and rolling drivers.      |
//! | [`risk`]         | Drawdown traces and Value-at-Risk estimators.                               |
//! | [`summary`]      | Per-column statistics table.                                                |
//! | [`portfolio`]    | Long-only mean-variance optimization and the efficient frontier.            |
//! | [`cppi`]         | Constant-proportion portfolio insurance backtests.                          |
//! | [`stochastic`]   | Geometric Brownian motion scenarios.                                        |
//! | [`context`]      | A table bound to its session parameters and active window.                  |
//!
//! Missing observations are `NaN` throughout. Calculators skip them; numerical
//! degeneracy propagates as `NaN` instead of failing a whole table.

pub mod config;
pub mod context;
pub mod cppi;
pub mod data;
pub mod error;
pub mod portfolio;
pub mod risk;
pub mod stats;
pub mod stochastic;
pub mod summary;

pub use config::Periodicity;
pub use config::StatsConfig;
pub use context::StatsContext;
pub use data::ReturnTable;
pub use data::Series;
pub use data::Window;
pub use error::Result;
pub use error::StatsError;
pub use risk::VarMode;
pub use summary::StatisticsTable;
