//! # Normality
//!
//! $$
//! JB=\frac n6\Big(S^2+\frac{(K-3)^2}{4}\Big)\sim\chi^2_2
//! $$
//!
//! Moment-based normality testing of a return series.

pub mod jarque_bera;

pub use jarque_bera::jarque_bera;
pub use jarque_bera::JarqueBeraOutcome;
pub use jarque_bera::JarqueBeraResult;
