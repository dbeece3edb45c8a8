//! # Stochastic Scenarios
//!
//! $$
//! r_t=\mu\,\Delta t+\sigma\sqrt{\Delta t}\,\xi_t,\qquad \xi_t\sim\mathcal N(0,1)
//! $$
//!
//! Monte Carlo return scenarios for feeding the statistics and backtest layers.
//!
//! | Module  | Description                                        |
//! |---------|----------------------------------------------------|
//! | [`gbm`] | Geometric Brownian motion return and price paths.  |

pub mod gbm;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

pub use gbm::GbmConfig;
pub use gbm::GbmPaths;

/// Sampling entry points shared by scenario generators.
pub trait PathSampler {
  type Output;

  /// Draw with a caller-supplied generator.
  fn sample_using<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Output;

  /// Draw with the thread-local generator.
  fn sample(&self) -> Self::Output {
    self.sample_using(&mut rand::thread_rng())
  }

  /// Draw reproducibly from `seed`.
  fn sample_seeded(&self, seed: u64) -> Self::Output {
    self.sample_using(&mut StdRng::seed_from_u64(seed))
  }
}
