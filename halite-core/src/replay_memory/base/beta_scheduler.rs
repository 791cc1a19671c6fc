//! Scheduling the exponent of importance weight for PER.
use serde::{Deserialize, Serialize};

/// Scheduler of the exponent $\beta$ of importance-sampling weights.
///
/// $\beta$ starts at `beta_0` and grows by `beta_increment` on every sampling
/// call until it reaches `beta_final`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct BetaScheduler {
    /// Initial value of $\beta$.
    pub beta_0: f32,

    /// Final value of $\beta$.
    pub beta_final: f32,

    /// Increment of $\beta$ per sampling call.
    pub beta_increment: f32,

    /// Number of sampling calls so far.
    pub n_samples: usize,
}

impl BetaScheduler {
    /// Creates a scheduler.
    pub fn new(beta_0: f32, beta_final: f32, beta_increment: f32) -> Self {
        Self {
            beta_0,
            beta_final,
            beta_increment,
            n_samples: 0,
        }
    }

    /// Gets the exponent of importance sampling weight.
    pub fn beta(&self) -> f32 {
        (self.beta_0 + self.beta_increment * self.n_samples as f32).min(self.beta_final)
    }

    /// Counts a sampling call.
    pub fn add_n_samples(&mut self) {
        self.n_samples += 1;
    }
}
