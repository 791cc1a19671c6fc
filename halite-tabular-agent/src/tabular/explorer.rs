//! Exploration strategy of the tabular agent.
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer.
///
/// With probability [`greedy_prob`](EpsilonGreedy::greedy_prob) the greedy
/// action is taken, otherwise a uniformly random one. When `eps_increment` is
/// set, the greedy probability starts at `eps_start` and grows by the increment
/// on every action up to `eps_max`; otherwise it stays at `eps_max`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    pub n_opts: usize,
    pub eps_start: f64,
    pub eps_max: f64,
    pub eps_increment: Option<f64>,
}

#[allow(clippy::new_without_default)]
impl EpsilonGreedy {
    /// Constructs an explorer taking the greedy action with probability 0.9.
    pub fn new() -> Self {
        Self {
            n_opts: 0,
            eps_start: 0.0,
            eps_max: 0.9,
            eps_increment: None,
        }
    }

    /// Constructs an explorer whose greedy probability ramps up from 0.
    pub fn with_increment(eps_increment: f64) -> Self {
        Self {
            eps_increment: Some(eps_increment),
            ..Self::new()
        }
    }

    /// Current probability of taking the greedy action.
    pub fn greedy_prob(&self) -> f64 {
        match self.eps_increment {
            Some(d) => (self.eps_start + d * self.n_opts as f64).min(self.eps_max),
            None => self.eps_max,
        }
    }

    /// Takes an action given the greedy one.
    pub fn action(&mut self, greedy_action: usize, n_actions: usize) -> usize {
        let is_greedy = fastrand::f64() < self.greedy_prob();
        self.n_opts += 1;

        if is_greedy || n_actions == 0 {
            greedy_action
        } else {
            fastrand::usize(..n_actions)
        }
    }

    /// Set the greedy probability at the start.
    pub fn eps_start(self, v: f64) -> Self {
        let mut s = self;
        s.eps_start = v;
        s
    }

    /// Set the maximum greedy probability.
    pub fn eps_max(self, v: f64) -> Self {
        let mut s = self;
        s.eps_max = v;
        s
    }
}

#[cfg(test)]
mod tests {
    use super::EpsilonGreedy;

    #[test]
    fn test_greedy_prob_ramps_up() {
        let mut explorer = EpsilonGreedy::with_increment(0.25).eps_max(0.9);
        assert_eq!(explorer.greedy_prob(), 0.0);
        explorer.action(0, 2);
        explorer.action(0, 2);
        assert_eq!(explorer.greedy_prob(), 0.5);
        for _ in 0..10 {
            explorer.action(0, 2);
        }
        assert_eq!(explorer.greedy_prob(), 0.9);
    }

    #[test]
    fn test_action_extremes() {
        fastrand::seed(5);
        let mut greedy = EpsilonGreedy::new().eps_max(1.0);
        assert!((0..100).all(|_| greedy.action(3, 4) == 3));

        let mut random = EpsilonGreedy::new().eps_max(0.0);
        let actions = (0..200).map(|_| random.action(3, 4)).collect::<Vec<_>>();
        assert!(actions.iter().all(|&a| a < 4));
        assert!((0..4).all(|a| actions.contains(&a)));
    }
}
