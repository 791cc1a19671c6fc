//! Tabular Q-learning agent driving the replay memories of `halite-core`.
pub mod tabular;
pub use tabular::{
    EpsilonGreedy, LearnStat, PrioritizedTabularQLearner, TabularQLearner, TabularQLearnerConfig,
    TabularQModel, TabularQModelConfig, UniformTabularQLearner,
};
