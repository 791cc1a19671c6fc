//! Tabular Q-learning agent.
mod base;
mod config;
pub mod explorer;
pub mod model;
pub use base::{LearnStat, PrioritizedTabularQLearner, TabularQLearner, UniformTabularQLearner};
pub use config::TabularQLearnerConfig;
pub use explorer::EpsilonGreedy;
pub use model::{TabularQModel, TabularQModelConfig};
