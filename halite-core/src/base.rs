//! Core functionalities.
mod action_model;
mod replay_buffer;
pub use action_model::{ActionModel, Configurable};
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
