//! Transition stored in replay memories.
use serde::{Deserialize, Serialize};

/// One environment step: `(state, action, reward, next state, done)`.
///
/// Replay memories never inspect a transition; they store and return it by slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition<S, A> {
    /// State in which the action was taken.
    pub state: S,

    /// Action taken.
    pub action: A,

    /// Reward received.
    pub reward: f32,

    /// State after the action.
    pub next_state: S,

    /// Whether the episode terminated at `next_state`.
    pub done: bool,
}

impl<S, A> Transition<S, A> {
    /// Creates a transition.
    pub fn new(state: S, action: A, reward: f32, next_state: S, done: bool) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}
