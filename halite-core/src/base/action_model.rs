//! Action-value model.
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::path::Path;

/// An action-value model `Q(s, a)` used by an agent.
///
/// Implementations range from lookup tables to function approximators. All
/// methods work on batches; `states` and `actions` are aligned slices.
pub trait ActionModel {
    /// A single state.
    type State;

    /// A single action.
    type Action;

    /// Predicts the action-values of the given state-action pairs.
    fn predict_q(&self, states: &[Self::State], actions: &[Self::Action]) -> Result<Vec<f32>>;

    /// Greedily selects the best action for each state.
    ///
    /// Returns the selected actions along with their action-values.
    fn greedy(&self, states: &[Self::State]) -> Result<(Vec<Self::Action>, Vec<f32>)>;

    /// Moves the action-values of the given state-action pairs towards
    /// `target_returns`.
    ///
    /// `target_returns` may be n-step returns. `mu` optionally weights each pair,
    /// e.g. with importance-sampling weights of a prioritized replay memory.
    ///
    /// Returns the TD errors `target - Q(s, a)` measured before the update.
    fn update_q(
        &mut self,
        target_returns: &[f32],
        states: &[Self::State],
        actions: &[Self::Action],
        mu: Option<&[f32]>,
    ) -> Result<Vec<f32>>;

    /// Saves the parameters of the model.
    fn save(&self, path: impl AsRef<Path>) -> Result<()>;

    /// Loads a model saved with [`ActionModel::save`].
    fn load(path: impl AsRef<Path>) -> Result<Self>
    where
        Self: Sized;
}

/// A configurable object.
pub trait Configurable {
    /// Configuration.
    type Config: Clone + DeserializeOwned;

    /// Builds the object.
    fn build(config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Build the object with the configuration in the yaml file of the given path.
    fn build_from_path(path: impl AsRef<Path>) -> Result<Self>
    where
        Self: Sized,
    {
        let file = std::fs::File::open(path)?;
        let rdr = std::io::BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        Self::build(config)
    }
}
