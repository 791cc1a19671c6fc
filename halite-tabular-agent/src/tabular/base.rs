//! Tabular Q-learning agent with experience replay.
use super::{
    config::TabularQLearnerConfig,
    explorer::EpsilonGreedy,
    model::TabularQModel,
};
use anyhow::{bail, Result};
use halite_core::{
    error::HaliteError,
    replay_memory::{ReplayMemory, ReplayMemoryConfig, SampledBatch, UniformMemory},
    ActionModel, Configurable, ExperienceBufferBase, ReplayBufferBase, Transition,
};
use log::{debug, info};
use std::{fs, path::Path};

type Tr = Transition<usize, usize>;

/// Tabular Q-learner backed by a prioritized replay memory.
pub type PrioritizedTabularQLearner = TabularQLearner<ReplayMemory<Tr>>;

/// Tabular Q-learner backed by a uniform replay memory.
pub type UniformTabularQLearner = TabularQLearner<UniformMemory<Tr>>;

/// Statistics of a learning step.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnStat {
    /// Importance-weighted mean squared TD error of the batch.
    pub loss: f32,

    /// Learning steps taken so far, including this one.
    pub learn_steps: usize,
}

/// Q-learning agent over a discrete state and action space.
///
/// The agent stores every transition into its replay memory; each call of
/// [`learn`](TabularQLearner::learn) samples a batch, moves the eval table
/// towards one-step targets computed with the target table, and writes the
/// absolute TD errors back to the memory as new priorities. The target table is
/// replaced by the eval table every `replace_target_iter` learning steps.
pub struct TabularQLearner<R> {
    qnet: TabularQModel,
    qnet_tgt: TabularQModel,
    memory: R,
    explorer: EpsilonGreedy,
    batch_size: usize,
    discount_factor: f32,
    replace_target_iter: usize,
    learn_step_counter: usize,
}

impl<R> TabularQLearner<R>
where
    R: ReplayBufferBase<Config = ReplayMemoryConfig, Batch = SampledBatch<Tr>>
        + ExperienceBufferBase<Item = Tr>,
{
    /// Stores a transition into the replay memory.
    pub fn store_trans(
        &mut self,
        state: usize,
        action: usize,
        reward: f32,
        next_state: usize,
        done: bool,
    ) -> Result<()> {
        self.memory
            .push(Transition::new(state, action, reward, next_state, done))
    }

    /// Picks an action for `state` with the explorer.
    pub fn pick_action(&mut self, state: usize) -> Result<usize> {
        let (actions, _) = self.qnet.greedy(&[state])?;
        Ok(self.explorer.action(actions[0], self.qnet.n_actions()))
    }

    /// Performs a learning step.
    ///
    /// Returns `None` while the memory holds fewer than `batch_size` transitions.
    pub fn learn(&mut self) -> Result<Option<LearnStat>> {
        if self.memory.len() < self.batch_size {
            return Ok(None);
        }

        if self.learn_step_counter % self.replace_target_iter == 0 {
            self.qnet_tgt = self.qnet.clone();
            debug!("Replaced target table at step {}", self.learn_step_counter);
        }

        let (ixs, transitions, weights) = self.memory.batch(self.batch_size)?.unpack();
        let states = transitions.iter().map(|tr| tr.state).collect::<Vec<_>>();
        let actions = transitions.iter().map(|tr| tr.action).collect::<Vec<_>>();
        let next_states = transitions.iter().map(|tr| tr.next_state).collect::<Vec<_>>();

        let (_, q_next) = self.qnet_tgt.greedy(&next_states)?;
        let targets = transitions
            .iter()
            .zip(q_next.iter())
            .map(|(tr, &q)| {
                let not_done = if tr.done { 0.0 } else { 1.0 };
                tr.reward + self.discount_factor * q * not_done
            })
            .collect::<Vec<_>>();

        let td_errs = self
            .qnet
            .update_q(&targets, &states, &actions, Some(weights.as_slice()))?;
        let abs_errs = td_errs.iter().map(|e| e.abs()).collect::<Vec<_>>();
        self.memory.update_priority(&ixs, &abs_errs)?;

        let loss = td_errs
            .iter()
            .zip(weights.iter())
            .map(|(e, w)| w * e * e)
            .sum::<f32>()
            / td_errs.len() as f32;
        self.learn_step_counter += 1;

        Ok(Some(LearnStat {
            loss,
            learn_steps: self.learn_step_counter,
        }))
    }

    /// The eval table.
    pub fn model(&self) -> &TabularQModel {
        &self.qnet
    }

    /// The replay memory.
    pub fn memory(&self) -> &R {
        &self.memory
    }

    /// Save the eval and target tables in the given directory.
    pub fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(path.join("qnet.yaml"))?;
        self.qnet_tgt.save(path.join("qnet_tgt.yaml"))?;
        info!("Saved the tables in {:?}", path);
        Ok(())
    }

    /// Load the eval and target tables from the given directory.
    pub fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet = TabularQModel::load(path.join("qnet.yaml"))?;
        self.qnet_tgt = TabularQModel::load(path.join("qnet_tgt.yaml"))?;
        Ok(())
    }
}

impl<R> Configurable for TabularQLearner<R>
where
    R: ReplayBufferBase<Config = ReplayMemoryConfig, Batch = SampledBatch<Tr>>
        + ExperienceBufferBase<Item = Tr>,
{
    type Config = TabularQLearnerConfig;

    /// Constructs the agent and its replay memory.
    fn build(config: Self::Config) -> Result<Self> {
        if config.batch_size == 0 || config.replace_target_iter == 0 {
            bail!(HaliteError::InvalidArgument(format!(
                "batch_size and replace_target_iter must be positive, got {} and {}",
                config.batch_size, config.replace_target_iter
            )));
        }

        let qnet = TabularQModel::build(config.model_config)?;
        let qnet_tgt = qnet.clone();
        let memory = R::build(&config.memory_config)?;
        info!(
            "Built tabular Q-learner: {} states, {} actions, batch size {}",
            qnet.n_states(),
            qnet.n_actions(),
            config.batch_size
        );

        Ok(Self {
            qnet,
            qnet_tgt,
            memory,
            explorer: config.explorer,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            replace_target_iter: config.replace_target_iter,
            learn_step_counter: 0,
        })
    }
}
