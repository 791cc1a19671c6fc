//! Action-value table.
use anyhow::{bail, Result};
use halite_core::{error::HaliteError, ActionModel};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`TabularQModel`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TabularQModelConfig {
    /// Number of states.
    pub n_states: usize,

    /// Number of actions.
    pub n_actions: usize,

    /// Step size of updates.
    pub learning_rate: f32,

    /// Initial action-value of every state-action pair.
    pub init_q: f32,
}

impl Default for TabularQModelConfig {
    fn default() -> Self {
        Self {
            n_states: 1,
            n_actions: 2,
            learning_rate: 0.1,
            init_q: 0.0,
        }
    }
}

impl TabularQModelConfig {
    /// Sets the number of states.
    pub fn n_states(mut self, v: usize) -> Self {
        self.n_states = v;
        self
    }

    /// Sets the number of actions.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
        self
    }

    /// Sets the learning rate.
    pub fn learning_rate(mut self, v: f32) -> Self {
        self.learning_rate = v;
        self
    }

    /// Sets the initial action-value.
    pub fn init_q(mut self, v: f32) -> Self {
        self.init_q = v;
        self
    }
}

/// Action-values of a discrete state and action space held in a table.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TabularQModel {
    n_states: usize,
    n_actions: usize,
    learning_rate: f32,
    q: Vec<f32>,
}

impl TabularQModel {
    /// Constructs a table filled with `init_q`.
    pub fn build(config: TabularQModelConfig) -> Result<Self> {
        if config.n_states == 0 || config.n_actions == 0 {
            bail!(HaliteError::InvalidArgument(format!(
                "table must have at least one state and action, got {}x{}",
                config.n_states, config.n_actions
            )));
        }

        Ok(Self {
            n_states: config.n_states,
            n_actions: config.n_actions,
            learning_rate: config.learning_rate,
            q: vec![config.init_q; config.n_states * config.n_actions],
        })
    }

    /// Number of actions.
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Number of states.
    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Action-value of `(state, action)`.
    pub fn q(&self, state: usize, action: usize) -> Result<f32> {
        Ok(self.q[self.ix(state, action)?])
    }

    fn ix(&self, state: usize, action: usize) -> Result<usize> {
        if state >= self.n_states || action >= self.n_actions {
            bail!(HaliteError::InvalidArgument(format!(
                "({}, {}) is out of a {}x{} table",
                state, action, self.n_states, self.n_actions
            )));
        }
        Ok(state * self.n_actions + action)
    }

    fn row(&self, state: usize) -> Result<&[f32]> {
        let start = self.ix(state, 0)?;
        Ok(&self.q[start..start + self.n_actions])
    }
}

fn check_len(name: &str, len: usize, expected: usize) -> Result<()> {
    if len != expected {
        bail!(HaliteError::InvalidArgument(format!(
            "length of {} is {}, expected {}",
            name, len, expected
        )));
    }
    Ok(())
}

impl ActionModel for TabularQModel {
    type State = usize;
    type Action = usize;

    fn predict_q(&self, states: &[usize], actions: &[usize]) -> Result<Vec<f32>> {
        check_len("actions", actions.len(), states.len())?;
        states
            .iter()
            .zip(actions.iter())
            .map(|(&s, &a)| self.q(s, a))
            .collect()
    }

    /// Ties are broken towards the smallest action.
    fn greedy(&self, states: &[usize]) -> Result<(Vec<usize>, Vec<f32>)> {
        let mut actions = Vec::with_capacity(states.len());
        let mut values = Vec::with_capacity(states.len());

        for &s in states {
            let (a, q) = self
                .row(s)?
                .iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |(a_best, q_best), (a, &q)| {
                    if q > q_best {
                        (a, q)
                    } else {
                        (a_best, q_best)
                    }
                });
            actions.push(a);
            values.push(q);
        }

        Ok((actions, values))
    }

    /// All TD errors are measured on the table before any pair is updated.
    fn update_q(
        &mut self,
        target_returns: &[f32],
        states: &[usize],
        actions: &[usize],
        mu: Option<&[f32]>,
    ) -> Result<Vec<f32>> {
        check_len("states", states.len(), target_returns.len())?;
        check_len("actions", actions.len(), target_returns.len())?;
        if let Some(mu) = mu {
            check_len("mu", mu.len(), target_returns.len())?;
        }

        let ixs = states
            .iter()
            .zip(actions.iter())
            .map(|(&s, &a)| self.ix(s, a))
            .collect::<Result<Vec<_>>>()?;
        let td_errs = ixs
            .iter()
            .zip(target_returns.iter())
            .map(|(&ix, &tgt)| tgt - self.q[ix])
            .collect::<Vec<_>>();

        for (i, (&ix, &td_err)) in ixs.iter().zip(td_errs.iter()).enumerate() {
            let w = mu.map_or(1.0, |mu| mu[i]);
            self.q[ix] += self.learning_rate * w * td_err;
        }

        Ok(td_errs)
    }

    fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let model = serde_yaml::from_reader(rdr)?;
        Ok(model)
    }
}
