use anyhow::Result;
use halite_core::{
    replay_memory::{PerConfig, ReplayMemoryConfig, SampledBatch},
    Configurable, ExperienceBufferBase, ReplayBufferBase, Transition,
};
use halite_tabular_agent::{
    EpsilonGreedy, PrioritizedTabularQLearner, TabularQLearner, TabularQLearnerConfig,
    TabularQModelConfig, UniformTabularQLearner,
};
use tempdir::TempDir;

type Tr = Transition<usize, usize>;

const N_STATES: usize = 5;
const GOAL: usize = N_STATES - 1;

/// Walk on a chain: action 0 moves left, action 1 moves right, reaching the
/// last state gives reward 1 and ends the episode.
fn step(state: usize, action: usize) -> (usize, f32, bool) {
    let next = if action == 1 {
        state + 1
    } else {
        state.saturating_sub(1)
    };
    if next == GOAL {
        (next, 1.0, true)
    } else {
        (next, 0.0, false)
    }
}

fn config(per_config: Option<PerConfig>) -> TabularQLearnerConfig {
    TabularQLearnerConfig::default()
        .model_config(
            TabularQModelConfig::default()
                .n_states(N_STATES)
                .n_actions(2)
                .learning_rate(0.1),
        )
        .memory_config(
            ReplayMemoryConfig::default()
                .capacity(64)
                .seed(13)
                .per_config(per_config),
        )
        .explorer(EpsilonGreedy::new().eps_max(1.0))
        .batch_size(16)
        .discount_factor(0.9)
        .replace_target_iter(10)
}

fn fill_and_learn<R>(learner: &mut TabularQLearner<R>) -> Result<()>
where
    R: ReplayBufferBase<Config = ReplayMemoryConfig, Batch = SampledBatch<Tr>>
        + ExperienceBufferBase<Item = Tr>,
{
    assert!(learner.learn()?.is_none());

    for i in 0..64 {
        let state = (i / 2) % GOAL;
        let action = i % 2;
        let (next_state, reward, done) = step(state, action);
        learner.store_trans(state, action, reward, next_state, done)?;
    }

    let mut last = None;
    for _ in 0..3000 {
        last = learner.learn()?;
    }
    let stat = last.expect("memory holds more than a batch");
    assert_eq!(stat.learn_steps, 3000);
    assert!(stat.loss < 1e-2, "loss {}", stat.loss);
    Ok(())
}

fn assert_prefers_right<R>(learner: &mut TabularQLearner<R>) -> Result<()>
where
    R: ReplayBufferBase<Config = ReplayMemoryConfig, Batch = SampledBatch<Tr>>
        + ExperienceBufferBase<Item = Tr>,
{
    for state in 0..GOAL {
        let right = learner.model().q(state, 1)?;
        let left = learner.model().q(state, 0)?;
        let expected = 0.9f32.powi((GOAL - 1 - state) as i32);
        assert!((right - expected).abs() < 0.02, "Q({}, right) = {}", state, right);
        assert!(right > left, "state {}: right {} <= left {}", state, right, left);
        assert_eq!(learner.pick_action(state)?, 1);
    }
    Ok(())
}

#[test_log::test]
fn test_prioritized_learner_solves_chain() -> Result<()> {
    let mut learner = PrioritizedTabularQLearner::build(config(Some(PerConfig::default())))?;
    fill_and_learn(&mut learner)?;
    assert_prefers_right(&mut learner)?;
    assert_eq!(learner.memory().beta(), 1.0);
    Ok(())
}

#[test_log::test]
fn test_uniform_learner_solves_chain() -> Result<()> {
    let mut learner = UniformTabularQLearner::build(config(None))?;
    fill_and_learn(&mut learner)?;
    assert_prefers_right(&mut learner)
}

#[test_log::test]
fn test_save_and_load_params() -> Result<()> {
    let mut learner = PrioritizedTabularQLearner::build(config(Some(PerConfig::default())))?;
    fill_and_learn(&mut learner)?;

    let dir = TempDir::new("tabular_q_learner")?;
    learner.save_params(dir.path())?;

    let mut fresh = PrioritizedTabularQLearner::build(config(Some(PerConfig::default())))?;
    fresh.load_params(dir.path())?;
    assert_eq!(fresh.model(), learner.model());
    Ok(())
}

#[test_log::test]
fn test_build_from_path() -> Result<()> {
    let dir = TempDir::new("tabular_q_learner_config")?;
    let path = dir.path().join("learner.yaml");
    config(None).save(&path)?;

    let learner = UniformTabularQLearner::build_from_path(&path)?;
    assert_eq!(learner.model().n_states(), N_STATES);

    // A prioritized learner needs PER parameters.
    assert!(PrioritizedTabularQLearner::build_from_path(&path).is_err());
    Ok(())
}
