use std::collections::HashMap;

use log::{debug, info};
use rand::Rng;

use crate::{
    decay::{self, Decay},
    env::Mdp,
    episode::{sample_episode, Behavior, Episode, DEFAULT_STEP_CAP},
    error::SolverError,
    exploration::EpsilonGreedy,
    solver::{greedy_policy, Policy, QTable, ValueTable},
};

/// Configuration for the [`MonteCarlo`] solver
pub struct MonteCarloConfig<D: Decay = decay::Constant> {
    /// Number of sampled episodes
    pub episodes: u32,
    /// Step cap per episode
    pub step_cap: u32,
    /// Initial value of every (state, action) visit count
    ///
    /// A small positive seed instead of zero: it preempts division by zero
    /// and slightly biases early estimates toward zero. Tunable.
    pub visit_seed: f64,
    /// Behavior policy; `None` samples actions uniformly at random
    pub exploration: Option<EpsilonGreedy<D>>,
}

impl Default for MonteCarloConfig<decay::Constant> {
    fn default() -> Self {
        Self {
            episodes: 10_000,
            step_cap: DEFAULT_STEP_CAP,
            visit_seed: 1e-3,
            exploration: None,
        }
    }
}

/// Every-visit Monte Carlo control
///
/// Estimates action values from whole sampled episodes with no
/// bootstrapping: each episode's discounted returns are folded into a
/// running per-(state, action) mean, and the greedy policy is extracted from
/// the final Q-table. Needs only the action labels and `step`, never the
/// transition model.
pub struct MonteCarlo<M: Mdp, D: Decay = decay::Constant> {
    q_table: QTable<M::State, M::Action>,
    visits: HashMap<(M::State, M::Action), f64>,
    policy: Policy<M::State, M::Action>,
    config: MonteCarloConfig<D>,
}

impl<M: Mdp, D: Decay> MonteCarlo<M, D> {
    /// **Panics** if `visit_seed` is not positive, since it is what keeps
    /// the incremental mean away from a division by zero
    pub fn new(config: MonteCarloConfig<D>) -> Self {
        assert!(config.visit_seed > 0.0, "`visit_seed` must be positive");
        Self {
            q_table: QTable::new(),
            visits: HashMap::new(),
            policy: Policy::new(),
            config,
        }
    }

    /// Sample `episodes` rollouts, each from a uniformly random start state,
    /// and fold their returns into the Q-table
    pub fn solve<R: Rng + ?Sized>(&mut self, mdp: &M, rng: &mut R) -> Result<(), SolverError> {
        self.q_table.clear();
        self.visits.clear();
        for state in mdp.states() {
            for (_, action) in mdp.actions(state) {
                self.q_table.insert((state, action), 0.0);
                self.visits.insert((state, action), self.config.visit_seed);
            }
        }

        for i in 0..self.config.episodes {
            let behavior = match &self.config.exploration {
                Some(policy) => Behavior::EpsilonGreedy(policy),
                None => Behavior::Uniform,
            };
            let episode = sample_episode(
                mdp,
                &self.q_table,
                behavior,
                None,
                self.config.step_cap,
                i as f64,
                rng,
            )?;
            self.update(mdp, &episode);

            if (i + 1) % 1000 == 0 {
                debug!("monte carlo episode {} of {}", i + 1, self.config.episodes);
            }
        }
        info!("monte carlo control finished {} episodes", self.config.episodes);

        self.policy = greedy_policy(mdp, &self.q_table);
        Ok(())
    }

    /// Incremental-mean update `Q += (G - Q) / count` at every step of the
    /// episode
    fn update(&mut self, mdp: &M, episode: &Episode<M::State, M::Action>) {
        let returns = episode.returns(mdp.gamma());
        for i in 0..episode.len() {
            let key = (episode.states[i], episode.actions[i]);
            let count = self.visits.entry(key).or_insert(self.config.visit_seed);
            *count += 1.0;
            let q = self.q_table.entry(key).or_insert(0.0);
            *q += (returns[i] - *q) / *count;
        }
    }

    pub fn policy(&self) -> &Policy<M::State, M::Action> {
        &self.policy
    }

    pub fn q_table(&self) -> &QTable<M::State, M::Action> {
        &self.q_table
    }
}

/// Monte Carlo state-value estimation over a batch of pre-generated episodes
///
/// Averages the discounted returns observed at every visit of each state,
/// with no bootstrapping. States never visited keep a value of 0. Intended
/// for comparing against bootstrapped estimates, not for control.
pub fn evaluate<M: Mdp>(mdp: &M, episodes: &[Episode<M::State, M::Action>]) -> ValueTable<M::State> {
    let mut totals = ValueTable::new();
    let mut counts: HashMap<M::State, f64> = HashMap::new();
    for state in mdp.states() {
        totals.insert(state, 0.0);
        counts.insert(state, 0.0);
    }

    for episode in episodes {
        let returns = episode.returns(mdp.gamma());
        for (i, &state) in episode.states.iter().enumerate() {
            *totals.entry(state).or_insert(0.0) += returns[i];
            *counts.entry(state).or_insert(0.0) += 1.0;
        }
    }

    for (state, total) in totals.iter_mut() {
        let count = counts[state];
        if count > 0.0 {
            *total /= count;
        }
    }
    totals
}
