use log::{debug, info};

use crate::{
    env::Mdp,
    error::SolverError,
    solver::{backup, residual, Policy, ValueTable},
};

/// Configuration for the [`ValueIteration`] solver
pub struct ValueIterationConfig {
    /// Maximum absolute value change under which a sweep counts as converged
    pub tolerance: f64,
    /// Sweep budget; exceeding it surfaces [`SolverError::NotConverged`]
    pub max_sweeps: u32,
}

impl Default for ValueIterationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_sweeps: 10_000,
        }
    }
}

/// Value iteration over a fully known MDP
///
/// Runs the Bellman optimality backup
/// `V(s) = max_a [r(s, a) + gamma * V(s') * w(s, s')]` as a single fixed
/// point over V, pinning terminal states to 0, and extracts the greedy
/// policy once converged. For `gamma < 1` the backup is a contraction, so
/// unlike policy iteration this is guaranteed to terminate.
pub struct ValueIteration<M: Mdp> {
    state_value: ValueTable<M::State>,
    policy: Policy<M::State, M::Action>,
    config: ValueIterationConfig,
}

impl<M: Mdp> ValueIteration<M> {
    pub fn new(config: ValueIterationConfig) -> Self {
        Self {
            state_value: ValueTable::new(),
            policy: Policy::new(),
            config,
        }
    }

    /// Start from caller-chosen initial values instead of zeros
    ///
    /// The converged policy does not depend on the starting point; this
    /// exists to warm-start from a previous solution (and to test exactly
    /// that independence).
    pub fn with_initial_values(config: ValueIterationConfig, values: ValueTable<M::State>) -> Self {
        Self {
            state_value: values,
            policy: Policy::new(),
            config,
        }
    }

    /// Run value iteration to convergence
    ///
    /// **Returns** the number of sweeps taken
    pub fn solve(&mut self, mdp: &M) -> Result<u32, SolverError> {
        let states = mdp.states();
        for &state in &states {
            self.state_value.entry(state).or_insert(0.0);
        }

        let mut sweeps = 0;
        loop {
            let mut delta = 0.0_f64;
            let mut new_values = ValueTable::with_capacity(states.len());
            for &state in &states {
                let value = if mdp.is_terminal(state) {
                    0.0
                } else {
                    let mut best = None;
                    for (_, action) in mdp.actions(state) {
                        let q = backup(mdp, &self.state_value, state, action);
                        if best.map_or(true, |b| q > b) {
                            best = Some(q);
                        }
                    }
                    best.ok_or(SolverError::NoLegalActions)?
                };
                delta = delta.max(residual(self.state_value[&state], value));
                new_values.insert(state, value);
            }
            self.state_value = new_values;
            sweeps += 1;
            debug!("value iteration sweep {sweeps}: residual {delta:e}");

            if delta <= self.config.tolerance {
                break;
            }
            if sweeps >= self.config.max_sweeps {
                return Err(SolverError::NotConverged {
                    sweeps,
                    residual: delta,
                });
            }
        }
        info!("value iteration converged after {sweeps} sweeps");

        self.extract_policy(mdp)?;
        Ok(sweeps)
    }

    /// Greedy one-step-lookahead policy under the converged values
    fn extract_policy(&mut self, mdp: &M) -> Result<(), SolverError> {
        self.policy.clear();
        for state in mdp.states() {
            let action = if mdp.is_terminal(state) {
                None
            } else {
                let mut best: Option<(M::Action, f64)> = None;
                for (_, action) in mdp.actions(state) {
                    let q = backup(mdp, &self.state_value, state, action);
                    match best {
                        Some((_, best_q)) if q <= best_q => {}
                        _ => best = Some((action, q)),
                    }
                }
                Some(best.ok_or(SolverError::NoLegalActions)?.0)
            };
            self.policy.insert(state, action);
        }
        Ok(())
    }

    pub fn policy(&self) -> &Policy<M::State, M::Action> {
        &self.policy
    }

    pub fn state_value(&self) -> &ValueTable<M::State> {
        &self.state_value
    }
}
