use log::{debug, info};
use rand::{seq::SliceRandom, Rng};

use crate::{
    env::Mdp,
    error::SolverError,
    solver::{backup, residual, Policy, ValueTable},
};

/// Configuration for the [`PolicyIteration`] solver
pub struct PolicyIterationConfig {
    /// Maximum absolute value change under which an evaluation sweep counts
    /// as converged
    pub tolerance: f64,
    /// Sweep budget for each inner policy-evaluation fixed point
    pub max_eval_sweeps: u32,
    /// Budget of outer improvement iterations
    pub max_iterations: u32,
}

impl Default for PolicyIterationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_eval_sweeps: 10_000,
            max_iterations: 100,
        }
    }
}

/// Policy iteration over a fully known MDP
///
/// Alternates policy evaluation (a nested fixed-point loop recomputing V
/// under the current policy) with greedy one-step-lookahead improvement,
/// stopping once an improvement sweep changes no state. The improvement
/// step re-evaluates the policy once per state, so each outer iteration is
/// quadratic in the state count in the worst case. MDPs whose structure
/// induces policy oscillation exhaust `max_iterations` and surface
/// [`SolverError::PolicyUnstable`] instead of looping forever.
pub struct PolicyIteration<M: Mdp> {
    state_value: ValueTable<M::State>,
    policy: Policy<M::State, M::Action>,
    config: PolicyIterationConfig,
}

impl<M: Mdp> PolicyIteration<M> {
    pub fn new(config: PolicyIterationConfig) -> Self {
        Self {
            state_value: ValueTable::new(),
            policy: Policy::new(),
            config,
        }
    }

    /// Run policy iteration to convergence
    ///
    /// **Returns** the number of outer iterations taken
    pub fn solve<R: Rng + ?Sized>(&mut self, mdp: &M, rng: &mut R) -> Result<u32, SolverError> {
        self.initialize_policy(mdp, rng);

        let states = mdp.states();
        let mut iterations = 0;
        loop {
            iterations += 1;
            let previous = self.policy.clone();
            self.improve(mdp)?;
            debug!("policy iteration {iterations}");

            let changed = states.iter().filter(|s| previous[s] != self.policy[s]).count();
            if changed == 0 {
                break;
            }
            if iterations >= self.config.max_iterations {
                return Err(SolverError::PolicyUnstable { iterations, changed });
            }
        }
        info!("policy iteration converged after {iterations} iterations");

        self.state_value = self.evaluate(mdp)?;
        Ok(iterations)
    }

    /// Arbitrary legal action per non-terminal state, `None` for terminal
    fn initialize_policy<R: Rng + ?Sized>(&mut self, mdp: &M, rng: &mut R) {
        self.policy.clear();
        for state in mdp.states() {
            let action = if mdp.is_terminal(state) {
                None
            } else {
                mdp.actions(state).choose(rng).map(|&(_, a)| a)
            };
            self.policy.insert(state, action);
        }
    }

    /// Fixed-point evaluation of the current policy
    fn evaluate(&self, mdp: &M) -> Result<ValueTable<M::State>, SolverError> {
        let states = mdp.states();
        let mut values = states.iter().map(|&s| (s, 0.0)).collect::<ValueTable<_>>();

        let mut sweeps = 0;
        loop {
            let mut delta = 0.0_f64;
            let mut new_values = ValueTable::with_capacity(states.len());
            for &state in &states {
                let value = if mdp.is_terminal(state) {
                    0.0
                } else {
                    let action = self.policy[&state].ok_or(SolverError::NoLegalActions)?;
                    backup(mdp, &values, state, action)
                };
                delta = delta.max(residual(values[&state], value));
                new_values.insert(state, value);
            }
            values = new_values;
            sweeps += 1;

            if delta <= self.config.tolerance {
                break;
            }
            if sweeps >= self.config.max_eval_sweeps {
                return Err(SolverError::NotConverged {
                    sweeps,
                    residual: delta,
                });
            }
        }

        Ok(values)
    }

    /// Greedy one-step-lookahead improvement, evaluating the current policy
    /// afresh for every state
    fn improve(&mut self, mdp: &M) -> Result<(), SolverError> {
        for state in mdp.states() {
            if mdp.is_terminal(state) {
                continue;
            }

            let values = self.evaluate(mdp)?;
            let mut best: Option<(M::Action, f64)> = None;
            for (_, action) in mdp.actions(state) {
                let q = backup(mdp, &values, state, action);
                match best {
                    Some((_, best_q)) if q <= best_q => {}
                    _ => best = Some((action, q)),
                }
            }
            let action = best.ok_or(SolverError::NoLegalActions)?.0;
            self.policy.insert(state, Some(action));
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
