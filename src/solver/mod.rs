mod monte_carlo;
mod policy_iteration;
mod td;
mod value_iteration;

pub use monte_carlo::{evaluate, MonteCarlo, MonteCarloConfig};
pub use policy_iteration::{PolicyIteration, PolicyIterationConfig};
pub use td::{td0, TdConfig, TdMethod, TdSolver};
pub use value_iteration::{ValueIteration, ValueIterationConfig};

use std::collections::HashMap;

use crate::env::Mdp;

/// A trait for state and action types that can be used as keys in a [`HashMap`]
pub trait Tabular: Copy + Eq + std::hash::Hash {}

impl<T> Tabular for T where T: Copy + Eq + std::hash::Hash {}

/// State-value table
pub type ValueTable<S> = HashMap<S, f64>;

/// Action-value table keyed by (state, action)
pub type QTable<S, A> = HashMap<(S, A), f64>;

/// The artifact every solver produces: the chosen action per state, `None`
/// for terminal states
pub type Policy<S, A> = HashMap<S, Option<A>>;

/// The Q-maximizing action among `actions`, ties broken by the first
/// maximum in enumeration order
///
/// Missing table entries count as 0. Returns `None` when `actions` is empty.
pub fn greedy_action<S, A>(q: &QTable<S, A>, state: S, actions: &[A]) -> Option<A>
where
    S: Tabular,
    A: Tabular,
{
    let mut best: Option<(A, f64)> = None;
    for &action in actions {
        let value = *q.get(&(state, action)).unwrap_or(&0.0);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((action, value)),
        }
    }
    best.map(|(action, _)| action)
}

/// Extract the greedy policy from a Q-table, mapping terminal states (and
/// states with no legal actions) to `None`
pub fn greedy_policy<M: Mdp>(mdp: &M, q: &QTable<M::State, M::Action>) -> Policy<M::State, M::Action> {
    let mut policy = Policy::new();
    for state in mdp.states() {
        let action = if mdp.is_terminal(state) {
            None
        } else {
            let actions = mdp.actions(state).into_iter().map(|(_, a)| a).collect::<Vec<_>>();
            greedy_action(q, state, &actions)
        };
        policy.insert(state, action);
    }
    policy
}

/// One-step lookahead estimate `r + gamma * V(s') * w(s, s')`
pub(crate) fn backup<M: Mdp>(
    mdp: &M,
    values: &ValueTable<M::State>,
    state: M::State,
    action: M::Action,
) -> f64 {
    let (next, reward) = mdp.step(state, action);
    reward + mdp.gamma() * values.get(&next).copied().unwrap_or(0.0) * mdp.transition_weight(state, next)
}

/// Absolute value change, where two identical values are zero change even
/// when both are infinite (their difference would be NaN)
pub(crate) fn residual(old: f64, new: f64) -> f64 {
    if old == new {
        0.0
    } else {
        (new - old).abs()
    }
}
