use crate::solver::Tabular;

/// Represents a finite Markov decision process, defining the dynamics of an
/// environment a solver can plan over or learn from.
///
/// Dynamic-programming solvers need the whole contract; model-free solvers
/// only ever use the action labels from [`actions`](Mdp::actions) and sample
/// transitions through [`step`](Mdp::step).
pub trait Mdp {
    /// A state of the environment, used as a table key
    type State: Tabular;

    /// An action label, meaningful only relative to a state
    type Action: Tabular;

    /// Discount factor in `(0, 1]`, fixed for the lifetime of the instance
    fn gamma(&self) -> f64;

    /// Enumerate every state
    ///
    /// The order must be stable across calls within one solver run.
    fn states(&self) -> Vec<Self::State>;

    /// The legal actions in `state`, each with its probability under the
    /// environment's own action-choice model
    ///
    /// Probabilities sum to 1 over the returned actions. Must be non-empty
    /// for every non-terminal state.
    fn actions(&self, state: Self::State) -> Vec<(f64, Self::Action)>;

    /// Take `action` in `state`
    ///
    /// **Returns** `(next_state, reward)`. A reward of `f64::NEG_INFINITY`
    /// encodes a forbidden transition and must flow through solver
    /// arithmetic unclamped.
    ///
    /// Solvers never call this on a terminal state.
    fn step(&self, state: Self::State, action: Self::Action) -> (Self::State, f64);

    /// Determine if `state` is terminal
    fn is_terminal(&self, state: Self::State) -> bool;

    /// Weight applied to the successor value in the dynamic-programming
    /// backup, `V(s) = r + gamma * V(s') * transition_weight(s, s')`
    fn transition_weight(&self, _from: Self::State, _to: Self::State) -> f64 {
        1.0
    }
}
