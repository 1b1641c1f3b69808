use thiserror::Error;

/// Errors surfaced by solvers and exploration policies
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// The sampled draw matched no probability bin during epsilon-greedy
    /// selection. The bins partition the explore region exactly, so this
    /// signals a programming error in the partition, not a recoverable
    /// condition.
    #[error("no action matched the sampled draw across {actions} probability bins")]
    ActionSelection { actions: usize },

    /// A non-terminal state offered no legal actions, violating the
    /// [`Mdp`](crate::env::Mdp) contract.
    #[error("state has no legal actions")]
    NoLegalActions,

    /// A fixed-point loop exhausted its sweep budget before the residual
    /// dropped below tolerance.
    #[error("did not converge within {sweeps} sweeps (residual {residual})")]
    NotConverged { sweeps: u32, residual: f64 },

    /// Policy iteration exhausted its improvement budget with the policy
    /// still changing between sweeps.
    #[error("policy still changed at {changed} states after {iterations} improvement iterations")]
    PolicyUnstable { iterations: u32, changed: usize },

    /// Invalid decay parameterization
    #[error("`vi - vf` must have the same sign as `rate`")]
    InvalidDecay,
}
