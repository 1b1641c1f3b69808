//! Tabular solvers for finite Markov decision processes: exact dynamic
//! programming (policy iteration, value iteration) and model-free learning
//! (Monte Carlo control, SARSA, Q-learning, SARSA(λ), TD(0) prediction).
//!
//! Environments implement the [`env::Mdp`] trait; every solver consumes one
//! through that contract alone and produces a policy and/or value table.
//! All randomness flows through a caller-supplied [`rand::Rng`], so a seeded
//! generator makes a whole run reproducible.

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// The MDP contract environments implement
pub mod env;

/// Sampled trajectories
pub mod episode;

/// Error types
pub mod error;

/// Exploration policies
pub mod exploration;

/// Toy environments
pub mod gym;

/// Implemented solver algorithms
pub mod solver;

mod util;
