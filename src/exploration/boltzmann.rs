use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

use crate::{
    decay::Decay,
    error::SolverError,
    solver::{QTable, Tabular},
};

/// Boltzmann (softmax) exploration policy with a time-decaying inverse
/// temperature `beta`
///
/// Action probabilities are proportional to `exp(beta * Q[s, a])`. The
/// maximum Q value is subtracted before exponentiating so large `beta * Q`
/// magnitudes cannot overflow.
pub struct Boltzmann<D: Decay> {
    beta: D,
}

impl<D: Decay> Boltzmann<D> {
    pub fn new(decay: D) -> Self {
        Self { beta: decay }
    }

    /// Sample an action among `actions` at `state` given the current Q-table
    pub fn select<S, A, R>(
        &self,
        q: &QTable<S, A>,
        state: S,
        actions: &[A],
        t: f64,
        rng: &mut R,
    ) -> Result<A, SolverError>
    where
        S: Tabular,
        A: Tabular,
        R: Rng + ?Sized,
    {
        if actions.is_empty() {
            return Err(SolverError::NoLegalActions);
        }

        let beta = self.beta.evaluate(t);
        let values = actions
            .iter()
            .map(|&a| *q.get(&(state, a)).unwrap_or(&0.0))
            .collect::<Vec<_>>();
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let weights = values.iter().map(|v| (beta * (v - max)).exp());
        let dist = WeightedIndex::new(weights).map_err(|_| SolverError::ActionSelection {
            actions: actions.len(),
        })?;

        Ok(actions[dist.sample(rng)])
    }
}
