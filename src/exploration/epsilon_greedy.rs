use rand::Rng;

use crate::{
    decay::{self, Decay},
    error::SolverError,
    solver::{greedy_action, QTable, Tabular},
};

/// Epsilon greedy exploration policy with a time-decaying epsilon threshold
///
/// With probability `1 - epsilon` the Q-maximizing action is returned;
/// otherwise the remaining actions share the explore region
/// `[0, epsilon - epsilon / n)` in equal-width bins assigned in enumeration
/// order.
pub struct EpsilonGreedy<D: Decay> {
    epsilon: D,
}

impl Default for EpsilonGreedy<decay::Constant> {
    fn default() -> Self {
        Self::new(decay::Constant::new(1e-2))
    }
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self { epsilon: decay }
    }

    /// Choose among `actions` at `state` given the current Q-table
    ///
    /// `t` is the time (usually the episode index) the epsilon decay is
    /// evaluated at. Fails with [`SolverError::ActionSelection`] if the draw
    /// lands in no bin, which signals a broken probability partition rather
    /// than anything recoverable.
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
        let best = greedy_action(q, state, actions).ok_or(SolverError::NoLegalActions)?;
        let epsilon = self.epsilon.evaluate(t);
        let bin_width = epsilon / actions.len() as f64;
        let draw = rng.gen::<f64>();

        if draw >= epsilon - bin_width {
            return Ok(best);
        }

        // the n - 1 non-best actions tile [0, epsilon - epsilon / n) exactly
        let mut bin = 0;
        for &action in actions {
            if action == best {
                continue;
            }
            let lo = bin as f64 * bin_width;
            let hi = (bin + 1) as f64 * bin_width;
            if draw >= lo && draw < hi {
                return Ok(action);
            }
            bin += 1;
        }

        Err(SolverError::ActionSelection {
            actions: actions.len(),
        })
    }
}
