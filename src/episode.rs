use rand::{seq::SliceRandom, Rng};

use crate::{
    decay::Decay,
    env::Mdp,
    error::SolverError,
    exploration::EpsilonGreedy,
    solver::QTable,
};

/// Default cap on the number of steps in one sampled episode
pub const DEFAULT_STEP_CAP: u32 = 100;

/// How a behavior policy chooses actions while sampling an episode
#[derive(Clone, Copy)]
pub enum Behavior<'a, D: Decay> {
    /// Uniformly random over the legal actions
    Uniform,
    /// Epsilon-greedy with respect to the current Q-table
    EpsilonGreedy(&'a EpsilonGreedy<D>),
}

/// One sampled trajectory through an MDP, stored as parallel vectors
///
/// `states[i]` is the state the agent was in when it took `actions[i]` and
/// received `rewards[i]`. The terminal state itself is not recorded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Episode<S, A> {
    pub states: Vec<S>,
    pub actions: Vec<A>,
    pub rewards: Vec<f64>,
}

impl<S, A> Episode<S, A> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            actions: Vec::new(),
            rewards: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn push(&mut self, state: S, action: A, reward: f64) {
        self.states.push(state);
        self.actions.push(action);
        self.rewards.push(reward);
    }

    /// The discounted return at every step, computed by one backward scan
    /// (`G[i] = rewards[i] + gamma * G[i + 1]`)
    pub fn returns(&self, gamma: f64) -> Vec<f64> {
        let mut returns = vec![0.0; self.len()];
        let mut g = 0.0;
        for (i, &reward) in self.rewards.iter().enumerate().rev() {
            g = reward + gamma * g;
            returns[i] = g;
        }
        returns
    }
}

/// Sample one episode by running `behavior` against the MDP
///
/// Starts from `start` if given, otherwise from a state drawn uniformly from
/// the full state set. The rollout ends at a terminal state or after
/// `step_cap` steps. `t` is the time the behavior policy's decay is
/// evaluated at.
pub fn sample_episode<M, D, R>(
    mdp: &M,
    q: &QTable<M::State, M::Action>,
    behavior: Behavior<D>,
    start: Option<M::State>,
    step_cap: u32,
    t: f64,
    rng: &mut R,
) -> Result<Episode<M::State, M::Action>, SolverError>
where
    M: Mdp,
    D: Decay,
    R: Rng + ?Sized,
{
    let states = mdp.states();
    let mut state = match start {
        Some(state) => state,
        None => *states.choose(rng).ok_or(SolverError::NoLegalActions)?,
    };

    let mut episode = Episode::new();
    let mut steps = 0;
    while !mdp.is_terminal(state) && steps <= step_cap {
        let legal = mdp.actions(state).into_iter().map(|(_, a)| a).collect::<Vec<_>>();
        let action = match behavior {
            Behavior::Uniform => *legal.choose(rng).ok_or(SolverError::NoLegalActions)?,
            Behavior::EpsilonGreedy(policy) => policy.select(q, state, &legal, t, rng)?,
        };
        let (next, reward) = mdp.step(state, action);
        episode.push(state, action, reward);
        state = next;
        steps += 1;
    }

    Ok(episode)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{decay::Constant, gym::Chain};

    /// Two states cycling forever, never terminal
    struct Loop;

    impl Mdp for Loop {
        type State = u8;
        type Action = u8;

        fn gamma(&self) -> f64 {
            0.9
        }

        fn states(&self) -> Vec<u8> {
            vec![0, 1]
        }

        fn actions(&self, _state: u8) -> Vec<(f64, u8)> {
            vec![(1.0, 0)]
        }

        fn step(&self, state: u8, _action: u8) -> (u8, f64) {
            (1 - state, -1.0)
        }

        fn is_terminal(&self, _state: u8) -> bool {
            false
        }
    }

    #[test]
    fn returns_discount_backward() {
        let episode = Episode {
            states: vec![0, 1, 2],
            actions: vec![0, 0, 0],
            rewards: vec![1.0, 2.0, 4.0],
        };
        assert_eq!(episode.returns(0.5), vec![3.0, 4.0, 4.0]);
        assert_eq!(episode.returns(1.0), vec![7.0, 6.0, 4.0]);
    }

    #[test]
    fn uniform_rollout_terminates_on_chain() {
        let mdp = Chain::new(9);
        let q = QTable::new();
        let mut rng = StdRng::seed_from_u64(0);
        let episode = sample_episode(
            &mdp,
            &q,
            Behavior::<Constant>::Uniform,
            Some(1),
            DEFAULT_STEP_CAP,
            0.0,
            &mut rng,
        )
        .unwrap();
        assert!(!episode.is_empty());
        // walking and tramming both move strictly toward the end state
        assert!(episode.len() <= 8);
        assert_eq!(episode.states[0], 1);
    }

    #[test]
    fn step_cap_bounds_non_terminating_rollouts() {
        let mdp = Loop;
        let q = QTable::new();
        let mut rng = StdRng::seed_from_u64(1);
        let episode = sample_episode(&mdp, &q, Behavior::<Constant>::Uniform, None, 10, 0.0, &mut rng).unwrap();
        assert_eq!(episode.len(), 11);
    }
}
