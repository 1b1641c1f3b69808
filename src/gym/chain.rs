use crate::env::Mdp;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ChainAction {
    Walk,
    Tram,
}

/// A one-dimensional chain of states `1..=n`
///
/// Walking advances one state at a cost of 1, the tram jumps to double the
/// current state at a cost of 2, and the run ends at state `n`. Undiscounted,
/// so the optimal policy minimizes total travel cost.
pub struct Chain {
    n: i64,
}

impl Chain {
    /// **Panics** if `n < 1`
    pub fn new(n: i64) -> Self {
        assert!(n >= 1, "the chain needs at least one state");
        Self { n }
    }

    pub fn start_state(&self) -> i64 {
        1
    }
}

impl Mdp for Chain {
    type State = i64;
    type Action = ChainAction;

    fn gamma(&self) -> f64 {
        1.0
    }

    fn states(&self) -> Vec<i64> {
        (1..=self.n).collect()
    }

    fn actions(&self, state: i64) -> Vec<(f64, ChainAction)> {
        let mut actions = Vec::with_capacity(2);
        if state + 1 <= self.n {
            actions.push((0.5, ChainAction::Walk));
        }
        if state * 2 <= self.n {
            actions.push((0.5, ChainAction::Tram));
        }
        actions
    }

    fn step(&self, state: i64, action: ChainAction) -> (i64, f64) {
        match action {
            ChainAction::Walk => (state + 1, -1.0),
            ChainAction::Tram => (state * 2, -2.0),
        }
    }

    fn is_terminal(&self, state: i64) -> bool {
        state == self.n
    }
}
