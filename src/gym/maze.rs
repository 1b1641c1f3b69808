use crate::env::Mdp;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MazeAction {
    Right,
    Left,
    Up,
    Down,
}

/// A 5×5 grid world with wall cells and a single rewarding exit
///
/// States are `(x, y)` coordinates with `y` growing downward. Moves into
/// walls are never offered by [`actions`](Mdp::actions); if forced through
/// [`step`](Mdp::step) anyway, the transition carries a reward of
/// `-infinity`. Reaching the goal cell pays 100 and ends the episode.
pub struct Maze {
    size: i64,
    walls: Vec<(i64, i64)>,
    goal: (i64, i64),
}

impl Maze {
    pub fn new() -> Self {
        Self {
            size: 5,
            walls: vec![(3, 0), (3, 1), (0, 2), (1, 2), (2, 4), (3, 4), (4, 4)],
            goal: (4, 2),
        }
    }

    pub fn start_state(&self) -> (i64, i64) {
        (0, 0)
    }

    pub fn is_wall(&self, state: (i64, i64)) -> bool {
        self.walls.contains(&state)
    }

    fn in_bounds(&self, (x, y): (i64, i64)) -> bool {
        x >= 0 && x < self.size && y >= 0 && y < self.size
    }
}

impl Default for Maze {
    fn default() -> Self {
        Self::new()
    }
}

impl Mdp for Maze {
    type State = (i64, i64);
    type Action = MazeAction;

    fn gamma(&self) -> f64 {
        0.9
    }

    fn states(&self) -> Vec<(i64, i64)> {
        let mut states = Vec::with_capacity((self.size * self.size) as usize);
        for x in 0..self.size {
            for y in 0..self.size {
                states.push((x, y));
            }
        }
        states
    }

    fn actions(&self, (x, y): (i64, i64)) -> Vec<(f64, MazeAction)> {
        let mut actions = Vec::with_capacity(4);
        if x + 1 < self.size && !self.is_wall((x + 1, y)) {
            actions.push(MazeAction::Right);
        }
        if x - 1 >= 0 && !self.is_wall((x - 1, y)) {
            actions.push(MazeAction::Left);
        }
        if y - 1 >= 0 && !self.is_wall((x, y - 1)) {
            actions.push(MazeAction::Up);
        }
        if y + 1 < self.size && !self.is_wall((x, y + 1)) {
            actions.push(MazeAction::Down);
        }
        if actions.is_empty() {
            // no cell in this layout is fully walled in, but an empty list
            // must not produce an infinite probability
            return Vec::new();
        }
        let p = 1.0 / actions.len() as f64;
        actions.into_iter().map(|a| (p, a)).collect()
    }

    fn step(&self, (x, y): (i64, i64), action: MazeAction) -> ((i64, i64), f64) {
        let target = match action {
            MazeAction::Right => (x + 1, y),
            MazeAction::Left => (x - 1, y),
            MazeAction::Up => (x, y - 1),
            MazeAction::Down => (x, y + 1),
        };
        let next = if self.in_bounds(target) { target } else { (x, y) };
        let reward = if self.is_wall(next) {
            f64::NEG_INFINITY
        } else if next == self.goal {
            100.0
        } else {
            0.0
        };
        (next, reward)
    }

    fn is_terminal(&self, state: (i64, i64)) -> bool {
        state == self.goal
    }
}
