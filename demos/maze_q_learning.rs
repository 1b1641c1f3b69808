use rand::{rngs::StdRng, SeedableRng};
use tabular_rl::{
    env::Mdp,
    gym::Maze,
    solver::{TdConfig, TdMethod, TdSolver},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let maze = Maze::new();
    let mut rng = StdRng::seed_from_u64(7);
    let mut solver = TdSolver::new(TdConfig {
        method: TdMethod::QLearning,
        ..Default::default()
    });
    solver.solve(&maze, &mut rng)?;

    let mut state = maze.start_state();
    for _ in 0..50 {
        if maze.is_terminal(state) {
            break;
        }
        let action = solver.policy()[&state].expect("non-terminal states have an action");
        let (next, _) = maze.step(state, action);
        println!("{state:?} -> {next:?} by {action:?}");
        state = next;
    }

    Ok(())
}
