use tabular_rl::{
    env::Mdp,
    gym::Maze,
    solver::{ValueIteration, ValueIterationConfig},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let maze = Maze::new();
    let mut solver = ValueIteration::new(ValueIterationConfig::default());
    let sweeps = solver.solve(&maze)?;
    println!("converged after {sweeps} sweeps");

    let mut state = maze.start_state();
    while !maze.is_terminal(state) {
        let action = solver.policy()[&state].expect("non-terminal states have an action");
        let (next, _) = maze.step(state, action);
        println!("{state:?} -> {next:?} by {action:?}");
        state = next;
    }

    Ok(())
}
