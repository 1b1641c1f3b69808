//! Cross-solver properties on the toy environments: agreement between the
//! dynamic-programming methods, model-free convergence toward the exact
//! optimum, and the determinism guarantees downstream code relies on.

use rand::{rngs::StdRng, SeedableRng};
use tabular_rl::{
    decay::Constant,
    env::Mdp,
    exploration::EpsilonGreedy,
    gym::{Chain, ChainAction, Maze},
    solver::{
        greedy_policy, MonteCarlo, MonteCarloConfig, PolicyIteration, PolicyIterationConfig,
        TdConfig, TdMethod, TdSolver, ValueIteration, ValueIterationConfig, ValueTable,
    },
};

/// Chain(9) states whose optimal action is unique. State 2 is a genuine tie:
/// walking and tramming both cost 5 in total from there.
const CHAIN_UNIQUE: [i64; 7] = [1, 3, 4, 5, 6, 7, 8];

fn chain_optimal() -> Vec<(i64, Option<ChainAction>)> {
    vec![
        (1, Some(ChainAction::Walk)),
        (2, Some(ChainAction::Walk)), // tie, resolved by first-max
        (3, Some(ChainAction::Walk)),
        (4, Some(ChainAction::Tram)),
        (5, Some(ChainAction::Walk)),
        (6, Some(ChainAction::Walk)),
        (7, Some(ChainAction::Walk)),
        (8, Some(ChainAction::Walk)),
        (9, None),
    ]
}

#[test]
fn value_iteration_is_independent_of_initial_values() {
    let mdp = Chain::new(9);

    let mut from_zero = ValueIteration::new(ValueIterationConfig::default());
    from_zero.solve(&mdp).unwrap();

    let junk = mdp
        .states()
        .into_iter()
        .map(|s| (s, (s as f64) * 13.7 - 50.0))
        .collect::<ValueTable<_>>();
    let mut from_junk = ValueIteration::with_initial_values(ValueIterationConfig::default(), junk);
    from_junk.solve(&mdp).unwrap();

    assert_eq!(from_zero.policy(), from_junk.policy());
    for (state, action) in chain_optimal() {
        assert_eq!(from_zero.policy()[&state], action, "state {state}");
    }
}

#[test]
fn forbidden_rewards_propagate_unclamped_through_value_iteration() {
    /// State 0 chooses between a forbidden self-loop and a walk to the
    /// terminal state 1; state 2 has only the forbidden self-loop.
    struct Cliff;

    impl Mdp for Cliff {
        type State = u8;
        type Action = char;

        fn gamma(&self) -> f64 {
            0.9
        }

        fn states(&self) -> Vec<u8> {
            vec![0, 1, 2]
        }

        fn actions(&self, state: u8) -> Vec<(f64, char)> {
            match state {
                0 => vec![(0.5, 'x'), (0.5, 'w')],
                2 => vec![(1.0, 'x')],
                _ => vec![],
            }
        }

        fn step(&self, state: u8, action: char) -> (u8, f64) {
            match action {
                'w' => (1, -1.0),
                _ => (state, f64::NEG_INFINITY),
            }
        }

        fn is_terminal(&self, state: u8) -> bool {
            state == 1
        }
    }

    let mdp = Cliff;
    let mut solver = ValueIteration::new(ValueIterationConfig::default());
    solver.solve(&mdp).unwrap();

    // the forbidden action's value stays -inf and loses to the finite walk
    assert_eq!(solver.policy()[&0], Some('w'));
    assert_eq!(solver.state_value()[&0], -1.0);
    // a state with only forbidden actions settles at -inf, never NaN
    assert_eq!(solver.state_value()[&2], f64::NEG_INFINITY);
    assert_eq!(solver.policy()[&2], Some('x'));
}

#[test]
fn maze_value_iteration_walks_to_the_goal() {
    let maze = Maze::new();
    let mut solver = ValueIteration::new(ValueIterationConfig::default());
    solver.solve(&maze).unwrap();

    let mut state = maze.start_state();
    let mut steps = 0;
    while !maze.is_terminal(state) {
        assert!(!maze.is_wall(state), "trajectory entered wall {state:?}");
        let action = solver.policy()[&state].expect("non-terminal state must have an action");
        let (next, _) = maze.step(state, action);
        state = next;
        steps += 1;
        assert!(steps <= 50, "trajectory did not reach the goal");
    }
    assert_eq!(state, (4, 2));
}

#[test]
fn policy_iteration_agrees_with_value_iteration() {
    let mdp = Chain::new(9);

    let mut vi = ValueIteration::new(ValueIterationConfig::default());
    vi.solve(&mdp).unwrap();

    let mut pi = PolicyIteration::new(PolicyIterationConfig::default());
    pi.solve(&mdp, &mut StdRng::seed_from_u64(21)).unwrap();

    for state in CHAIN_UNIQUE {
        assert_eq!(pi.policy()[&state], vi.policy()[&state], "state {state}");
    }
    assert_eq!(pi.policy()[&9], None);
}

#[test]
fn monte_carlo_approaches_the_value_iteration_optimum() {
    let mdp = Chain::new(9);

    let mut vi = ValueIteration::new(ValueIterationConfig::default());
    vi.solve(&mdp).unwrap();

    let mut mc = MonteCarlo::new(MonteCarloConfig {
        episodes: 20_000,
        exploration: Some(EpsilonGreedy::new(Constant::new(1e-2))),
        ..Default::default()
    });
    mc.solve(&mdp, &mut StdRng::seed_from_u64(8)).unwrap();

    for state in CHAIN_UNIQUE {
        assert_eq!(mc.policy()[&state], vi.policy()[&state], "state {state}");
    }
    // states past the last tram stop have forced trajectories, so their
    // action values are learned exactly up to the visit-count seed bias
    let q = mc.q_table();
    assert!((q[&(5, ChainAction::Walk)] - -4.0).abs() < 0.05);
    assert!((q[&(8, ChainAction::Walk)] - -1.0).abs() < 0.05);
}

#[test]
fn q_learning_with_uniform_restarts_covers_every_state() {
    // every episode starts from a uniformly random state, not from a fixed
    // start state; that restart distribution is intentional and is what
    // lets states far from state 1 converge too
    let mdp = Chain::new(9);

    let mut vi = ValueIteration::new(ValueIterationConfig::default());
    vi.solve(&mdp).unwrap();

    let mut td = TdSolver::new(TdConfig {
        method: TdMethod::QLearning,
        episodes: 5000,
        ..Default::default()
    });
    td.solve(&mdp, &mut StdRng::seed_from_u64(17)).unwrap();

    for state in CHAIN_UNIQUE {
        assert_eq!(td.policy()[&state], vi.policy()[&state], "state {state}");
    }
}

#[test]
fn q_learning_solves_the_maze() {
    let maze = Maze::new();
    let mut td = TdSolver::new(TdConfig {
        method: TdMethod::QLearning,
        ..Default::default()
    });
    td.solve(&maze, &mut StdRng::seed_from_u64(7)).unwrap();

    let mut state = maze.start_state();
    let mut steps = 0;
    while !maze.is_terminal(state) {
        assert!(!maze.is_wall(state), "trajectory entered wall {state:?}");
        let action = td.policy()[&state].expect("non-terminal state must have an action");
        let (next, _) = maze.step(state, action);
        state = next;
        steps += 1;
        assert!(steps <= 50, "trajectory did not reach the goal");
    }
}

#[test]
fn sarsa_lambda_zero_reduces_to_sarsa() {
    let mdp = Chain::new(9);

    let mut sarsa = TdSolver::new(TdConfig {
        method: TdMethod::Sarsa,
        episodes: 200,
        ..Default::default()
    });
    sarsa.solve(&mdp, &mut StdRng::seed_from_u64(99)).unwrap();

    let mut sarsa_lambda = TdSolver::new(TdConfig {
        method: TdMethod::SarsaLambda { lambda: 0.0 },
        episodes: 200,
        ..Default::default()
    });
    sarsa_lambda.solve(&mdp, &mut StdRng::seed_from_u64(99)).unwrap();

    // identical draws, identical updates: the Q tables match bit for bit
    assert_eq!(sarsa.q_table(), sarsa_lambda.q_table());
}

#[test]
fn sarsa_lambda_spreads_credit_along_the_trajectory() {
    let mdp = Chain::new(9);
    let mut td = TdSolver::new(TdConfig {
        method: TdMethod::SarsaLambda { lambda: 0.5 },
        episodes: 2000,
        ..Default::default()
    });
    td.solve(&mdp, &mut StdRng::seed_from_u64(31)).unwrap();

    assert_eq!(td.policy()[&4], Some(ChainAction::Tram));
    assert_eq!(td.policy()[&8], Some(ChainAction::Walk));
}

#[test]
fn policy_extraction_is_idempotent() {
    let mdp = Chain::new(9);
    let mut td = TdSolver::new(TdConfig {
        episodes: 1000,
        ..Default::default()
    });
    td.solve(&mdp, &mut StdRng::seed_from_u64(4)).unwrap();

    let first = greedy_policy(&mdp, td.q_table());
    let second = greedy_policy(&mdp, td.q_table());
    assert_eq!(first, second);
    assert_eq!(&first, td.policy());
}

#[test]
fn resolving_from_a_converged_table_changes_nothing() {
    let mdp = Chain::new(9);
    let mut solver = ValueIteration::new(ValueIterationConfig::default());
    solver.solve(&mdp).unwrap();
    let policy = solver.policy().clone();
    let values = solver.state_value().clone();

    // a second solve warm-started from the fixed point converges immediately
    let mut again = ValueIteration::with_initial_values(ValueIterationConfig::default(), values);
    let sweeps = again.solve(&mdp).unwrap();
    assert_eq!(sweeps, 1);
    assert_eq!(again.policy(), &policy);
}

#[test]
fn single_action_states_are_improvement_fixed_points() {
    // states 5..=8 offer only the walk; no solver may map them elsewhere
    let mdp = Chain::new(9);

    let mut vi = ValueIteration::new(ValueIterationConfig::default());
    vi.solve(&mdp).unwrap();

    let mut pi = PolicyIteration::new(PolicyIterationConfig::default());
    pi.solve(&mdp, &mut StdRng::seed_from_u64(2)).unwrap();

    let mut mc = MonteCarlo::new(MonteCarloConfig::default());
    mc.solve(&mdp, &mut StdRng::seed_from_u64(2)).unwrap();

    for state in 5..=8 {
        assert_eq!(vi.policy()[&state], Some(ChainAction::Walk));
        assert_eq!(pi.policy()[&state], Some(ChainAction::Walk));
        assert_eq!(mc.policy()[&state], Some(ChainAction::Walk));
    }
}
