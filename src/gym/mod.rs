mod chain;
mod maze;

pub use chain::{Chain, ChainAction};
pub use maze::{Maze, MazeAction};
