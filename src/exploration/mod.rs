mod boltzmann;
mod epsilon_greedy;

pub use boltzmann::Boltzmann;
pub use epsilon_greedy::EpsilonGreedy;
