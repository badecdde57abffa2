pub mod policy;
pub mod reports;
pub mod simulation;

pub use policy::DelveStrategy;
pub use simulation::{DelveRecord, SimulationConfig, pregen_party, run_delve};
