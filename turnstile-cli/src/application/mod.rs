pub mod simulation;

pub use simulation::{SimulationOutcome, SimulationPlan, SimulationReport, run_simulation};
