pub mod application;
pub mod infrastructure;

pub use application::{SimulationOutcome, SimulationPlan, SimulationReport, run_simulation};
pub use infrastructure::{
    CliError, ConfigOverrides, LogConfig, Result, SchemaTarget, load_config, render_schema,
};
