pub mod config_file;
pub mod error;
pub mod observability;
pub mod schema;

pub use config_file::{ConfigOverrides, load_config};
pub use error::{CliError, Result};
pub use observability::LogConfig;
pub use schema::{SchemaTarget, render_schema};
