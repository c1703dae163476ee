use crate::infrastructure::error::Result;
use clap::ValueEnum;
use turnstile_core::{TurnAction, TurnConfig};

/// Which JSON schema to print
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaTarget {
    /// Outbound turn actions
    Action,
    /// Configuration file
    Config,
}

/// Pretty-printed JSON schema for `target`
pub fn render_schema(target: SchemaTarget) -> Result<String> {
    let schema = match target {
        SchemaTarget::Action => schemars::schema_for!(TurnAction),
        SchemaTarget::Config => schemars::schema_for!(TurnConfig),
    };
    Ok(serde_json::to_string_pretty(&schema)?)
}
