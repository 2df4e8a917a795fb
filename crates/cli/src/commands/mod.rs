//! CLI commands module.

mod labels;
mod probe;
mod segment;
mod vocab;

pub use labels::LabelsCommand;
pub use probe::ProbeCommand;
pub use segment::SegmentCommand;
pub use vocab::VocabCommand;

use anyhow::Context;
use corpusprep_config::Settings;
use serde::Serialize;

use crate::Cli;

pub(crate) fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    Settings::load(cli.config.as_deref()).context("loading settings")
}

/// Prints `value` as pretty JSON with `--json`, otherwise as `key: value`
/// lines.
pub(crate) fn output_result<T: Serialize>(cli: &Cli, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_value(value)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }
    match json {
        serde_json::Value::Object(fields) => {
            for (key, value) in fields {
                match value {
                    serde_json::Value::String(s) => println!("{key}: {s}"),
                    serde_json::Value::Null => println!("{key}: -"),
                    other => println!("{key}: {other}"),
                }
            }
        }
        other => println!("{other}"),
    }
    Ok(())
}
