//! `contentpilot recover`: Recover a key/value tree from a raw reply.

use super::CommandResult;
use contentpilot_recovery::Recovered;
use std::io::Read;
use std::path::Path;

pub fn run(file: Option<&Path>) -> CommandResult {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    println!("{}", render(&raw)?);
    Ok(())
}

/// The recovered tree and strategy name as pretty JSON.
pub fn render(raw: &str) -> CommandResult<String> {
    let recovered: Recovered = contentpilot_recovery::recover_detailed(raw);
    Ok(serde_json::to_string_pretty(&recovered)?)
}
