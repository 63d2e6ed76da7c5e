use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use streamdoc_core::config::Config;
use streamdoc_core::repair::{repair, RepairOptions, RepairStrategy};

pub fn run(path: &Path, id: &str, strategy: &str, config: &Config, json: bool) -> anyhow::Result<()> {
    let strategy: RepairStrategy = strategy
        .parse()
        .with_context(|| format!("invalid --strategy: {strategy}"))?;
    let opts = RepairOptions {
        strategy,
        backup_suffix: config.backup.suffix.clone(),
        backup_stamp: config.backup_stamp(),
    };
    let outcome = repair(path, id, &opts)
        .with_context(|| format!("failed to repair section '{id}'"))?;

    if json {
        print_json(&outcome)?;
    } else {
        println!(
            "Repaired {id} ({} -> {}) with strategy '{strategy}'",
            outcome.was,
            if outcome.hash.is_some() { "completed" } else { "pending" }
        );
        if outcome.removed_lines > 0 {
            println!("Removed {} line(s)", outcome.removed_lines);
        }
        if let Some(b) = &outcome.backup {
            println!("Backup: {}", b.display());
        }
        if outcome.hash.is_none() {
            println!("Next: streamdoc write {} {id} <content>", path.display());
        }
    }
    Ok(())
}
