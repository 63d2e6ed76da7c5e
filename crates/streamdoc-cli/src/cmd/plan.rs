use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use streamdoc_core::digest;
use streamdoc_core::store;

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// Show the section plan recorded in a document
    Show { path: PathBuf },

    /// Add a pending section to the plan
    Add {
        path: PathBuf,
        /// New section id
        id: String,
        /// Insert after this section (default: append)
        #[arg(long)]
        after: Option<String>,
    },
}

pub fn run(subcmd: PlanSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        PlanSubcommand::Show { path } => show(&path, json),
        PlanSubcommand::Add { path, id, after } => add(&path, &id, after.as_deref(), json),
    }
}

fn show(path: &Path, json: bool) -> anyhow::Result<()> {
    let doc = store::load(path).with_context(|| format!("failed to load {}", path.display()))?;
    if json {
        print_json(&doc.plan)?;
        return Ok(());
    }
    let rows: Vec<Vec<String>> = doc
        .plan
        .sections
        .iter()
        .enumerate()
        .map(|(i, s)| {
            vec![
                (i + 1).to_string(),
                s.id.clone(),
                s.status.to_string(),
                s.hash.as_deref().map(digest::short).unwrap_or("-").to_string(),
            ]
        })
        .collect();
    print_table(&["#", "SECTION", "STATUS", "HASH"], &rows);
    println!();
    if let Some(t) = &doc.plan.template {
        println!("Template:      {t}");
    }
    println!("Created:       {}", doc.plan.created.to_rfc3339());
    println!("Last modified: {}", doc.plan.last_modified.to_rfc3339());
    Ok(())
}

fn add(path: &Path, id: &str, after: Option<&str>, json: bool) -> anyhow::Result<()> {
    let doc = store::add_section(path, id, after)
        .with_context(|| format!("failed to add section '{id}'"))?;
    let position = doc.plan.position(id).map(|p| p + 1).unwrap_or(0);
    if json {
        print_json(&serde_json::json!({
            "id": id,
            "position": position,
            "total": doc.plan.sections.len(),
        }))?;
    } else {
        println!(
            "Added {id} at position {position} of {}",
            doc.plan.sections.len()
        );
    }
    Ok(())
}
