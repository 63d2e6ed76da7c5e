use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use streamdoc_core::resume::{resume, ResumeOutcome};

pub fn run(path: &Path, json: bool) -> anyhow::Result<()> {
    let outcome = resume(path).with_context(|| format!("failed to load {}", path.display()))?;

    if json {
        print_json(&outcome)?;
    } else {
        match &outcome {
            ResumeOutcome::Next { id, position, total } => {
                println!("{id}");
                eprintln!("section {position} of {total}");
            }
            ResumeOutcome::AllComplete { total } => {
                println!("All {total} sections complete: run 'streamdoc finalize {}'", path.display());
            }
            ResumeOutcome::Blocked { issues } => {
                println!("Cannot resume: {} damaged section(s)", issues.len());
                for s in issues {
                    let detail = s.detail.as_deref().unwrap_or("");
                    println!("  {}: {} {}", s.id, s.classification, detail);
                }
            }
        }
    }

    if let ResumeOutcome::Blocked { issues } = &outcome {
        let Some(first) = issues.first() else {
            anyhow::bail!("cannot resume {}", path.display());
        };
        anyhow::bail!(
            "section '{}' is {}: run 'streamdoc repair {} {}' then resume",
            first.id,
            first.classification,
            path.display(),
            first.id
        );
    }
    Ok(())
}
