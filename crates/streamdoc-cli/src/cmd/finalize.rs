use crate::output::print_json;
use anyhow::Context;
use std::path::{Path, PathBuf};
use streamdoc_core::config::Config;
use streamdoc_core::document::Document;
use streamdoc_core::finalize::{finalize, render_final, FinalizeOptions};

pub fn run(
    path: &Path,
    output: Option<PathBuf>,
    stdout: bool,
    config: &Config,
    json: bool,
) -> anyhow::Result<()> {
    if stdout {
        let doc = Document::load(path).with_context(|| format!("failed to load {}", path.display()))?;
        let text = render_final(&doc, &config.finalize)?;
        print!("{text}");
        return Ok(());
    }

    let opts = FinalizeOptions {
        output,
        config: config.finalize.clone(),
    };
    let outcome = finalize(path, &opts)?;

    if json {
        print_json(&outcome)?;
    } else {
        println!(
            "Finalized {} section(s) into {} ({} bytes)",
            outcome.sections,
            outcome.output.display(),
            outcome.bytes
        );
    }
    Ok(())
}
