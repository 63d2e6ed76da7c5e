use crate::output::print_json;
use anyhow::Context;
use std::io::Read;
use std::path::{Path, PathBuf};
use streamdoc_core::digest;
use streamdoc_core::writer::write_section;

/// Where section content comes from.
pub enum ContentSource {
    Inline(String),
    File(PathBuf),
    Stdin,
}

impl ContentSource {
    pub fn from_args(content: Option<String>, file: Option<PathBuf>, stdin: bool) -> anyhow::Result<Self> {
        match (content, file, stdin) {
            (Some(c), None, false) => Ok(Self::Inline(c)),
            (None, Some(f), false) => Ok(Self::File(f)),
            (None, None, true) => Ok(Self::Stdin),
            (None, None, false) => anyhow::bail!("no content: pass it inline, with --file, or with --stdin"),
            _ => anyhow::bail!("pass content only one way: inline, --file, or --stdin"),
        }
    }

    fn read(self) -> anyhow::Result<String> {
        match self {
            Self::Inline(c) => Ok(c),
            Self::File(f) => std::fs::read_to_string(&f)
                .with_context(|| format!("failed to read {}", f.display())),
            Self::Stdin => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read stdin")?;
                Ok(buf)
            }
        }
    }
}

pub fn run(path: &Path, id: &str, source: ContentSource, json: bool) -> anyhow::Result<()> {
    let content = source.read()?;
    let outcome = write_section(path, id, &content)
        .with_context(|| format!("failed to write section '{id}'"))?;

    if json {
        print_json(&outcome)?;
    } else {
        println!(
            "Wrote {id} ({} bytes, hash {}) [{}/{}]",
            outcome.bytes,
            digest::short(&outcome.hash),
            outcome.completed,
            outcome.total
        );
        match &outcome.next {
            Some(next) => println!("Next: {next}"),
            None => println!("All sections complete: run 'streamdoc finalize {}'", path.display()),
        }
    }
    Ok(())
}
