use crate::config::FinalizeConfig;
use crate::document::Document;
use crate::error::{Result, StreamError};
use crate::integrity;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct FinalizeOptions {
    /// Write here instead of overwriting the source document.
    pub output: Option<PathBuf>,
    pub config: FinalizeConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalizeOutcome {
    pub source: PathBuf,
    pub output: PathBuf,
    pub sections: usize,
    pub bytes: usize,
}

/// Produce the clean deliverable text for `doc`, or refuse if any section is
/// pending or damaged.
pub fn render_final(doc: &Document, cfg: &FinalizeConfig) -> Result<String> {
    let report = integrity::check(doc);
    let blocked = report.not_valid();
    if !blocked.is_empty() {
        return Err(StreamError::FinalizeBlocked(blocked));
    }

    let parts: Vec<String> = integrity::scan_blocks(&doc.body)
        .into_iter()
        .map(|b| b.interior)
        .collect();

    let mut out = String::new();
    if cfg.keep_front_matter && !doc.front_matter.is_empty() {
        out.push_str("---\n");
        out.push_str(&serde_yaml::to_string(&doc.front_matter)?);
        out.push_str("---\n");
    }
    out.push_str(&parts.join(&cfg.separator));
    if cfg.trailing_newline && !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Strip plan metadata and markers and write the clean document.
///
/// Fails closed: on any precondition failure nothing is written.
pub fn finalize(path: &Path, opts: &FinalizeOptions) -> Result<FinalizeOutcome> {
    let doc = Document::load(path)?;
    let text = render_final(&doc, &opts.config)?;
    let output = opts.output.clone().unwrap_or_else(|| path.to_path_buf());
    crate::io::atomic_write(&output, text.as_bytes())?;
    tracing::info!(
        source = %path.display(),
        output = %output.display(),
        sections = doc.plan.sections.len(),
        "finalized document"
    );
    Ok(FinalizeOutcome {
        source: path.to_path_buf(),
        output,
        sections: doc.plan.sections.len(),
        bytes: text.len(),
    })
}
