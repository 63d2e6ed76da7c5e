//! Plan store: create, load, and edit the `stream_plan` front-matter of a
//! document on disk.

use crate::document::Document;
use crate::error::{Result, StreamError};
use crate::plan::{SectionStatus, StreamPlan};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Replace an existing file instead of failing.
    pub overwrite: bool,
    /// Template name recorded in the plan.
    pub template: Option<String>,
}

/// Create a new document at `path` with every section pending and an empty body.
pub fn init<S: AsRef<str>>(path: &Path, sections: &[S], opts: &InitOptions) -> Result<Document> {
    if path.exists() && !opts.overwrite {
        return Err(StreamError::AlreadyExists(path.to_path_buf()));
    }
    let mut plan = StreamPlan::new(sections)?;
    plan.template = opts.template.clone();
    let doc = Document::new(path, plan);
    doc.save()?;
    tracing::info!(
        path = %path.display(),
        sections = doc.plan.sections.len(),
        "initialized document"
    );
    Ok(doc)
}

pub fn load(path: &Path) -> Result<Document> {
    Document::load(path)
}

/// Rewrite a single plan entry. Other entries and the body are untouched.
pub fn update(path: &Path, id: &str, status: SectionStatus, hash: Option<String>) -> Result<Document> {
    let mut doc = Document::load(path)?;
    doc.plan.set_status(id, status, hash)?;
    doc.save()?;
    tracing::info!(path = %path.display(), section = id, %status, "updated plan entry");
    Ok(doc)
}

/// Extend the plan with a new pending section.
pub fn add_section(path: &Path, id: &str, after: Option<&str>) -> Result<Document> {
    let mut doc = Document::load(path)?;
    doc.plan.add_section(id, after)?;
    doc.save()?;
    tracing::info!(path = %path.display(), section = id, "added section to plan");
    Ok(doc)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
