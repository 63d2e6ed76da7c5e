use crate::document::Document;
use crate::error::Result;
use crate::integrity::{self, SectionReport};
use serde::Serialize;
use std::path::Path;

/// What to do next with a partially written document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResumeOutcome {
    /// Write this section next. `position` is one-based in plan order.
    Next {
        id: String,
        position: usize,
        total: usize,
    },
    /// Damaged sections must be repaired before anything else is written.
    Blocked { issues: Vec<SectionReport> },
    AllComplete { total: usize },
}

/// Locate the next unit of work. Never skips past damage.
pub fn locate(doc: &Document) -> ResumeOutcome {
    let report = integrity::check(doc);
    let issues: Vec<SectionReport> = report.issues().into_iter().cloned().collect();
    if !issues.is_empty() {
        return ResumeOutcome::Blocked { issues };
    }
    let total = doc.plan.sections.len();
    if doc.plan.is_complete() {
        return ResumeOutcome::AllComplete { total };
    }
    match doc
        .plan
        .sections
        .iter()
        .enumerate()
        .find(|(_, s)| !s.is_completed())
    {
        Some((i, entry)) => ResumeOutcome::Next {
            id: entry.id.clone(),
            position: i + 1,
            total,
        },
        None => ResumeOutcome::AllComplete { total },
    }
}

pub fn resume(path: &Path) -> Result<ResumeOutcome> {
    let doc = Document::load(path)?;
    let outcome = locate(&doc);
    tracing::debug!(path = %path.display(), ?outcome, "resume");
    Ok(outcome)
}
