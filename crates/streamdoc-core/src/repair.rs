use crate::digest;
use crate::document::Document;
use crate::error::{Result, StreamError};
use crate::integrity::{self, BlockKind, Classification};
use crate::marker;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// RepairStrategy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStrategy {
    /// Delete the damaged block and reset the section to pending.
    #[default]
    Remove,
    /// Copy the file aside, then remove.
    Backup,
    /// Best-effort: keep the surviving content and re-stamp its markers.
    Complete,
}

impl RepairStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            RepairStrategy::Remove => "remove",
            RepairStrategy::Backup => "backup",
            RepairStrategy::Complete => "complete",
        }
    }
}

impl fmt::Display for RepairStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RepairStrategy {
    type Err = StreamError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "remove" => Ok(RepairStrategy::Remove),
            "backup" => Ok(RepairStrategy::Backup),
            "complete" => Ok(RepairStrategy::Complete),
            _ => Err(StreamError::InvalidStrategy(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Options / outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RepairOptions {
    pub strategy: RepairStrategy,
    pub backup_suffix: String,
    /// Timestamp inserted into the backup file name, if any.
    pub backup_stamp: Option<String>,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            strategy: RepairStrategy::Remove,
            backup_suffix: ".bak".to_string(),
            backup_stamp: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RepairOutcome {
    pub id: String,
    pub strategy: RepairStrategy,
    /// Classification before the repair.
    pub was: Classification,
    /// Body lines removed.
    pub removed_lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    /// Hash recorded by the `complete` strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

// ---------------------------------------------------------------------------
// repair
// ---------------------------------------------------------------------------

/// Recover a damaged section so it can be written again.
pub fn repair(path: &Path, id: &str, opts: &RepairOptions) -> Result<RepairOutcome> {
    let mut doc = Document::load(path)?;
    let was = diagnose(&doc, id)?;

    let backup = if opts.strategy == RepairStrategy::Backup {
        let dest = crate::io::write_backup(path, &opts.backup_suffix, opts.backup_stamp.as_deref())?;
        tracing::info!(backup = %dest.display(), "wrote backup before repair");
        Some(dest)
    } else {
        None
    };

    let mut outcome = match opts.strategy {
        RepairStrategy::Remove | RepairStrategy::Backup => remove_section(&mut doc, id, was)?,
        RepairStrategy::Complete => complete_section(&mut doc, id, was)?,
    };
    outcome.strategy = opts.strategy;
    outcome.backup = backup;

    doc.save()?;
    tracing::info!(
        path = %path.display(),
        section = id,
        strategy = %opts.strategy,
        %was,
        "repaired section"
    );
    Ok(outcome)
}

/// Classify `id` and decide whether there is anything to repair.
fn diagnose(doc: &Document, id: &str) -> Result<Classification> {
    let report = integrity::check(doc);
    let Some(section) = report.get(id) else {
        return Err(StreamError::UnknownSection(id.to_string()));
    };
    match section.classification {
        Classification::Valid => Err(StreamError::NothingToRepair(id.to_string())),
        Classification::Pending => Err(StreamError::SectionNotFound(id.to_string())),
        c => Ok(c),
    }
}

/// Delete every block carrying `id` and reset its plan entry.
pub fn remove_section(doc: &mut Document, id: &str, was: Classification) -> Result<RepairOutcome> {
    let ranges: Vec<(usize, usize)> = integrity::scan_blocks(&doc.body)
        .into_iter()
        .filter(|b| b.id == id)
        .map(|b| (b.start, b.end))
        .collect();
    let removed_lines = ranges.iter().map(|(s, e)| e - s).sum();
    doc.remove_line_ranges(&ranges);
    if doc.plan.contains(id) {
        doc.plan.mark_pending(id)?;
    }
    Ok(RepairOutcome {
        id: id.to_string(),
        strategy: RepairStrategy::Remove,
        was,
        removed_lines,
        backup: None,
        hash: None,
    })
}

/// Accept the content currently between (or after) the markers and re-stamp it.
pub fn complete_section(doc: &mut Document, id: &str, was: Classification) -> Result<RepairOutcome> {
    let unsupported = |reason: &str| StreamError::RepairUnsupported {
        id: id.to_string(),
        strategy: RepairStrategy::Complete.to_string(),
        reason: reason.to_string(),
    };

    if !doc.plan.contains(id) {
        return Err(unsupported("section is not in the plan; use --strategy remove"));
    }
    match was {
        Classification::OrphanedStart | Classification::HashMismatch | Classification::PlanDrift => {}
        Classification::Empty => return Err(unsupported("section has no content to keep")),
        other => return Err(unsupported(&format!("cannot complete a {other} section"))),
    }

    let blocks: Vec<_> = integrity::scan_blocks(&doc.body)
        .into_iter()
        .filter(|b| b.id == id)
        .collect();
    let [block] = blocks.as_slice() else {
        if blocks.is_empty() && was == Classification::PlanDrift {
            // Completed in the plan with nothing in the body.
            doc.plan.mark_pending(id)?;
            tracing::warn!(section = id, "no content to complete; reset to pending");
            return Ok(RepairOutcome {
                id: id.to_string(),
                strategy: RepairStrategy::Complete,
                was,
                removed_lines: 0,
                backup: None,
                hash: None,
            });
        }
        return Err(unsupported("expected exactly one marker block"));
    };
    if block.kind == BlockKind::OrphanedEnd {
        return Err(unsupported("only an END marker survives"));
    }

    let content = digest::normalize(&block.interior);
    if content.trim().is_empty() {
        return Err(unsupported("surviving content is empty"));
    }
    tracing::warn!(
        section = id,
        "completing section from surviving content; review it before finalizing"
    );
    let hash = digest::digest(&content);

    let lines: Vec<&str> = doc.body.lines().collect();
    let mut rebuilt: Vec<String> = Vec::with_capacity(lines.len() + 1);
    rebuilt.extend(lines[..block.start].iter().map(|l| l.to_string()));
    rebuilt.push(marker::start_line(id, &hash));
    rebuilt.extend(content.lines().map(str::to_string));
    rebuilt.push(marker::end_line(id, &hash));
    let rest = &lines[block.end..];
    if !rest.is_empty() && !rest[0].trim().is_empty() {
        rebuilt.push(String::new());
    }
    rebuilt.extend(rest.iter().map(|l| l.to_string()));
    doc.set_body_lines(&rebuilt);

    doc.plan.mark_completed(id, hash.clone())?;
    Ok(RepairOutcome {
        id: id.to_string(),
        strategy: RepairStrategy::Complete,
        was,
        removed_lines: 0,
        backup: None,
        hash: Some(hash),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{init, InitOptions};
    use crate::writer::write_section;
    use tempfile::TempDir;

    fn setup(ids: &[&str]) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.md");
        init(&path, ids, &InitOptions::default()).unwrap();
        (dir, path)
    }

    fn truncate_into(path: &Path, id: &str, partial: &str) {
        let mut text = std::fs::read_to_string(path).unwrap();
        if !text.ends_with("\n\n") && !text.ends_with("---\n") {
            text.push('\n');
        }
        text.push_str(&marker::start_line(id, &digest::digest("whatever")));
        text.push('\n');
        text.push_str(partial);
        std::fs::write(path, text).unwrap();
    }

    fn opts(strategy: RepairStrategy) -> RepairOptions {
        RepairOptions {
            strategy,
            ..RepairOptions::default()
        }
    }

    #[test]
    fn remove_restores_writability() {
        let (_dir, path) = setup(&["intro", "body"]);
        write_section(&path, "intro", "Hello.").unwrap();
        truncate_into(&path, "body", "Wor");

        let out = repair(&path, "body", &opts(RepairStrategy::Remove)).unwrap();
        assert_eq!(out.was, Classification::OrphanedStart);
        assert_eq!(out.removed_lines, 2);

        let doc = Document::load(&path).unwrap();
        let entry = doc.plan.entry("body").unwrap();
        assert!(!entry.is_completed());
        assert!(entry.hash.is_none());
        assert!(!doc.has_marker("body"));
        let report = integrity::check(&doc);
        assert_eq!(report.classification("intro"), Some(Classification::Valid));
        assert_eq!(report.classification("body"), Some(Classification::Pending));

        write_section(&path, "body", "World.").unwrap();
        let doc = Document::load(&path).unwrap();
        assert_eq!(
            integrity::check(&doc).classification("body"),
            Some(Classification::Valid)
        );
    }

    #[test]
    fn remove_orphan_keeps_following_sections() {
        let (_dir, path) = setup(&["a", "b"]);
        // orphaned "a" followed by a complete "b"
        let mut doc = Document::load(&path).unwrap();
        doc.body = format!("{}\npartial\n\n", marker::start_line("a", "00"));
        let h = digest::digest("B");
        doc.append_block("b", &h, "B");
        doc.plan.mark_completed("b", h).unwrap();
        doc.save().unwrap();

        repair(&path, "a", &opts(RepairStrategy::Remove)).unwrap();
        let doc = Document::load(&path).unwrap();
        assert!(doc.body.starts_with("<!-- SECTION_START: b"));
        assert_eq!(
            integrity::check(&doc).classification("b"),
            Some(Classification::Valid)
        );
    }

    #[test]
    fn remove_clears_every_duplicate_block() {
        let (_dir, path) = setup(&["a"]);
        write_section(&path, "a", "one").unwrap();
        let mut doc = Document::load(&path).unwrap();
        let h = digest::digest("two");
        doc.append_block("a", &h, "two");
        doc.save().unwrap();

        let out = repair(&path, "a", &opts(RepairStrategy::Remove)).unwrap();
        assert_eq!(out.was, Classification::Duplicate);
        let doc = Document::load(&path).unwrap();
        assert!(doc.body.is_empty());
    }

    #[test]
    fn backup_copies_original_first() {
        let (_dir, path) = setup(&["a"]);
        truncate_into(&path, "a", "half");
        let original = std::fs::read_to_string(&path).unwrap();

        let out = repair(&path, "a", &opts(RepairStrategy::Backup)).unwrap();
        let backup = out.backup.unwrap();
        assert_eq!(backup, path.with_file_name("doc.md.bak"));
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), original);
        assert!(!Document::load(&path).unwrap().has_marker("a"));
    }

    #[test]
    fn complete_closes_orphan_with_surviving_content() {
        let (_dir, path) = setup(&["a", "b"]);
        truncate_into(&path, "a", "partial text\n");

        let out = repair(&path, "a", &opts(RepairStrategy::Complete)).unwrap();
        assert_eq!(out.hash.as_deref(), Some(digest::digest("partial text").as_str()));

        let doc = Document::load(&path).unwrap();
        let report = integrity::check(&doc);
        assert_eq!(report.classification("a"), Some(Classification::Valid));
        assert_eq!(report.classification("b"), Some(Classification::Pending));
    }

    #[test]
    fn complete_restamps_edited_content() {
        let (_dir, path) = setup(&["a"]);
        write_section(&path, "a", "Hello.").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let body_start = text.rfind("Hello.").unwrap();
        let mut edited = text.clone();
        edited.replace_range(body_start..body_start + 6, "Howdy.");
        std::fs::write(&path, edited).unwrap();

        repair(&path, "a", &opts(RepairStrategy::Complete)).unwrap();
        let doc = Document::load(&path).unwrap();
        assert!(integrity::check(&doc).is_clean());
        assert_eq!(
            doc.plan.entry("a").unwrap().hash.as_deref(),
            Some(digest::digest("Howdy.").as_str())
        );
    }

    #[test]
    fn complete_refuses_duplicates() {
        let (_dir, path) = setup(&["a"]);
        write_section(&path, "a", "one").unwrap();
        let mut doc = Document::load(&path).unwrap();
        doc.append_block("a", &digest::digest("two"), "two");
        doc.save().unwrap();
        assert!(matches!(
            repair(&path, "a", &opts(RepairStrategy::Complete)),
            Err(StreamError::RepairUnsupported { .. })
        ));
    }

    #[test]
    fn nothing_to_repair_and_not_found() {
        let (_dir, path) = setup(&["a", "b"]);
        write_section(&path, "a", "A").unwrap();
        let before = std::fs::read_to_string(&path).unwrap();
        assert!(matches!(
            repair(&path, "a", &opts(RepairStrategy::Remove)),
            Err(StreamError::NothingToRepair(_))
        ));
        assert!(matches!(
            repair(&path, "b", &opts(RepairStrategy::Remove)),
            Err(StreamError::SectionNotFound(_))
        ));
        assert!(matches!(
            repair(&path, "zz", &opts(RepairStrategy::Remove)),
            Err(StreamError::UnknownSection(_))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn completed_without_markers_resets_plan() {
        let (_dir, path) = setup(&["a"]);
        crate::store::update(
            &path,
            "a",
            crate::plan::SectionStatus::Completed,
            Some("abc".to_string()),
        )
        .unwrap();
        let out = repair(&path, "a", &opts(RepairStrategy::Remove)).unwrap();
        assert_eq!(out.was, Classification::PlanDrift);
        assert_eq!(out.removed_lines, 0);
        assert!(!Document::load(&path).unwrap().plan.entry("a").unwrap().is_completed());
    }

    #[test]
    fn unplanned_markers_can_be_removed() {
        let (_dir, path) = setup(&["a"]);
        let mut doc = Document::load(&path).unwrap();
        doc.append_block("stray", &digest::digest("x"), "x");
        doc.save().unwrap();
        let out = repair(&path, "stray", &opts(RepairStrategy::Remove)).unwrap();
        assert_eq!(out.was, Classification::Unplanned);
        assert!(Document::load(&path).unwrap().body.is_empty());
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!("backup".parse::<RepairStrategy>().unwrap(), RepairStrategy::Backup);
        assert!("explode".parse::<RepairStrategy>().is_err());
    }
}
