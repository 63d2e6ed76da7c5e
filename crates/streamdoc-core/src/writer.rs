use crate::digest;
use crate::document::Document;
use crate::error::{Result, StreamError};
use crate::integrity::{self, Classification};
use crate::marker;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome {
    pub id: String,
    pub hash: String,
    pub bytes: usize,
    pub completed: usize,
    pub total: usize,
    /// Next pending section in plan order, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Append one section to the document at `path` and record it as completed.
///
/// The block and the plan update are written together in one atomic rewrite.
pub fn write_section(path: &Path, id: &str, content: &str) -> Result<WriteOutcome> {
    let mut doc = Document::load(path)?;
    let outcome = append_section(&mut doc, id, content)?;
    doc.save()?;
    tracing::info!(
        path = %path.display(),
        section = id,
        hash = digest::short(&outcome.hash),
        "wrote section"
    );
    Ok(outcome)
}

/// In-memory half of [`write_section`].
pub fn append_section(doc: &mut Document, id: &str, content: &str) -> Result<WriteOutcome> {
    let entry = doc
        .plan
        .entry(id)
        .ok_or_else(|| StreamError::UnknownSection(id.to_string()))?;
    if entry.is_completed() {
        return Err(StreamError::SectionAlreadyCompleted(id.to_string()));
    }

    let content = digest::normalize(content);
    if content.trim().is_empty() {
        return Err(StreamError::EmptyContent(id.to_string()));
    }
    if marker::contains_marker(&content) {
        return Err(StreamError::MarkerInContent(id.to_string()));
    }

    // Appending after a block that never closed would fold the new section
    // into it; any damage for this id would produce a duplicate.
    let report = integrity::check(doc);
    for section in report.issues() {
        if section.id == id || section.classification == Classification::OrphanedStart {
            return Err(StreamError::CorruptDocument {
                id: section.id.clone(),
                classification: section.classification,
            });
        }
    }

    let hash = digest::digest(&content);
    doc.append_block(id, &hash, &content);
    doc.plan.mark_completed(id, hash.clone())?;

    Ok(WriteOutcome {
        id: id.to_string(),
        hash,
        bytes: content.len(),
        completed: doc.plan.completed_count(),
        total: doc.plan.sections.len(),
        next: doc.plan.next_pending().map(|s| s.id.clone()),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{init, InitOptions};
    use tempfile::TempDir;

    fn setup(ids: &[&str]) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.md");
        init(&path, ids, &InitOptions::default()).unwrap();
        (dir, path)
    }

    #[test]
    fn written_section_round_trips_as_valid() {
        let (_dir, path) = setup(&["intro", "body"]);
        let out = write_section(&path, "intro", "Hello.").unwrap();
        assert_eq!(out.hash, digest::digest("Hello."));
        assert_eq!(out.next.as_deref(), Some("body"));

        let doc = Document::load(&path).unwrap();
        let markers = doc.markers();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].marker.hash, out.hash);
        assert_eq!(markers[1].marker.hash, out.hash);
        assert_eq!(
            integrity::check(&doc).classification("intro"),
            Some(Classification::Valid)
        );
    }

    #[test]
    fn trailing_newlines_do_not_change_hash() {
        let (_dir, path) = setup(&["a"]);
        let out = write_section(&path, "a", "Line one\r\nLine two\n\n").unwrap();
        assert_eq!(out.hash, digest::digest("Line one\nLine two"));
        let doc = Document::load(&path).unwrap();
        assert!(integrity::check(&doc).is_clean());
    }

    #[test]
    fn embedded_carriage_returns_still_check_valid() {
        let (_dir, path) = setup(&["a", "b"]);
        let out = write_section(&path, "a", "x\r\r\ny").unwrap();
        assert_eq!(out.hash, digest::digest("x\ny"));
        write_section(&path, "b", "p\rq\r\n").unwrap();

        let doc = Document::load(&path).unwrap();
        let report = integrity::check(&doc);
        assert_eq!(report.classification("a"), Some(Classification::Valid));
        assert_eq!(report.classification("b"), Some(Classification::Valid));
    }

    #[test]
    fn rejects_unknown_completed_and_empty() {
        let (_dir, path) = setup(&["a"]);
        assert!(matches!(
            write_section(&path, "zz", "x"),
            Err(StreamError::UnknownSection(_))
        ));
        assert!(matches!(
            write_section(&path, "a", "  \n\n"),
            Err(StreamError::EmptyContent(_))
        ));
        write_section(&path, "a", "x").unwrap();
        assert!(matches!(
            write_section(&path, "a", "y"),
            Err(StreamError::SectionAlreadyCompleted(_))
        ));
    }

    #[test]
    fn rejects_marker_lines_in_content() {
        let (_dir, path) = setup(&["a"]);
        let content = format!("text\n{}\nmore", marker::end_line("a", "00"));
        assert!(matches!(
            write_section(&path, "a", &content),
            Err(StreamError::MarkerInContent(_))
        ));
    }

    #[test]
    fn refuses_to_append_after_orphaned_start() {
        let (_dir, path) = setup(&["a", "b"]);
        write_section(&path, "a", "A").unwrap();
        let mut text = std::fs::read_to_string(&path).unwrap();
        text.push_str(&marker::start_line("b", "1234"));
        text.push_str("\npartial");
        std::fs::write(&path, &text).unwrap();

        let err = write_section(&path, "b", "B").unwrap_err();
        assert!(matches!(
            err,
            StreamError::CorruptDocument { ref id, classification: Classification::OrphanedStart } if id == "b"
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn file_only_grows_across_writes() {
        let (_dir, path) = setup(&["a", "b", "c"]);
        let mut last_body = String::new();
        for (id, content) in [("a", "A"), ("b", "B"), ("c", "C")] {
            write_section(&path, id, content).unwrap();
            let body = Document::load(&path).unwrap().body;
            assert!(body.starts_with(&last_body));
            last_body = body;
        }
    }
}
