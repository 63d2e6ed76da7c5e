//! Read-only classification of every section in a document.
//!
//! The checker pairs START/END markers in body order, recomputes each block's
//! digest, and reconciles the result with the plan. It never writes.

use crate::digest;
use crate::document::Document;
use crate::marker::{self, Marker, MarkerKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Valid,
    Pending,
    HashMismatch,
    OrphanedStart,
    OrphanedEnd,
    Empty,
    Duplicate,
    PlanDrift,
    Unplanned,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Valid => "valid",
            Classification::Pending => "pending",
            Classification::HashMismatch => "hash_mismatch",
            Classification::OrphanedStart => "orphaned_start",
            Classification::OrphanedEnd => "orphaned_end",
            Classification::Empty => "empty",
            Classification::Duplicate => "duplicate",
            Classification::PlanDrift => "plan_drift",
            Classification::Unplanned => "unplanned",
        }
    }

    /// Damage that must be repaired before writing can resume.
    pub fn is_damage(self) -> bool {
        !matches!(self, Classification::Valid | Classification::Pending)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// START followed by an END with the same id.
    Closed,
    /// START with no matching END before the next START, a foreign END, or EOF.
    OrphanedStart,
    /// END with no open START of the same id.
    OrphanedEnd,
}

/// A contiguous run of body lines attributed to one section id.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: String,
    pub kind: BlockKind,
    /// First line of the block (zero-based body line).
    pub start: usize,
    /// One past the last line of the block.
    pub end: usize,
    pub start_hash: Option<String>,
    pub end_hash: Option<String>,
    /// Lines strictly between the markers, joined with `\n`.
    pub interior: String,
}

impl Block {
    fn closed(lines: &[&str], start: usize, open: Marker, end: usize, close: Marker) -> Self {
        Self {
            id: open.id,
            kind: BlockKind::Closed,
            start,
            end: end + 1,
            start_hash: Some(open.hash),
            end_hash: Some(close.hash),
            interior: lines[start + 1..end].join("\n"),
        }
    }

    fn orphaned_start(lines: &[&str], start: usize, open: Marker, stop: usize) -> Self {
        Self {
            id: open.id,
            kind: BlockKind::OrphanedStart,
            start,
            end: stop,
            start_hash: Some(open.hash),
            end_hash: None,
            interior: lines[start + 1..stop].join("\n"),
        }
    }

    fn orphaned_end(line: usize, close: Marker) -> Self {
        Self {
            id: close.id,
            kind: BlockKind::OrphanedEnd,
            start: line,
            end: line + 1,
            start_hash: None,
            end_hash: Some(close.hash),
            interior: String::new(),
        }
    }

    pub fn has_start(&self) -> bool {
        self.kind != BlockKind::OrphanedEnd
    }

    /// Digest of the interior as it currently stands.
    pub fn computed_hash(&self) -> String {
        digest::digest(&self.interior)
    }

    fn classify(&self) -> (Classification, Option<String>) {
        match self.kind {
            BlockKind::OrphanedStart => (
                Classification::OrphanedStart,
                Some(format!(
                    "START at line {} has no matching END (interrupted write)",
                    self.start + 1
                )),
            ),
            BlockKind::OrphanedEnd => (
                Classification::OrphanedEnd,
                Some(format!("END at line {} has no matching START", self.start + 1)),
            ),
            BlockKind::Closed if self.interior.is_empty() => (
                Classification::Empty,
                Some("markers present but content is empty".to_string()),
            ),
            BlockKind::Closed => {
                let computed = self.computed_hash();
                let start = self.start_hash.as_deref().unwrap_or("");
                let end = self.end_hash.as_deref().unwrap_or("");
                if start == computed && end == computed {
                    (Classification::Valid, None)
                } else if start != end {
                    (
                        Classification::HashMismatch,
                        Some(format!(
                            "START hash {} != END hash {}",
                            digest::short(start),
                            digest::short(end)
                        )),
                    )
                } else {
                    (
                        Classification::HashMismatch,
                        Some(format!(
                            "declared {} but content hashes to {}",
                            digest::short(start),
                            digest::short(&computed)
                        )),
                    )
                }
            }
        }
    }
}

/// Pair every marker in `body` into blocks, in body order.
pub fn scan_blocks(body: &str) -> Vec<Block> {
    let lines: Vec<&str> = body.lines().collect();
    let mut blocks = Vec::new();
    let mut open: Option<(usize, Marker)> = None;

    for (i, line) in lines.iter().enumerate() {
        let Some(m) = marker::parse_line(line) else {
            continue;
        };
        match m.kind {
            MarkerKind::Start => {
                if let Some((s, prev)) = open.take() {
                    blocks.push(Block::orphaned_start(&lines, s, prev, i));
                }
                open = Some((i, m));
            }
            MarkerKind::End => match open.take() {
                Some((s, prev)) if prev.id == m.id => {
                    blocks.push(Block::closed(&lines, s, prev, i, m));
                }
                Some((s, prev)) => {
                    blocks.push(Block::orphaned_start(&lines, s, prev, i));
                    blocks.push(Block::orphaned_end(i, m));
                }
                None => blocks.push(Block::orphaned_end(i, m)),
            },
        }
    }
    if let Some((s, prev)) = open {
        blocks.push(Block::orphaned_start(&lines, s, prev, lines.len()));
    }
    tracing::debug!(blocks = blocks.len(), "scanned body markers");
    blocks
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionReport {
    pub id: String,
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// One-based body line of the section's first marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Digest of the content currently on disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub sections: Vec<SectionReport>,
    pub completed: usize,
    pub total: usize,
    pub percent: u32,
}

impl IntegrityReport {
    pub fn get(&self, id: &str) -> Option<&SectionReport> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn classification(&self, id: &str) -> Option<Classification> {
        self.get(id).map(|s| s.classification)
    }

    /// Sections with damage, in report order.
    pub fn issues(&self) -> Vec<&SectionReport> {
        self.sections
            .iter()
            .filter(|s| s.classification.is_damage())
            .collect()
    }

    /// No damage anywhere (pending sections are fine).
    pub fn is_clean(&self) -> bool {
        self.issues().is_empty()
    }

    /// Every section that is not `valid`, as `(id, classification)`.
    pub fn not_valid(&self) -> Vec<(String, Classification)> {
        self.sections
            .iter()
            .filter(|s| s.classification != Classification::Valid)
            .map(|s| (s.id.clone(), s.classification))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Checker
// ---------------------------------------------------------------------------

/// Classify every section of `doc`. Plan entries come first in plan order,
/// followed by ids found only in the body.
pub fn check(doc: &Document) -> IntegrityReport {
    let blocks = scan_blocks(&doc.body);

    let mut by_id: HashMap<&str, Vec<&Block>> = HashMap::new();
    let mut body_order: Vec<&str> = Vec::new();
    for block in &blocks {
        let entry = by_id.entry(block.id.as_str()).or_default();
        if entry.is_empty() {
            body_order.push(block.id.as_str());
        }
        entry.push(block);
    }

    let mut sections = Vec::with_capacity(doc.plan.sections.len());
    for entry in &doc.plan.sections {
        let found = by_id.get(entry.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        let report = match classify_blocks(&entry.id, found) {
            None if entry.is_completed() => SectionReport {
                id: entry.id.clone(),
                classification: Classification::PlanDrift,
                detail: Some("completed in plan but no markers in body".to_string()),
                line: None,
                hash: None,
            },
            None => SectionReport {
                id: entry.id.clone(),
                classification: Classification::Pending,
                detail: None,
                line: None,
                hash: None,
            },
            Some(mut report) if report.classification == Classification::Valid => {
                match entry.hash.as_deref() {
                    None => {
                        report.classification = Classification::PlanDrift;
                        report.detail =
                            Some("valid block in body but plan says pending".to_string());
                    }
                    Some(h) if Some(h) != report.hash.as_deref() => {
                        report.classification = Classification::PlanDrift;
                        report.detail = Some(format!(
                            "plan records hash {} but block hashes to {}",
                            digest::short(h),
                            digest::short(report.hash.as_deref().unwrap_or(""))
                        ));
                    }
                    Some(_) => {}
                }
                report
            }
            Some(report) => report,
        };
        sections.push(report);
    }

    for id in body_order {
        if doc.plan.contains(id) {
            continue;
        }
        let found = by_id.get(id).map(Vec::as_slice).unwrap_or(&[]);
        if let Some(mut report) = classify_blocks(id, found) {
            report.detail = Some(format!(
                "markers for '{id}' ({}) but no plan entry",
                report.classification
            ));
            report.classification = Classification::Unplanned;
            sections.push(report);
        }
    }

    IntegrityReport {
        sections,
        completed: doc.plan.completed_count(),
        total: doc.plan.sections.len(),
        percent: doc.plan.completion_percent(),
    }
}

/// Combine every block carrying one id into a single report.
fn classify_blocks(id: &str, blocks: &[&Block]) -> Option<SectionReport> {
    let first = blocks.first()?;
    let line = Some(first.start + 1);

    let starts = blocks.iter().filter(|b| b.has_start()).count();
    if starts > 1 {
        let lines: Vec<String> = blocks
            .iter()
            .filter(|b| b.has_start())
            .map(|b| (b.start + 1).to_string())
            .collect();
        return Some(SectionReport {
            id: id.to_string(),
            classification: Classification::Duplicate,
            detail: Some(format!("{starts} marker blocks at lines {}", lines.join(", "))),
            line,
            hash: None,
        });
    }

    let hash = blocks
        .iter()
        .find(|b| b.has_start())
        .map(|b| b.computed_hash());
    let (classification, detail) = blocks
        .iter()
        .map(|b| b.classify())
        .find(|(c, _)| c.is_damage())
        .unwrap_or((Classification::Valid, None));
    Some(SectionReport {
        id: id.to_string(),
        classification,
        detail,
        line,
        hash,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
