use crate::digest;
use crate::error::{Result, StreamError};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

pub const PLAN_KEY: &str = "stream_plan";
pub const PLAN_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// SectionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Pending,
    Completed,
}

impl SectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionStatus::Pending => "pending",
            SectionStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SectionEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionEntry {
    pub id: String,
    pub status: SectionStatus,
    /// Digest of the written content; `None` while pending.
    pub hash: Option<String>,
}

impl SectionEntry {
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: SectionStatus::Pending,
            hash: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SectionStatus::Completed
    }
}

// ---------------------------------------------------------------------------
// StreamPlan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamPlan {
    pub version: u32,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub sections: Vec<SectionEntry>,
}

impl StreamPlan {
    /// Build a fresh plan with every section pending.
    pub fn new<S: AsRef<str>>(ids: &[S]) -> Result<Self> {
        let now = Utc::now();
        let plan = Self {
            version: PLAN_VERSION,
            created: now,
            last_modified: now,
            template: None,
            sections: ids
                .iter()
                .map(|id| SectionEntry::pending(id.as_ref()))
                .collect(),
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Check the structural invariants a loaded plan must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.version != PLAN_VERSION {
            return Err(StreamError::UnsupportedPlanVersion(self.version));
        }
        if self.sections.is_empty() {
            return Err(StreamError::EmptyPlan);
        }
        let mut seen = HashSet::new();
        for entry in &self.sections {
            validate_section_id(&entry.id)?;
            if !seen.insert(entry.id.as_str()) {
                return Err(StreamError::DuplicatePlanSection(entry.id.clone()));
            }
            if entry.is_completed() {
                match entry.hash.as_deref() {
                    None | Some("") => {
                        return Err(StreamError::MalformedPlan(format!(
                            "section '{}' is completed but has no hash",
                            entry.id
                        )))
                    }
                    Some(h) if !digest::is_hex_digest(h) => {
                        return Err(StreamError::MalformedPlan(format!(
                            "section '{}' has hash '{h}': expected lowercase hex",
                            entry.id
                        )))
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    pub fn entry(&self, id: &str) -> Option<&SectionEntry> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn entry_mut(&mut self, id: &str) -> Option<&mut SectionEntry> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entry(id).is_some()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    pub fn next_pending(&self) -> Option<&SectionEntry> {
        self.sections.iter().find(|s| !s.is_completed())
    }

    pub fn completed_count(&self) -> usize {
        self.sections.iter().filter(|s| s.is_completed()).count()
    }

    pub fn completion_percent(&self) -> u32 {
        if self.sections.is_empty() {
            return 0;
        }
        (self.completed_count() * 100 / self.sections.len()) as u32
    }

    pub fn is_complete(&self) -> bool {
        self.sections.iter().all(|s| s.is_completed())
    }

    /// Set one entry's status and hash, keeping the hash/status invariant.
    pub fn set_status(&mut self, id: &str, status: SectionStatus, hash: Option<String>) -> Result<()> {
        let entry = self
            .entry_mut(id)
            .ok_or_else(|| StreamError::UnknownSection(id.to_string()))?;
        match status {
            SectionStatus::Completed => {
                let hash = hash.filter(|h| !h.is_empty()).ok_or_else(|| {
                    StreamError::MalformedPlan(format!(
                        "section '{id}' cannot be completed without a hash"
                    ))
                })?;
                if !digest::is_hex_digest(&hash) {
                    return Err(StreamError::MalformedPlan(format!(
                        "section '{id}' has hash '{hash}': expected lowercase hex"
                    )));
                }
                entry.status = SectionStatus::Completed;
                entry.hash = Some(hash);
            }
            SectionStatus::Pending => {
                entry.status = SectionStatus::Pending;
                entry.hash = None;
            }
        }
        self.touch();
        Ok(())
    }

    pub fn mark_completed(&mut self, id: &str, hash: impl Into<String>) -> Result<()> {
        self.set_status(id, SectionStatus::Completed, Some(hash.into()))
    }

    pub fn mark_pending(&mut self, id: &str) -> Result<()> {
        self.set_status(id, SectionStatus::Pending, None)
    }

    /// Insert a new pending section, after `after` or at the end.
    pub fn add_section(&mut self, id: &str, after: Option<&str>) -> Result<()> {
        validate_section_id(id)?;
        if self.contains(id) {
            return Err(StreamError::DuplicatePlanSection(id.to_string()));
        }
        let index = match after {
            Some(anchor) => {
                self.position(anchor)
                    .ok_or_else(|| StreamError::UnknownSection(anchor.to_string()))?
                    + 1
            }
            None => self.sections.len(),
        };
        self.sections.insert(index, SectionEntry::pending(id));
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// Section id validation
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").unwrap())
}

pub fn validate_section_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !id_re().is_match(id) {
        return Err(StreamError::InvalidSectionId(id.to_string()));
    }
    Ok(())
}

/// Split a comma-separated id list, dropping blanks.
pub fn parse_section_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
