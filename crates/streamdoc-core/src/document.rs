//! In-memory form of a streamdoc file: front-matter, plan, and body.
//!
//! Every mutating operation loads the whole file, edits this structure, and
//! writes it back with a single atomic rename.

use crate::error::{Result, StreamError};
use crate::marker::{self, Marker};
use crate::plan::{StreamPlan, PLAN_KEY};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

const DELIMITER: &str = "---";

// ---------------------------------------------------------------------------
// Front-matter splitting
// ---------------------------------------------------------------------------

/// Split `text` into `(yaml, body)` at the front-matter delimiters.
///
/// Returns `None` when the text does not open with a `---` line or the
/// closing delimiter is missing.
pub fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(DELIMITER)?;
    let rest = rest
        .strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))?;

    if let Some(body) = closing_at_start(rest) {
        return Some(("", body));
    }
    let mut search = 0;
    while let Some(offset) = rest[search..].find("\n---") {
        let end = search + offset;
        if let Some(body) = closing_at_start(&rest[end + 1..]) {
            return Some((&rest[..end], body));
        }
        search = end + 1;
    }
    None
}

/// If `s` starts with a bare `---` line, return the text after it.
fn closing_at_start(s: &str) -> Option<&str> {
    let after = s.strip_prefix(DELIMITER)?;
    if after.is_empty() {
        return Some(after);
    }
    after
        .strip_prefix('\n')
        .or_else(|| after.strip_prefix("\r\n"))
}

// ---------------------------------------------------------------------------
// Body lines
// ---------------------------------------------------------------------------

/// A marker found in the body, with its zero-based line index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerLine {
    pub line: usize,
    pub marker: Marker,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    /// Front-matter keys other than `stream_plan`, in file order.
    pub front_matter: Mapping,
    pub plan: StreamPlan,
    pub body: String,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, plan: StreamPlan) -> Self {
        Self {
            path: path.into(),
            front_matter: Mapping::new(),
            plan,
            body: String::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StreamError::DocumentNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let mut doc = Self::parse(&text)?;
        doc.path = path.to_path_buf();
        tracing::debug!(
            path = %path.display(),
            sections = doc.plan.sections.len(),
            "loaded document"
        );
        Ok(doc)
    }

    /// Parse document text. The returned document has an empty path.
    pub fn parse(text: &str) -> Result<Self> {
        let (yaml, body) = split_front_matter(text).ok_or_else(|| {
            StreamError::MalformedPlan("no YAML front-matter block at top of file".to_string())
        })?;
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| StreamError::MalformedPlan(format!("front-matter is not valid YAML: {e}")))?;
        let mut front_matter = match value {
            Value::Mapping(m) => m,
            Value::Null => Mapping::new(),
            _ => {
                return Err(StreamError::MalformedPlan(
                    "front-matter must be a YAML mapping".to_string(),
                ))
            }
        };
        let plan_value = front_matter
            .shift_remove(PLAN_KEY)
            .ok_or_else(|| StreamError::MalformedPlan(format!("missing '{PLAN_KEY}' key")))?;
        let plan: StreamPlan = serde_yaml::from_value(plan_value)
            .map_err(|e| StreamError::MalformedPlan(format!("{PLAN_KEY}: {e}")))?;
        plan.validate()?;

        Ok(Self {
            path: PathBuf::new(),
            front_matter,
            plan,
            body: body.to_string(),
        })
    }

    /// Render the full file: front-matter with `stream_plan` first, then the body.
    pub fn render(&self) -> Result<String> {
        let mut fm = Mapping::new();
        fm.insert(Value::String(PLAN_KEY.to_string()), serde_yaml::to_value(&self.plan)?);
        for (k, v) in &self.front_matter {
            fm.insert(k.clone(), v.clone());
        }
        let yaml = serde_yaml::to_string(&fm)?;
        let mut out = String::with_capacity(yaml.len() + self.body.len() + 8);
        out.push_str(DELIMITER);
        out.push('\n');
        out.push_str(&yaml);
        if !yaml.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(DELIMITER);
        out.push('\n');
        out.push_str(&self.body);
        Ok(out)
    }

    pub fn save(&self) -> Result<()> {
        let data = self.render()?;
        crate::io::atomic_write(&self.path, data.as_bytes())?;
        tracing::debug!(path = %self.path.display(), bytes = data.len(), "saved document");
        Ok(())
    }

    /// Every marker line in the body, in document order.
    pub fn markers(&self) -> Vec<MarkerLine> {
        self.body
            .lines()
            .enumerate()
            .filter_map(|(line, text)| {
                marker::parse_line(text).map(|marker| MarkerLine { line, marker })
            })
            .collect()
    }

    /// True if any marker line in the body carries `id`.
    pub fn has_marker(&self, id: &str) -> bool {
        self.markers().iter().any(|m| m.marker.id == id)
    }

    /// Append a framed section block to the body.
    pub fn append_block(&mut self, id: &str, hash: &str, content: &str) {
        if !self.body.is_empty() {
            if !self.body.ends_with('\n') {
                self.body.push('\n');
            }
            if !self.body.ends_with("\n\n") {
                self.body.push('\n');
            }
        }
        self.body.push_str(&marker::start_line(id, hash));
        self.body.push('\n');
        self.body.push_str(content);
        self.body.push('\n');
        self.body.push_str(&marker::end_line(id, hash));
        self.body.push('\n');
    }

    /// Drop `[start, end)` line ranges from the body, along with the blank
    /// separator line that followed (or preceded) each removed block.
    pub fn remove_line_ranges(&mut self, ranges: &[(usize, usize)]) {
        let lines: Vec<&str> = self.body.lines().collect();
        let mut drop = vec![false; lines.len()];
        for &(start, end) in ranges {
            let end = end.min(lines.len());
            for flag in drop.iter_mut().take(end).skip(start) {
                *flag = true;
            }
            if end < lines.len() && lines[end].trim().is_empty() {
                drop[end] = true;
            } else if start > 0 && lines[start - 1].trim().is_empty() {
                drop[start - 1] = true;
            }
        }
        let kept: Vec<String> = lines
            .iter()
            .zip(&drop)
            .filter(|(_, d)| !**d)
            .map(|(l, _)| l.to_string())
            .collect();
        self.set_body_lines(&kept);
    }

    /// Rebuild the body from explicit lines.
    pub fn set_body_lines(&mut self, lines: &[String]) {
        let mut body = lines.join("\n");
        if !body.is_empty() {
            body.push('\n');
        }
        self.body = body;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
