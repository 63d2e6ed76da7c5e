use std::path::PathBuf;
use thiserror::Error;

use crate::integrity::Classification;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("document already exists: {0} (pass --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("document not found: {0}: run 'streamdoc init' first")]
    DocumentNotFound(PathBuf),

    #[error("malformed plan: {0}")]
    MalformedPlan(String),

    #[error("unsupported stream_plan version {0} (expected 1)")]
    UnsupportedPlanVersion(u32),

    #[error("plan must declare at least one section")]
    EmptyPlan,

    #[error("invalid section id '{0}': must start with a letter or digit and contain only letters, digits, '-', '_' or '.'")]
    InvalidSectionId(String),

    #[error("section '{0}' is declared more than once in the plan")]
    DuplicatePlanSection(String),

    #[error("unknown section '{0}': not declared in the plan")]
    UnknownSection(String),

    #[error("section '{0}' is already completed: run 'streamdoc repair' on it before rewriting")]
    SectionAlreadyCompleted(String),

    #[error("section '{0}': content is empty")]
    EmptyContent(String),

    #[error("section '{0}': content contains a section marker line")]
    MarkerInContent(String),

    #[error("section '{id}' is {classification}: run 'streamdoc repair <path> {id}' before writing")]
    CorruptDocument {
        id: String,
        classification: Classification,
    },

    #[error("section '{0}' has no marker in the document body")]
    SectionNotFound(String),

    #[error("section '{0}' is valid: nothing to repair")]
    NothingToRepair(String),

    #[error("cannot repair section '{id}' with strategy '{strategy}': {reason}")]
    RepairUnsupported {
        id: String,
        strategy: String,
        reason: String,
    },

    #[error("cannot finalize: {}", describe_blocked(.0))]
    FinalizeBlocked(Vec<(String, Classification)>),

    #[error("unknown repair strategy '{0}' (expected remove, backup, or complete)")]
    InvalidStrategy(String),

    #[error("unknown template '{0}': run 'streamdoc template list'")]
    UnknownTemplate(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn describe_blocked(sections: &[(String, Classification)]) -> String {
    let list: Vec<String> = sections
        .iter()
        .map(|(id, c)| format!("{id} ({c})"))
        .collect();
    format!(
        "{} section(s) not ready: {}",
        sections.len(),
        list.join(", ")
    )
}

pub type Result<T> = std::result::Result<T, StreamError>;
