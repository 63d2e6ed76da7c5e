use crate::error::{Result, StreamError};
use crate::paths;
use crate::plan::validate_section_id;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// BackupConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_backup_suffix")]
    pub suffix: String,
    /// Insert a UTC timestamp before the suffix so backups never overwrite each other.
    #[serde(default = "default_true")]
    pub timestamped: bool,
}

fn default_backup_suffix() -> String {
    ".bak".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            suffix: default_backup_suffix(),
            timestamped: true,
        }
    }
}

// ---------------------------------------------------------------------------
// FinalizeConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeConfig {
    /// Text placed between consecutive sections.
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default)]
    pub trailing_newline: bool,
    /// Keep front-matter keys other than `stream_plan` in the output.
    #[serde(default = "default_true")]
    pub keep_front_matter: bool,
}

fn default_separator() -> String {
    "\n\n".to_string()
}

impl Default for FinalizeConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            trailing_newline: false,
            keep_front_matter: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub templates: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub finalize: FinalizeConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            templates: BTreeMap::new(),
            backup: BackupConfig::default(),
            finalize: FinalizeConfig::default(),
        }
    }
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ConfigSource {
    Explicit(PathBuf),
    Project(PathBuf),
    User(PathBuf),
    Default,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Explicit(p) | ConfigSource::Project(p) | ConfigSource::User(p) => {
                Some(p)
            }
            ConfigSource::Default => None,
        }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StreamError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Resolve and load the active configuration.
    ///
    /// Priority:
    /// 1. `explicit` (`--config` flag / `STREAMDOC_CONFIG` env var)
    /// 2. `.streamdoc/config.yaml` in `start` or any ancestor
    /// 3. `~/.streamdoc/config.yaml`
    /// 4. Built-in defaults
    pub fn discover(explicit: Option<&Path>, start: &Path) -> Result<(Self, ConfigSource)> {
        if let Some(p) = explicit {
            return Ok((Self::load_from(p)?, ConfigSource::Explicit(p.to_path_buf())));
        }
        if let Some(p) = paths::find_project_config(start) {
            return Ok((Self::load_from(&p)?, ConfigSource::Project(p)));
        }
        if let Some(p) = paths::user_config_path().filter(|p| p.exists()) {
            return Ok((Self::load_from(&p)?, ConfigSource::User(p)));
        }
        Ok((Self::default(), ConfigSource::Default))
    }

    /// Timestamp for backup file names, if enabled.
    pub fn backup_stamp(&self) -> Option<String> {
        self.backup
            .timestamped
            .then(|| chrono::Utc::now().format("%Y%m%dT%H%M%S").to_string())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.version != 1 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("unsupported config version {}", self.version),
            });
        }

        for (name, sections) in &self.templates {
            if sections.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("template '{name}' declares no sections"),
                });
            }
            let mut seen = HashSet::new();
            for id in sections {
                if validate_section_id(id).is_err() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: format!("template '{name}' has invalid section id '{id}'"),
                    });
                }
                if !seen.insert(id.as_str()) {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: format!("template '{name}' repeats section '{id}'"),
                    });
                }
            }
            if crate::template::is_builtin(name) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("template '{name}' overrides the built-in template"),
                });
            }
        }

        if self.finalize.separator.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "finalize.separator is empty: sections will run together".to_string(),
            });
        }

        if self.backup.suffix.is_empty() || self.backup.suffix.contains('/') {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "backup.suffix '{}' must be non-empty and contain no '/'",
                    self.backup.suffix
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        assert!(!yaml.contains("templates"));
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.finalize.separator, "\n\n");
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg.backup.suffix, ".bak");
        assert!(cfg.backup.timestamped);
        assert!(!cfg.finalize.trailing_newline);
        assert!(cfg.finalize.keep_front_matter);
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let yaml = r#"
templates:
  postmortem: [impact, timeline, follow-ups]
finalize:
  trailing_newline: true
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.templates["postmortem"].len(), 3);
        assert!(cfg.finalize.trailing_newline);
        assert_eq!(cfg.finalize.separator, "\n\n");
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validate_flags_bad_templates() {
        let mut cfg = Config::default();
        cfg.templates.insert("empty".to_string(), vec![]);
        cfg.templates
            .insert("dupes".to_string(), vec!["a".to_string(), "a".to_string()]);
        cfg.templates
            .insert("bad-id".to_string(), vec!["has space".to_string()]);
        cfg.templates.insert("rca".to_string(), vec!["x".to_string()]);
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("declares no sections")));
        assert!(warnings.iter().any(|w| w.message.contains("repeats section 'a'")));
        assert!(warnings.iter().any(|w| w.message.contains("invalid section id 'has space'")));
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains("overrides the built-in")));
    }

    #[test]
    fn validate_flags_finalize_and_backup() {
        let mut cfg = Config::default();
        cfg.finalize.separator = String::new();
        cfg.backup.suffix = "/x".to_string();
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains("separator is empty")));
        assert!(warnings.iter().any(|w| w.message.contains("backup.suffix")));
    }

    #[test]
    fn discover_prefers_explicit_then_project() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join(".streamdoc/config.yaml");
        std::fs::create_dir_all(project.parent().unwrap()).unwrap();
        std::fs::write(&project, "backup:\n  suffix: .orig\n").unwrap();
        let nested = dir.path().join("docs/drafts");
        std::fs::create_dir_all(&nested).unwrap();

        let (cfg, source) = Config::discover(None, &nested).unwrap();
        assert_eq!(source, ConfigSource::Project(project.clone()));
        assert_eq!(cfg.backup.suffix, ".orig");

        let explicit = dir.path().join("other.yaml");
        std::fs::write(&explicit, "finalize:\n  separator: \"\\n---\\n\"\n").unwrap();
        let (cfg, source) = Config::discover(Some(&explicit), &nested).unwrap();
        assert_eq!(source, ConfigSource::Explicit(explicit));
        assert_eq!(cfg.finalize.separator, "\n---\n");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.yaml");
        assert!(Config::discover(Some(&missing), dir.path()).is_err());
    }

    #[test]
    fn backup_stamp_follows_setting() {
        let mut cfg = Config::default();
        assert_eq!(cfg.backup_stamp().unwrap().len(), 15);
        cfg.backup.timestamped = false;
        assert!(cfg.backup_stamp().is_none());
    }

    #[test]
    fn load_from_reads_templates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "templates:\n  notes: [one]\n").unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.templates["notes"], ["one"]);
    }
}
