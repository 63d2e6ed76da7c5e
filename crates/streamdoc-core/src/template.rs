//! Named section lists for `streamdoc init --template`.

use crate::config::Config;
use crate::error::{Result, StreamError};
use serde::Serialize;

const BUILTIN: &[(&str, &str, &[&str])] = &[
    (
        "report",
        "General analytical report",
        &["summary", "background", "analysis", "findings", "recommendations"],
    ),
    (
        "rca",
        "Root-cause analysis write-up",
        &["problem", "timeline", "five-whys", "root-cause", "corrective-actions"],
    ),
    (
        "adr",
        "Architecture decision record",
        &["context", "decision", "consequences"],
    ),
    (
        "readme",
        "Project README",
        &["overview", "installation", "usage", "configuration", "contributing"],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSource {
    Builtin,
    Config,
}

#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub name: String,
    pub description: Option<String>,
    pub sections: Vec<String>,
    pub source: TemplateSource,
}

pub fn is_builtin(name: &str) -> bool {
    BUILTIN.iter().any(|(n, _, _)| *n == name)
}

fn builtin(name: &str) -> Option<Template> {
    BUILTIN
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(n, desc, sections)| Template {
            name: n.to_string(),
            description: Some(desc.to_string()),
            sections: sections.iter().map(|s| s.to_string()).collect(),
            source: TemplateSource::Builtin,
        })
}

/// Look up a template; config-defined templates shadow built-ins.
pub fn resolve(config: &Config, name: &str) -> Result<Template> {
    if let Some(sections) = config.templates.get(name) {
        return Ok(Template {
            name: name.to_string(),
            description: None,
            sections: sections.clone(),
            source: TemplateSource::Config,
        });
    }
    builtin(name).ok_or_else(|| StreamError::UnknownTemplate(name.to_string()))
}

/// Every available template, sorted by name.
pub fn list(config: &Config) -> Vec<Template> {
    let mut names: Vec<&str> = BUILTIN.iter().map(|(n, _, _)| *n).collect();
    names.extend(config.templates.keys().map(String::as_str));
    names.sort_unstable();
    names.dedup();
    names
        .into_iter()
        .filter_map(|n| resolve(config, n).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::StreamPlan;

    #[test]
    fn builtins_are_valid_plans() {
        let cfg = Config::default();
        for t in list(&cfg) {
            StreamPlan::new(&t.sections)
                .unwrap_or_else(|e| panic!("template {} is invalid: {e}", t.name));
        }
    }

    #[test]
    fn resolve_builtin() {
        let t = resolve(&Config::default(), "adr").unwrap();
        assert_eq!(t.sections, ["context", "decision", "consequences"]);
        assert_eq!(t.source, TemplateSource::Builtin);
    }

    #[test]
    fn config_template_shadows_builtin() {
        let mut cfg = Config::default();
        cfg.templates
            .insert("adr".to_string(), vec!["status".to_string(), "decision".to_string()]);
        cfg.templates
            .insert("postmortem".to_string(), vec!["impact".to_string()]);
        let t = resolve(&cfg, "adr").unwrap();
        assert_eq!(t.source, TemplateSource::Config);
        assert_eq!(t.sections, ["status", "decision"]);

        let names: Vec<String> = list(&cfg).into_iter().map(|t| t.name).collect();
        assert_eq!(names, ["adr", "postmortem", "rca", "readme", "report"]);
    }

    #[test]
    fn unknown_template() {
        assert!(matches!(
            resolve(&Config::default(), "nope"),
            Err(StreamError::UnknownTemplate(_))
        ));
    }
}
