use crate::output::{print_json, print_table, progress_bar};
use anyhow::Context;
use std::path::Path;
use streamdoc_core::digest;
use streamdoc_core::document::Document;
use streamdoc_core::integrity;

pub fn run(path: &Path, verify: bool, json: bool) -> anyhow::Result<()> {
    let doc = Document::load(path).with_context(|| format!("failed to load {}", path.display()))?;
    let report = integrity::check(&doc);

    if json {
        print_json(&report)?;
    } else {
        let rows: Vec<Vec<String>> = report
            .sections
            .iter()
            .map(|s| {
                let plan_status = doc
                    .plan
                    .entry(&s.id)
                    .map(|e| e.status.to_string())
                    .unwrap_or_else(|| "-".to_string());
                vec![
                    s.id.clone(),
                    plan_status,
                    s.classification.to_string(),
                    s.hash.as_deref().map(digest::short).unwrap_or("-").to_string(),
                    s.detail.clone().unwrap_or_default(),
                ]
            })
            .collect();
        print_table(&["SECTION", "PLAN", "CHECK", "HASH", "DETAIL"], &rows);
        println!();
        println!(
            "Progress: {}/{} sections {}",
            report.completed,
            report.total,
            progress_bar(report.percent, 20)
        );
        for issue in report.issues() {
            println!(
                "  ! {}: {} -> streamdoc repair {} {}",
                issue.id,
                issue.classification,
                path.display(),
                issue.id
            );
        }
    }

    if verify && !report.is_clean() {
        let ids: Vec<String> = report
            .issues()
            .iter()
            .map(|s| format!("{} ({})", s.id, s.classification))
            .collect();
        anyhow::bail!(
            "integrity check failed for {}: {}",
            path.display(),
            ids.join(", ")
        );
    }
    Ok(())
}
