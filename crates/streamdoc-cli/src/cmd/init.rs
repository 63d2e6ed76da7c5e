use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use streamdoc_core::config::Config;
use streamdoc_core::plan::parse_section_list;
use streamdoc_core::store::{self, InitOptions};
use streamdoc_core::template;

pub fn run(
    path: &Path,
    sections: Option<&str>,
    template_name: Option<&str>,
    force: bool,
    config: &Config,
    json: bool,
) -> anyhow::Result<()> {
    let ids = match (sections, template_name) {
        (Some(raw), _) => parse_section_list(raw),
        (None, Some(name)) => template::resolve(config, name)?.sections,
        (None, None) => anyhow::bail!("pass --sections a,b,c or --template <name>"),
    };

    let opts = InitOptions {
        overwrite: force,
        template: template_name.map(str::to_string),
    };
    let doc = store::init(path, &ids, &opts)
        .with_context(|| format!("failed to initialize {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({
            "path": path,
            "template": opts.template,
            "sections": ids,
        }))?;
    } else {
        println!(
            "Initialized {} with {} section(s): {}",
            path.display(),
            doc.plan.sections.len(),
            ids.join(", ")
        );
        println!("Next: streamdoc write {} {} <content>", path.display(), ids[0]);
    }
    Ok(())
}
