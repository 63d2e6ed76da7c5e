use crate::output::{print_json, print_table};
use clap::Subcommand;
use streamdoc_core::config::Config;
use streamdoc_core::template::{self, TemplateSource};

#[derive(Subcommand)]
pub enum TemplateSubcommand {
    /// List available templates
    List,
    /// Show the sections of one template
    Show { name: String },
}

pub fn run(subcmd: TemplateSubcommand, config: &Config, json: bool) -> anyhow::Result<()> {
    match subcmd {
        TemplateSubcommand::List => {
            let templates = template::list(config);
            if json {
                return print_json(&templates);
            }
            let rows: Vec<Vec<String>> = templates
                .iter()
                .map(|t| {
                    vec![
                        t.name.clone(),
                        match t.source {
                            TemplateSource::Builtin => "built-in".to_string(),
                            TemplateSource::Config => "config".to_string(),
                        },
                        t.sections.join(","),
                    ]
                })
                .collect();
            print_table(&["NAME", "SOURCE", "SECTIONS"], &rows);
            Ok(())
        }
        TemplateSubcommand::Show { name } => {
            let t = template::resolve(config, &name)?;
            if json {
                return print_json(&t);
            }
            if let Some(desc) = &t.description {
                println!("{}: {desc}", t.name);
            } else {
                println!("{}", t.name);
            }
            for (i, id) in t.sections.iter().enumerate() {
                println!("  {}. {id}", i + 1);
            }
            Ok(())
        }
    }
}
