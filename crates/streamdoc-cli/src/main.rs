mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, plan::PlanSubcommand, template::TemplateSubcommand};
use std::path::PathBuf;
use streamdoc_core::config::Config;
use streamdoc_core::paths::CONFIG_ENV;

#[derive(Parser)]
#[command(
    name = "streamdoc",
    about = "Write long markdown documents section by section, with integrity markers and resume",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: .streamdoc/config.yaml in cwd or an ancestor, then ~/.streamdoc/config.yaml)
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Verbose logging on stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a document with an empty section plan
    Init {
        /// Document path
        path: PathBuf,
        /// Comma-separated section ids, in order
        #[arg(long, conflicts_with = "template")]
        sections: Option<String>,
        /// Named template to take the section list from
        #[arg(long)]
        template: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Append one pending section and mark it completed
    Write {
        path: PathBuf,
        /// Section id from the plan
        id: String,
        /// Section content (or use --file / --stdin)
        #[arg(conflicts_with_all = ["file", "stdin"])]
        content: Option<String>,
        /// Read content from a file
        #[arg(long, conflicts_with = "stdin")]
        file: Option<PathBuf>,
        /// Read content from standard input
        #[arg(long)]
        stdin: bool,
    },

    /// Show per-section classification and completion
    Status {
        path: PathBuf,
        /// Exit non-zero if any section is damaged
        #[arg(long)]
        verify: bool,
    },

    /// Report the next section to write
    Resume { path: PathBuf },

    /// Recover a damaged section so it can be written again
    Repair {
        path: PathBuf,
        id: String,
        /// remove, backup, or complete
        #[arg(long, default_value = "remove")]
        strategy: String,
    },

    /// Strip markers and plan metadata, producing the clean document
    Finalize {
        path: PathBuf,
        /// Write the result here instead of overwriting the document
        #[arg(long, short = 'o', conflicts_with = "stdout")]
        output: Option<PathBuf>,
        /// Print the result instead of writing it
        #[arg(long)]
        stdout: bool,
    },

    /// Inspect or extend a document's section plan
    Plan {
        #[command(subcommand)]
        subcommand: PlanSubcommand,
    },

    /// List and show section templates
    Template {
        #[command(subcommand)]
        subcommand: TemplateSubcommand,
    },

    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let (config, config_source) = Config::discover(cli.config.as_deref(), &cwd)?;
    tracing::debug!(source = ?config_source, "resolved config");
    let json = cli.json;

    match cli.command {
        Commands::Init {
            path,
            sections,
            template,
            force,
        } => cmd::init::run(&path, sections.as_deref(), template.as_deref(), force, &config, json),
        Commands::Write {
            path,
            id,
            content,
            file,
            stdin,
        } => {
            let source = cmd::write::ContentSource::from_args(content, file, stdin)?;
            cmd::write::run(&path, &id, source, json)
        }
        Commands::Status { path, verify } => cmd::status::run(&path, verify, json),
        Commands::Resume { path } => cmd::resume::run(&path, json),
        Commands::Repair { path, id, strategy } => {
            cmd::repair::run(&path, &id, &strategy, &config, json)
        }
        Commands::Finalize {
            path,
            output,
            stdout,
        } => cmd::finalize::run(&path, output, stdout, &config, json),
        Commands::Plan { subcommand } => cmd::plan::run(subcommand, json),
        Commands::Template { subcommand } => cmd::template::run(subcommand, &config, json),
        Commands::Config { subcommand } => cmd::config::run(subcommand, &config, &config_source, json),
    }
}
