mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, skills::SkillsSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "quill",
    about = "CMS authoring assistant — lint docs, score skill rules, and scaffold projects",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .scribe/ or .git/)
    #[arg(long, global = true, env = "SCRIBE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a scribe project in the current directory
    Init,

    /// Run the lint passes over the docs tree
    Lint {
        /// Passes to run: codeblocks, paths, terminology, indicators (default: all)
        passes: Vec<String>,

        /// Report changes without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Overwrite existing .bak snapshots instead of skipping
        #[arg(long)]
        force: bool,

        /// Rewrite files in place without .bak snapshots
        #[arg(long)]
        no_backup: bool,

        /// Lint this directory instead of the configured docs dir
        #[arg(long, value_name = "DIR")]
        path: Option<String>,
    },

    /// Inspect and test skill activation rules
    Skills {
        #[command(subcommand)]
        subcommand: SkillsSubcommand,
    },

    /// Concatenate assets into content-hashed bundles
    Bundle {
        /// Bundle manifest to use instead of .scribe/bundle.yaml
        #[arg(long, value_name = "FILE")]
        manifest: Option<PathBuf>,
    },

    /// Launch the setup wizard web UI
    Wizard {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, default_value = "0")]
        port: u16,

        /// Don't open browser automatically
        #[arg(long)]
        no_open: bool,
    },

    /// Inspect and validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Wizard { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root_path = cli.root.as_deref();
    let root = root::resolve_root(root_path);

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Lint {
            passes,
            dry_run,
            force,
            no_backup,
            path,
        } => cmd::lint::run(
            &root,
            &passes,
            dry_run,
            force,
            no_backup,
            path.as_deref(),
            cli.json,
        ),
        Commands::Skills { subcommand } => cmd::skills::run(&root, subcommand, cli.json),
        Commands::Bundle { manifest } => cmd::bundle::run(&root, manifest.as_deref(), cli.json),
        Commands::Wizard { port, no_open } => cmd::wizard::run(&root, port, no_open),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
