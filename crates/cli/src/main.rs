//! ContentPilot CLI: the main entry point.
//!
//! Commands:
//! - `init`: Print the default configuration
//! - `schema`: Show the schema tree of a content type
//! - `prompt`: Show the full system prompt for a content type
//! - `recover`: Recover a key/value tree from a raw LLM reply
//! - `populate`: Apply a recorded reply to a fresh object and dump the graph

use clap::{Parser, Subcommand, ValueEnum};
use contentpilot_config::PromptMode;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "contentpilot",
    about = "ContentPilot: schema-grounded LLM content generation",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.contentpilot/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default configuration
    Init,

    /// Show the schema tree of a content type
    Schema {
        /// Content model definition (TOML)
        #[arg(short, long)]
        model: PathBuf,

        /// Content type to describe
        #[arg(short = 't', long = "type")]
        type_name: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = SchemaFormat::Verbose)]
        format: SchemaFormat,
    },

    /// Show the full system prompt for a content type
    Prompt {
        #[arg(short, long)]
        model: PathBuf,

        #[arg(short = 't', long = "type")]
        type_name: String,

        /// Override the configured prompt mode (verbose | compact)
        #[arg(long)]
        mode: Option<PromptMode>,
    },

    /// Recover a key/value tree from a raw reply (file or stdin)
    Recover {
        /// Reply file; reads stdin when omitted
        file: Option<PathBuf>,
    },

    /// Apply a recorded reply to a new object and dump the resulting graph
    Populate {
        #[arg(short, long)]
        model: PathBuf,

        #[arg(short = 't', long = "type")]
        type_name: String,

        /// Recorded LLM reply
        #[arg(short, long)]
        reply: PathBuf,

        /// The request the reply answers
        #[arg(long, default_value = "")]
        request: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaFormat {
    Verbose,
    Compact,
    Json,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Schema {
            model,
            type_name,
            format,
        } => commands::schema::run(config, &model, &type_name, format)?,
        Commands::Prompt {
            model,
            type_name,
            mode,
        } => commands::prompt::run(config, &model, &type_name, mode)?,
        Commands::Recover { file } => commands::recover::run(file.as_deref())?,
        Commands::Populate {
            model,
            type_name,
            reply,
            request,
        } => commands::populate::run(config, &model, &type_name, &reply, &request).await?,
    }

    Ok(())
}
