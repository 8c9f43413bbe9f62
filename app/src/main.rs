#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;
mod sink;
mod store;

use askflow_config::Overrides;
use clap::{Args, Parser, Subcommand};
use command::{
    AskInput, AskStrategy, ChatInput, ChatStrategy, CommandStrategy, InfoStrategy, InitStrategy,
    VersionStrategy,
};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "askflow")]
#[command(about = "Ask questions, optionally grounded in a knowledge base", long_about = None)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
struct SelectionArgs {
    /// Model to use
    #[arg(short = 'M', long)]
    model: Option<String>,

    /// Knowledge base (dataset id) to answer from
    #[arg(long)]
    kb: Option<String>,

    /// Ask for a complete response instead of a stream
    #[arg(long)]
    no_stream: bool,
}

impl From<SelectionArgs> for Overrides {
    fn from(args: SelectionArgs) -> Self {
        Self {
            model: args.model,
            knowledge_base: args.kb,
            no_stream: args.no_stream,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        /// The question
        question: String,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Also write the rendered answer to an HTML file
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Start an interactive multi-turn session
    Chat {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Initialize configuration
    Init,
    /// Show configuration information
    Info,
    /// Show version
    Version,
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Ask {
            question,
            selection,
            html,
        } => {
            AskStrategy
                .execute(AskInput {
                    question,
                    overrides: selection.into(),
                    html,
                })
                .await
        }
        Commands::Chat { selection } => {
            ChatStrategy
                .execute(ChatInput {
                    overrides: selection.into(),
                })
                .await
        }
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
