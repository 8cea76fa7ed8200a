/// groovy-nav: workspace navigation queries from the command line
///
/// Indexes a Groovy workspace and answers the same queries the language
/// backend exposes to its collaborators:
/// - symbols: prefix search over workspace declarations
/// - node: smallest syntax node at a position
/// - goto: definition of the symbol at a position
/// - diagnostics: per-file syntax diagnostics
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use groovy_nav::position::EditorPosition;
use groovy_nav::syntax::Severity;
use groovy_nav::{NavConfig, NavError, NavigationService};

#[derive(Parser)]
#[command(name = "groovy-nav")]
#[command(about = "Navigational queries over a Groovy workspace", long_about = None)]
#[command(version)]
struct Cli {
    /// Workspace root directory
    #[arg(short, long)]
    root: PathBuf,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List workspace declarations matching a name prefix
    Symbols {
        /// Name prefix; empty lists everything
        #[arg(default_value = "")]
        prefix: String,
    },

    /// Show the smallest syntax node at a position
    Node {
        file: PathBuf,
        /// 0-based line
        line: u32,
        /// 0-based character
        character: u32,
    },

    /// Resolve the definition of the symbol at a position
    Goto {
        file: PathBuf,
        /// 0-based line
        line: u32,
        /// 0-based character
        character: u32,

        /// Only report openable source locations, never binary-only hits
        #[arg(long)]
        strict: bool,
    },

    /// Print a file's diagnostics
    Diagnostics { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = match &cli.config {
        Some(path) => NavConfig::load(path)?,
        None => NavConfig::default(),
    };
    let service = NavigationService::new(config)?;
    service
        .initialize_workspace(&cli.root)
        .with_context(|| format!("failed to index workspace {}", cli.root.display()))?;
    info!("workspace indexed: {}", cli.root.display());

    match cli.command {
        Commands::Symbols { prefix } => {
            let symbols = service.symbols_matching(&prefix);
            println!("{}", serde_json::to_string_pretty(&symbols)?);
        }
        Commands::Node {
            file,
            line,
            character,
        } => {
            let uri = uri_of(&file)?;
            let position = EditorPosition::new(line, character);
            match service.node_at(&uri, position) {
                Some(handle) => println!(
                    "{} {:?} {:?}",
                    handle.kind,
                    handle.name.unwrap_or_default(),
                    handle.range
                ),
                None => return Err(service.position_miss(&uri, position).into()),
            }
        }
        Commands::Goto {
            file,
            line,
            character,
            strict,
        } => {
            let uri = uri_of(&file)?;
            let position = EditorPosition::new(line, character);
            let Some(handle) = service.node_at(&uri, position) else {
                return Err(service.position_miss(&uri, position).into());
            };
            match service.resolve_definition(&uri, position, strict) {
                Some(location) => println!("{}", serde_json::to_string_pretty(&location)?),
                None => {
                    let name = handle.name.unwrap_or_else(|| handle.kind.clone());
                    return Err(NavError::SymbolNotFound(name).into());
                }
            }
        }
        Commands::Diagnostics { file } => {
            let uri = uri_of(&file)?;
            let diagnostics = service.diagnostics(&uri);
            println!("{}", serde_json::to_string_pretty(&diagnostics)?);
            let errors = diagnostics
                .iter()
                .filter(|d| d.severity == Severity::Error)
                .count();
            if errors > 0 {
                return Err(NavError::CompilationFailed {
                    uri,
                    diagnostics: errors,
                }
                .into());
            }
        }
    }
    Ok(())
}

fn uri_of(file: &PathBuf) -> Result<String> {
    let absolute = file
        .canonicalize()
        .with_context(|| format!("no such file: {}", file.display()))?;
    Ok(absolute.to_string_lossy().into_owned())
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
