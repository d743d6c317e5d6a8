//! PineTree CLI

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Once;

use pinetree::error::report_error;
use pinetree::interp::{EngineConfig, EngineError, parse_source};
use pinetree::repl::{Repl, prepared_engine};

static TRACING_INIT: Once = Once::new();

#[derive(Parser)]
#[command(name = "pinetree", version, about = "PineTree - an embeddable, class-based scripting language")]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory searched by `import` (repeatable)
    #[arg(long = "module-path", global = true)]
    module_paths: Vec<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a PineTree script
    Run {
        /// Script to run
        file: PathBuf,
    },
    /// Start an interactive session
    Repl {
        /// Skip running the scripts in the working directory first
        #[arg(long)]
        no_preload: bool,
    },
    /// Parse and dump the AST as JSON
    Export {
        /// Source file to export
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = load_config(&cli).and_then(|config| match cli.command {
        Command::Run { file } => run_file(&file, config),
        Command::Repl { no_preload } => run_repl(config, !no_preload),
        Command::Export { file } => export_file(&file),
        Command::Tokens { file } => tokenize_file(&file),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Install the fmt subscriber when RUST_LOG is set
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

fn load_config(cli: &Cli) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if !cli.module_paths.is_empty() {
        config.module_paths = cli.module_paths.clone();
    }
    Ok(config)
}

fn run_file(path: &Path, mut config: EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    if let Some(dir) = path.parent() {
        config.module_paths.push(dir.to_path_buf());
    }
    let mut engine = prepared_engine(config);

    match engine.execute(&source) {
        Ok(_) => Ok(()),
        Err(EngineError::Compile(err)) => {
            report_error(&filename, &source, &err);
            Err(err.into())
        }
        Err(EngineError::Runtime(err)) => Err(err.into()),
    }
}

fn run_repl(config: EngineConfig, preload: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut repl = Repl::new(config)?;
    if preload {
        repl.preload(Path::new("."));
    }
    repl.run()?;
    Ok(())
}

fn export_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    let program = match parse_source(&filename, &source) {
        Ok(program) => program,
        Err(err) => {
            report_error(&filename, &source, &err);
            return Err(err.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&program)?);
    Ok(())
}

fn tokenize_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;

    let tokens = pinetree::lexer::tokenize(&source)?;
    for (tok, span) in &tokens {
        println!("{:?} @ {}..{}", tok, span.start, span.end);
    }

    Ok(())
}
