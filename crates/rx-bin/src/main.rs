//! regexlab entrypoint.
use anyhow::{Context, Result};
use clap::Parser;
use core_config::load_from;
use core_matcher::SessionOptions;
use core_model::{InMemoryPatternRepository, PatternDocument};
use regexlab::{Workspace, report, run_interactive};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Once};
use tokio::io::{self, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "regexlab", version, about = "Check a regex against its test cases")]
struct Args {
    /// Pattern document (TOML) to open.
    pub document: PathBuf,
    /// Optional configuration file path (overrides discovery of `regexlab.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Keep the session open and read commands from stdin.
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("regexlab.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, "regexlab.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(_) => Some(guard),
        // Global subscriber already installed; dropping the guard shuts the writer down.
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let config = load_from(args.config.clone())?;
    let options = SessionOptions {
        engine: config.engine_options(),
        history_max_depth: config.history_max_depth(),
    };
    let doc = PatternDocument::read_from(&args.document)
        .with_context(|| format!("opening {}", args.document.display()))?;
    info!(
        target: "runtime.startup",
        document = %args.document.display(),
        cases = doc.test_cases.len(),
        config = ?config.source,
        engine = ?options.engine.kind,
        interactive = args.interactive,
        "bootstrap_complete"
    );

    let repository = Arc::new(InMemoryPatternRepository::new());
    let mut workspace = Workspace::open(doc, Some(args.document.clone()), options, repository);

    let code = if args.interactive {
        run_interactive(&mut workspace, BufReader::new(io::stdin()), io::stdout()).await?;
        ExitCode::SUCCESS
    } else {
        let snapshot = workspace.settled().await;
        let mut stdout = io::stdout();
        stdout.write_all(report::render(&snapshot).as_bytes()).await?;
        stdout.flush().await?;
        if report::all_passed(&snapshot) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    };

    let metrics = workspace.session().metrics();
    info!(
        target: "runtime",
        validations_run = metrics.validations_run,
        results_applied = metrics.results_applied,
        results_discarded = metrics.results_discarded,
        skipped_before_run = metrics.skipped_before_run,
        "shutdown"
    );
    workspace.shutdown().await;
    Ok(code)
}
