//! CLI entrypoint for Conclave
//!
//! This is the main binary that wires together all layers using
//! dependency injection: configuration and adapters are constructed here
//! and handed to the orchestrator.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use conclave_application::ports::mirror::{MirrorWriter, NoMirror};
use conclave_application::{
    Broadcaster, BroadcasterConfig, HostMirror, Orchestrator, ParticipantReactor, ReactorConfig,
};
use conclave_domain::ParticipantConfig;
use conclave_infrastructure::{
    build_backend, create_session_dir, describe_sources, load_config, merge_presets, FileConfig,
    FileModelConfig, HostCommand, JsonlMirror, JsonlTranscriptStore, PollingCursor,
};
use conclave_presentation::{print_banner, ConsoleDisplay};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt;

/// Local wall-clock timestamps, shared by the console and file layers
/// so their lines match up.
struct WallClock;

impl tracing_subscriber::fmt::time::FormatTime for WallClock {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Verbosity notches: each `-v` moves one step up.
const LOG_LEVELS: [&str; 4] = ["warn", "info", "debug", "trace"];

fn log_level(notch: u8) -> EnvFilter {
    EnvFilter::new(LOG_LEVELS[usize::from(notch).min(LOG_LEVELS.len() - 1)])
}

/// Open this run's log file, creating the directory when needed.
///
/// The directory falls back from `--log-dir` to the platform data dir
/// and finally to `.conclave/logs` in the working directory. The file
/// name carries the start time and pid so concurrent councils never
/// collide.
fn open_log_file(
    dir_override: Option<&Path>,
) -> std::io::Result<(NonBlocking, WorkerGuard, PathBuf)> {
    let dir = dir_override
        .map(Path::to_path_buf)
        .or_else(|| dirs::data_dir().map(|d| d.join("conclave").join("logs")))
        .unwrap_or_else(|| PathBuf::from(".conclave/logs"));
    std::fs::create_dir_all(&dir)?;
    let name = format!(
        "run-{}.{}.log",
        chrono::Local::now().format("%Y%m%d-%H%M%S"),
        std::process::id()
    );
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, &name));
    Ok((writer, guard, dir.join(name)))
}

/// Wire up tracing: stderr at the `-v` level, plus a debug-or-better
/// file log unless `--no-log-file` was given.
///
/// Stderr keeps log lines out of the host front-end's stdout stream. A
/// failed file setup degrades to console-only logging. The returned
/// guard must live as long as the process so the file writer flushes.
fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let console = fmt::layer()
        .with_timer(WallClock)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(log_level(cli.verbose));

    let mut guard = None;
    let mut log_path = None;
    let file = if cli.no_log_file {
        None
    } else {
        match open_log_file(cli.log_dir.as_deref()) {
            Ok((writer, file_guard, path)) => {
                guard = Some(file_guard);
                log_path = Some(path);
                Some(
                    fmt::layer()
                        .with_timer(WallClock)
                        .with_ansi(false)
                        .with_target(true)
                        .with_thread_names(true)
                        .with_writer(writer)
                        .with_filter(log_level(cli.verbose.max(2))),
                )
            }
            Err(e) => {
                eprintln!("conclave: file logging disabled: {}", e);
                None
            }
        }
    };

    tracing_subscriber::registry().with(console).with(file).init();
    if let Some(path) = log_path {
        info!("logging to {}", path.display());
    }
    guard
}

#[derive(Parser)]
#[command(
    name = "conclave",
    version,
    about = "Multi-model AI council: several LLMs share one discussion"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the config file (default: conclave.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory for operation logs
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Disable file logging
    #[arg(long, global = true)]
    no_log_file: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Start a council discussion
    Discuss(DiscussArgs),
    /// Manage the model catalog
    Models {
        #[command(subcommand)]
        command: ModelsCommand,
    },
    /// Print config file locations and exit
    ShowConfig,
}

#[derive(Args)]
struct DiscussArgs {
    /// Comma-separated model ids to seat (e.g. claude-sonnet,gpt-5)
    #[arg(short, long, value_delimiter = ',')]
    models: Vec<String>,

    /// Seat every enabled model from the catalog
    #[arg(short, long)]
    all: bool,

    /// Resume the previous discussion (reuses the `live` session)
    #[arg(short = 'c', long = "continue")]
    resume: bool,

    /// Override the session root directory
    #[arg(long)]
    session_dir: Option<PathBuf>,

    /// Override the host command
    #[arg(long)]
    host: Option<String>,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List configured and preset models
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Command::ShowConfig) {
        println!("Configuration sources (lowest priority first):");
        print!("{}", describe_sources(cli.config.as_deref()));
        return Ok(());
    }

    let _guard = init_logging(&cli);

    // Load configuration, merge the preset catalog, expand env references.
    // A broken --config path is fatal; broken ambient files only warn.
    let mut config: FileConfig = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => bail!("failed to load configuration: {}", e),
        Err(e) => {
            eprintln!("Warning: could not load configuration: {}", e);
            FileConfig::default()
        }
    };
    merge_presets(&mut config);
    config.expand();

    match cli.command {
        Command::Discuss(args) => run_discuss(args, config).await,
        Command::Models { command } => {
            match command {
                ModelsCommand::List => print_model_list(&config),
            }
            Ok(())
        }
        Command::ShowConfig => unreachable!("handled above"),
    }
}

/// Pick the catalog entries joining this council.
fn select_models(args: &DiscussArgs, config: &FileConfig) -> Result<Vec<FileModelConfig>> {
    if !args.models.is_empty() {
        return args
            .models
            .iter()
            .map(|id| {
                config
                    .model_by_id(id)
                    .cloned()
                    .ok_or_else(|| anyhow!("unknown model id: {}", id))
            })
            .collect();
    }
    if args.all {
        return Ok(config.enabled_models());
    }
    bail!("no models selected; pass --models <id,...> or --all");
}

async fn run_discuss(args: DiscussArgs, config: FileConfig) -> Result<()> {
    let selected = select_models(&args, &config)?;
    if selected.is_empty() {
        bail!("no models selected; enable some in the config or pass --models");
    }

    let participants: Vec<ParticipantConfig> = selected
        .iter()
        .map(|entry| {
            FileConfig::to_participant(entry)
                .with_context(|| format!("model {} is misconfigured", entry.id))
        })
        .collect::<Result<_>>()?;

    // Session directory
    let session_root = args
        .session_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.system.session_dir));
    let session =
        create_session_dir(&session_root, args.resume).context("failed to create session directory")?;

    // Transcript store and its single writer
    let store = Arc::new(
        JsonlTranscriptStore::open(session.transcript_path())
            .context("failed to open transcript")?,
    );
    let (broadcaster, submissions) = Broadcaster::new(
        store.clone(),
        BroadcasterConfig {
            capacity: config.defaults.channel_capacity,
            overflow: config.overflow_policy(),
            drain_deadline: Duration::from_millis(config.defaults.drain_deadline_ms),
        },
    );

    let cancel = CancellationToken::new();
    let poll_interval = Duration::from_millis(config.system.poll_interval_ms);
    let reactor_config = ReactorConfig {
        reply_timeout: Duration::from_secs(config.defaults.reply_timeout_secs),
        announce_failures: config.defaults.announce_failures,
    };

    // One reactor per participant, each with its own cursor and mirror
    let mut reactors = Vec::with_capacity(participants.len());
    for participant in &participants {
        let backend = build_backend(participant)
            .with_context(|| format!("participant {} has no usable backend", participant.id))?;
        let tail = Box::new(
            PollingCursor::new(session.transcript_path(), cancel.clone())
                .with_interval(poll_interval),
        );
        let mirror: Arc<dyn MirrorWriter> =
            match JsonlMirror::open(session.mirror_path(participant.id.as_str())) {
                Some(mirror) => Arc::new(mirror),
                None => Arc::new(NoMirror),
            };
        reactors.push(ParticipantReactor::new(
            participant.id.clone(),
            backend,
            tail,
            store.clone(),
            mirror,
            submissions.clone(),
            reactor_config.clone(),
        ));
    }
    // The broadcaster must stop once the reactors do
    drop(submissions);

    // Host front-end and its mirror of the others' replies
    let host_command = args.host.clone().unwrap_or_else(|| config.host.command.clone());
    let host = Box::new(HostCommand::new(
        host_command.clone(),
        config.host.args.clone(),
        session.root(),
    ));
    let host_mirror = HostMirror::new(
        config.host.id.clone(),
        Box::new(
            PollingCursor::new(session.transcript_path(), cancel.clone())
                .with_interval(poll_interval),
        ),
        Arc::new(ConsoleDisplay),
    );
    // Created eagerly so the session layout is complete even though the
    // host appends its turns to the transcript natively
    let _host_log = JsonlMirror::open(session.mirror_path(&config.host.id));

    print_banner(session.root(), &host_command, &participants);

    let orchestrator = Orchestrator::new(
        session.root().to_path_buf(),
        broadcaster,
        reactors,
        host_mirror,
        host,
    );
    let council = orchestrator.handle();

    // Interrupt/terminate cancels the whole session
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        eprintln!("\nInterrupted. Shutting down gracefully...");
        shutdown.cancel();
    });

    let code = orchestrator.run(cancel).await?;

    for (id, state) in council.snapshot().participants {
        debug!(participant = %id, state = ?state, "final reactor state");
    }
    if code != 0 {
        warn!(code, "host exited with non-zero status");
        std::process::exit(code);
    }
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or, on unix, SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                eprintln!("Failed to listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    eprintln!("Failed to listen for Ctrl+C signal: {}", e);
                }
            }
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("Failed to listen for Ctrl+C signal: {}", e);
        }
    }
}

fn print_model_list(config: &FileConfig) {
    println!("Model catalog:");
    println!();
    for model in &config.models {
        let marker = if model.enabled { '*' } else { ' ' };
        let tag = if model.model.is_empty() {
            model.id.clone()
        } else {
            model.model.clone()
        };
        println!(
            "  [{}] {:<16} {:<20} {:<10} {}",
            marker, model.id, model.name, model.provider, tag
        );
    }
    println!();
    println!("* enabled");
}
