use std::path::{Path, PathBuf};

use anyhow::Context as _;
use loam_daemon::{Daemon, DaemonConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        eprintln!(
            "loam-daemon {version}\n\nUsage:\n  loam-daemon [--config <path>]\n",
            version = env!("CARGO_PKG_VERSION")
        );
        return Ok(());
    }

    let config = DaemonConfig::load(parse_config_arg(&args).as_deref());

    let log_path = config
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("loam-daemon.log"));
    rotate_log(&log_path);
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    let baseline = if config.verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_env("LOAM_LOG").unwrap_or_else(|_| EnvFilter::new(baseline));
    let (filter_layer, reload_handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(log_file)),
        )
        .init();

    tracing::info!(
        target = "loam.daemon",
        version = env!("CARGO_PKG_VERSION"),
        log = %log_path.display(),
        "starting"
    );

    let verbose_hook = move |enabled: bool| {
        let directive = if enabled { "debug" } else { baseline };
        if let Err(err) = reload_handle.modify(|filter| *filter = EnvFilter::new(directive)) {
            tracing::warn!(target = "loam.daemon", error = %err, "failed to reload log filter");
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()
        .context("building the runtime")?;
    let flush_interval = config.telemetry_flush_interval();
    runtime
        .block_on(
            Daemon::new(tokio::io::stdin(), tokio::io::stdout())
                .with_flush_interval(flush_interval)
                .with_verbose_hook(verbose_hook)
                .run(),
        )
        .context("daemon loop failed")?;
    Ok(())
}

fn parse_config_arg(args: &[String]) -> Option<PathBuf> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            return iter.next().map(PathBuf::from);
        }
    }
    None
}

/// Rotate the previous run's log out of the way: `current` → `current.old`.
fn rotate_log(path: &Path) {
    if path.exists() {
        let mut old = path.as_os_str().to_owned();
        old.push(".old");
        let _ = std::fs::rename(path, PathBuf::from(old));
    }
}
