//! Process-level logging and environment setup for the binary.

use crate::config::Error;

/// Installs the `tracing` subscriber.
///
/// Filter comes from `RUST_LOG`, else `info` (`debug` for the crates of this workspace when
/// `verbose`). Logs go to stderr so stdout carries only the run summary. When `LOG_FILE` is
/// set, a plain-text copy is appended to that file.
pub fn init_tracing(verbose: bool) -> Result<(), Error> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let default_filter = if verbose {
        "info,stagegraph=debug,stagegraph_cli=debug"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter.clone());

    let registry = tracing_subscriber::registry().with(stderr_layer);

    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .with_filter(filter);
        registry.with(file_layer).try_init()?;
        tracing::info!(path = %path, "logging to file");
    } else {
        registry.try_init()?;
    }
    Ok(())
}

/// Loads `.env` from the working directory, falling back to its parent.
pub fn load_dotenv() {
    if dotenv::dotenv().is_ok() {
        return;
    }
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(parent) = cwd.parent() {
            let env_path = parent.join(".env");
            if env_path.is_file() {
                let _ = dotenv::from_path(env_path);
            }
        }
    }
}
