//! Structured logging for the orrery.
//!
//! Console output with uptime timestamps and targets, plus a JSON log file in
//! debug builds. `log` records from the library crates are forwarded into the
//! same subscriber.

use std::path::{Path, PathBuf};

use orrery_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directives used when neither `RUST_LOG` nor the config sets a level.
pub const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn";

/// File name of the JSON log written in debug builds.
pub const LOG_FILE_NAME: &str = "orrery.log";

/// Install the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - enables the file layer
/// * `config` - supplies `debug.log_level` when `RUST_LOG` is unset
///
/// ```no_run
/// use orrery_log::init_logging;
///
/// init_logging(Some(std::path::Path::new("./logs")), true, None);
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_path) = log_file_path(log_dir)
        && let Some(parent) = log_path.parent()
        && std::fs::create_dir_all(parent).is_ok()
        && let Ok(log_file) = std::fs::File::create(&log_path)
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        tracing::debug!("Writing JSON log to {}", log_path.display());
        return;
    }

    subscriber.init();
}

/// Filter directives for `config`.
///
/// A bare level such as `"debug"` keeps the wgpu/naga noise suppression; a
/// directive list that already mentions those targets is used as-is.
pub fn filter_directives(config: Option<&Config>) -> String {
    let Some(level) = config
        .map(|c| c.debug.log_level.trim())
        .filter(|level| !level.is_empty())
    else {
        return DEFAULT_FILTER.to_string();
    };

    let mut directives = level.to_string();
    for target in ["wgpu", "naga"] {
        if !level.contains(target) {
            directives.push_str(&format!(",{target}=warn"));
        }
    }
    directives
}

/// Where the debug JSON log goes for `log_dir`.
pub fn log_file_path(log_dir: Option<&Path>) -> Option<PathBuf> {
    log_dir.map(|dir| dir.join(LOG_FILE_NAME))
}

/// An `EnvFilter` with [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
