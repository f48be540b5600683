//! `orrery`: interactive solar-system viewer.
//!
//! Configuration is read from `config.ron` in the platform config directory
//! (or `--config <dir>`), then overridden by command-line flags.

use clap::Parser;
use orrery_app::{AppError, PlatformDirs, report};
use orrery_config::{CliArgs, Config};

fn main() {
    if let Err(e) = start() {
        // Logging may not be up yet.
        eprintln!("orrery: {}", report(&e));
        tracing::error!("{}", report(&e));
        std::process::exit(1);
    }
}

fn start() -> Result<(), AppError> {
    let args = CliArgs::parse();

    let dirs = PlatformDirs::resolve(args.config.as_deref())?;
    dirs.create_dirs()?;

    let mut config = Config::load_or_create(&dirs.config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    orrery_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    tracing::info!(
        "Orrery {} (config {}, data {}, cache {})",
        env!("CARGO_PKG_VERSION"),
        dirs.config_dir.display(),
        dirs.data_dir.display(),
        dirs.cache_dir.display()
    );

    orrery_app::run(config, dirs)
}
