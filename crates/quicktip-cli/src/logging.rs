// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "QUICKTIP_LOG";

/// Installs the global subscriber, appending plain-text records to `path`.
/// The terminal belongs to the TUI, so nothing is written to stdout or
/// stderr. `QUICKTIP_LOG` takes precedence over `level`.
pub fn init_logging(level: &str, path: &Path) -> Result<()> {
    let subscriber = file_subscriber(level, path)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

fn file_subscriber(level: &str, path: &Path) -> Result<impl Subscriber + Send + Sync + 'static> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].file to a writable path",
                path.display()
            )
        })?;

    let filter = log_filter(env::var(LOG_ENV).ok().as_deref(), level)?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .finish())
}

fn log_filter(env_directives: Option<&str>, level: &str) -> Result<EnvFilter> {
    if let Some(directives) = env_directives.filter(|value| !value.trim().is_empty()) {
        return EnvFilter::try_new(directives)
            .with_context(|| format!("invalid {LOG_ENV} value {directives:?}"));
    }
    EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))
}
