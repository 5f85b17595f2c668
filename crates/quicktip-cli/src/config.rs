// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use quicktip_app::DEFAULT_CURRENCY_SYMBOL;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::UtcOffset;
use time::macros::format_description;
use tracing::level_filters::LevelFilter;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub currency_symbol: Option<String>,
    /// Offset used to split history into days, e.g. `+02:00`.
    pub utc_offset: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            currency_symbol: Some(DEFAULT_CURRENCY_SYMBOL.to_owned()),
            utc_offset: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("QUICKTIP_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!(
                "cannot resolve config directory; set QUICKTIP_CONFIG_PATH to the config file"
            )
        })?;

        let app_dir = config_root.join(quicktip_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` at the top and keep values under [storage], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            quicktip_db::validate_db_path(db_path)?;
        }

        if let Some(symbol) = &self.ui.currency_symbol
            && symbol.trim().is_empty()
        {
            bail!(
                "ui.currency_symbol in {} must not be empty; remove it to use {DEFAULT_CURRENCY_SYMBOL:?}",
                path.display()
            );
        }

        if let Some(offset) = &self.ui.utc_offset {
            parse_utc_offset(offset)
                .with_context(|| format!("invalid ui.utc_offset in {}", path.display()))?;
        }

        if let Some(level) = &self.log.level {
            parse_log_level(level)
                .with_context(|| format!("invalid log.level in {}", path.display()))?;
        }

        if let Some(file) = &self.log.file
            && file.trim().is_empty()
        {
            bail!(
                "log.file in {} must not be empty; remove it to log next to the database",
                path.display()
            );
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => quicktip_db::default_db_path(),
        }
    }

    pub fn currency_symbol(&self) -> &str {
        self.ui
            .currency_symbol
            .as_deref()
            .unwrap_or(DEFAULT_CURRENCY_SYMBOL)
    }

    /// Configured offset, else the local offset, else UTC.
    pub fn utc_offset(&self) -> Result<UtcOffset> {
        match &self.ui.utc_offset {
            Some(raw) => parse_utc_offset(raw),
            None => Ok(UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// The log file sits next to an on-disk database; in-memory databases
    /// log to the platform data dir.
    pub fn log_path(&self, db_path: &Path) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        if db_path == Path::new(":memory:") {
            return quicktip_db::default_log_path();
        }
        Ok(db_path.with_extension("log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# quicktip config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/quicktip/quicktip.db)\n# db_path = \"/absolute/path/to/quicktip.db\"\n\n[ui]\ncurrency_symbol = \"{}\"\n# Optional. Days in history are split at midnight in this offset; default is the local offset.\n# utc_offset = \"+02:00\"\n\n[log]\n# One of: off, error, warn, info, debug, trace. QUICKTIP_LOG overrides it.\nlevel = \"{}\"\n# Optional. Default is next to the database file.\n# file = \"/absolute/path/to/quicktip.log\"\n",
            path.display(),
            DEFAULT_CURRENCY_SYMBOL,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_utc_offset(raw: &str) -> Result<UtcOffset> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(
        trimmed,
        &format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .map_err(|_| anyhow!("invalid offset {raw:?}; use +HH:MM or -HH:MM (for example +02:00) or UTC"))
}

fn parse_log_level(raw: &str) -> Result<LevelFilter> {
    raw.trim().parse::<LevelFilter>().map_err(|_| {
        anyhow!("unknown log level {raw:?}; use one of: off, error, warn, info, debug, trace")
    })
}
