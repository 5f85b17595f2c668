// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use quicktip_app::AppState;
use quicktip_db::Store;
use quicktip_tui::UiSettings;
use runtime::DbRuntime;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::info;

/// Tip calculator that keeps a day-by-day history of recorded tips.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "quicktip", version)]
struct Cli {
    /// Use a specific config path
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,

    /// Print resolved config path
    #[arg(long)]
    print_config_path: bool,

    /// Print resolved database path
    #[arg(long = "print-path")]
    print_db_path: bool,

    /// Print a v1 config template
    #[arg(long = "print-example-config")]
    print_example: bool,

    /// Launch with seeded demo data (in-memory)
    #[arg(long)]
    demo: bool,

    /// Validate config and database, then exit
    #[arg(long = "check")]
    check_only: bool,
}

fn main() {
    if let Err(error) = run(Cli::parse()) {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if cli.print_config_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if cli.print_example {
        print!("{}", Config::example_config(&config_path));
        return Ok(());
    }

    let config = Config::load(&config_path).with_context(|| {
        format!(
            "load config {}; run `quicktip --print-example-config` to generate a v1 template",
            config_path.display()
        )
    })?;

    let db_path = if cli.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if cli.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    // Resolve the local offset before anything can spawn threads.
    let settings = UiSettings {
        currency_symbol: config.currency_symbol().to_owned(),
        utc_offset: config.utc_offset()?,
    };

    logging::init_logging(config.log_level(), &config.log_path(&db_path)?)?;
    info!(
        config = %config_path.display(),
        db = %db_path.display(),
        demo = cli.demo,
        "starting quicktip"
    );

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or QUICKTIP_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    if cli.demo {
        let seeded = store.seed_demo_data(OffsetDateTime::now_utc())?;
        info!(seeded, "seeded demo tips");
    }

    if cli.check_only {
        info!(tips = store.count()?, "check passed");
        return Ok(());
    }

    let mut state = AppState::default();
    let mut runtime = DbRuntime::new(&store);
    let result = quicktip_tui::run_app(&mut state, &mut runtime, settings);
    if let Err(error) = &result {
        tracing::error!("ui exited with error: {error:#}");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::{Cli, run};
    use anyhow::Result;
    use clap::{CommandFactory, Parser};
    use quicktip_app::NewTipRecord;
    use quicktip_db::Store;
    use quicktip_testkit::fixture_datetime;
    use std::path::PathBuf;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_defaults_to_no_flags() -> Result<()> {
        let cli = Cli::try_parse_from(["quicktip"])?;
        assert_eq!(
            cli,
            Cli {
                config_path: None,
                print_config_path: false,
                print_db_path: false,
                print_example: false,
                demo: false,
                check_only: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_sets_config_path_override() -> Result<()> {
        let cli = Cli::try_parse_from(["quicktip", "--config", "/custom/config.toml"])?;
        assert_eq!(cli.config_path, Some(PathBuf::from("/custom/config.toml")));
        Ok(())
    }

    #[test]
    fn parse_errors_for_missing_config_value() {
        let error = Cli::try_parse_from(["quicktip", "--config"])
            .expect_err("missing config value should fail");
        assert_eq!(
            error.kind(),
            clap::error::ErrorKind::InvalidValue,
            "unexpected error: {error}"
        );
    }

    #[test]
    fn parse_errors_for_unknown_argument() {
        let error =
            Cli::try_parse_from(["quicktip", "--wat"]).expect_err("unknown arg should fail");
        assert_eq!(error.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn parse_sets_print_demo_and_check_flags() -> Result<()> {
        let cli = Cli::try_parse_from([
            "quicktip",
            "--print-config-path",
            "--print-example-config",
            "--print-path",
            "--demo",
            "--check",
        ])?;
        assert!(cli.print_config_path);
        assert!(cli.print_example);
        assert!(cli.print_db_path);
        assert!(cli.demo);
        assert!(cli.check_only);
        Ok(())
    }

    #[test]
    fn help_is_reported_as_display_help() {
        let error = Cli::try_parse_from(["quicktip", "--help"]).expect_err("help exits early");
        assert_eq!(error.kind(), clap::error::ErrorKind::DisplayHelp);
        assert!(error.to_string().contains("--print-example-config"));
    }

    #[test]
    fn check_validates_config_and_existing_database() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let db_path = temp.path().join("tips.db");
        {
            let store = Store::open(&db_path)?;
            store.bootstrap()?;
            store.append(&NewTipRecord::new(20.0, 15, fixture_datetime()))?;
        }
        let config_path = temp.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!(
                "version = 1\n[storage]\ndb_path = {:?}\n[log]\nlevel = \"warn\"\nfile = {:?}\n",
                db_path.display().to_string(),
                temp.path().join("check.log").display().to_string(),
            ),
        )?;

        let config_arg = config_path.display().to_string();
        run(Cli::try_parse_from([
            "quicktip",
            "--config",
            config_arg.as_str(),
            "--check",
        ])?)?;
        assert_eq!(Store::open(&db_path)?.count()?, 1);
        assert!(temp.path().join("check.log").exists());
        Ok(())
    }

    #[test]
    fn check_rejects_invalid_config() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config_path = temp.path().join("config.toml");
        std::fs::write(&config_path, "version = 1\n[ui]\nutc_offset = \"later\"\n")?;

        let config_arg = config_path.display().to_string();
        let error = run(Cli::try_parse_from([
            "quicktip",
            "--config",
            config_arg.as_str(),
            "--check",
        ])?)
        .expect_err("invalid config should fail");
        let message = format!("{error:#}");
        assert!(message.contains("--print-example-config"));
        assert!(message.contains("utc_offset"));
        Ok(())
    }
}
