/*============================================================
  Synavera Project: Syn-Syu
  Module: rpmq_core::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for rpmq. Queries installed RPM packages,
    optionally filtered by name, sorted by installed size, and
    capped, printing one line per package.

  Security / Safety Notes:
    Operates within user privileges. Executes rpm in query
    mode only; never mutates the package database.

  Dependencies:
    clap for CLI parsing, chrono for session stamps.

  Operational Scope:
    Invoked directly by operators or scripts auditing which
    installed packages consume the most disk space.

  Revision History:
    2025-11-12 COD  Authored rpmq runtime.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

mod config;
mod database;
mod error;
mod logger;
mod package_info;
mod query;
mod render;
mod rpm;

use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

use config::RpmqConfig;
use database::PackageDatabase;
use error::Result;
use logger::Logger;
use query::{QueryHelper, QueryOptions};
use render::{OutputFormat, RecordWriter};
use rpm::RpmDatabase;

/// Command-line arguments for rpmq.
#[derive(Debug, Parser)]
#[command(
    name = "rpmq",
    version,
    author = "Synavera Systems",
    about = "Report installed RPM packages by size"
)]
struct Cli {
    /// Cap the number of results (default: unlimited).
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    limit: Option<i64>,
    /// Only report packages whose name contains this text.
    #[arg(long, value_name = "NAME")]
    name: Option<String>,
    /// Sort by installed size, smallest first (true/false, yes/no, 1/0).
    #[arg(long, value_name = "BOOL", action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    sort: Option<bool>,
    /// Emit one JSON object per package.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Query the database under an alternate root.
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Query an alternate rpm database directory.
    #[arg(long, value_name = "DIR")]
    dbpath: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

impl Cli {
    /// Merge CLI flags over configured defaults.
    fn query_options(&self, config: &RpmqConfig) -> QueryOptions {
        QueryOptions {
            name: self.name.clone().or_else(|| config.query.name.clone()),
            limit: self.limit.unwrap_or(config.query.limit),
            sorted: self.sort.unwrap_or(config.query.sort),
        }
    }

    fn database(&self, config: &RpmqConfig) -> Result<RpmDatabase> {
        Ok(RpmDatabase::from_command(&config.rpm.command)?
            .with_root(self.root.clone().or_else(|| config.rpm.root.clone()))
            .with_dbpath(self.dbpath.clone().or_else(|| config.rpm.dbpath.clone())))
    }

    fn log_path(&self, config: &RpmqConfig) -> Option<PathBuf> {
        self.log.clone().or_else(|| {
            config.logging.persist.then(|| {
                let session_stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
                config.log_dir().join(format!("rpmq_{session_stamp}.log"))
            })
        })
    }

    fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[rpmq] {}", err);
            err.exit_code()
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = RpmqConfig::load_from_optional_path(cli.config.as_deref())?;
    let options = cli.query_options(&config);
    let database = cli.database(&config)?;

    let logger = Logger::new(cli.log_path(&config), cli.verbose)?;
    logger.info(
        "INIT",
        format!(
            "name={} limit={} sorted={} source={}",
            options.name_filter().unwrap_or("*"),
            options.limit,
            options.sorted,
            database.describe()
        ),
    );

    let result = report(&database, &options, cli.output_format(), &logger);
    if let Err(err) = &result {
        logger.error("FAILED", err.to_string());
    }
    logger.finalize()?;
    result.map(|_| ExitCode::SUCCESS)
}

fn report<D: PackageDatabase>(
    database: &D,
    options: &QueryOptions,
    format: OutputFormat,
    logger: &Logger,
) -> Result<()> {
    let mut helper = QueryHelper::open(database, options)?;
    logger.debug("OPEN", "Package database cursor acquired");
    let mut writer = RecordWriter::new(BufWriter::new(io::stdout().lock()), format);
    for record in helper.records()? {
        writer.write(&record?)?;
    }
    logger.debug(
        "CLOSE",
        format!("Releasing database cursor after {} records", helper.yielded()),
    );
    if helper.skipped() > 0 {
        logger.warn(
            "SKIPPED",
            format!("{} malformed database rows were ignored", helper.skipped()),
        );
    }
    helper.close();

    let summary = writer.finish()?;
    if summary.packages == 0 {
        logger.warn("EMPTY", "No installed packages matched the query");
    }
    logger.info(
        "SUMMARY",
        format!(
            "packages={} total_size={}",
            summary.packages, summary.total_size
        ),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;
    use crate::error::RpmqError;
    use crate::query::MAX_NUMBER_OF_RESULTS;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rpmq").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_come_from_config() {
        let options = parse(&[]).query_options(&RpmqConfig::default());
        assert_eq!(options, QueryOptions::default());
        assert_eq!(options.limit, MAX_NUMBER_OF_RESULTS);
    }

    #[test]
    fn flags_override_config() {
        let mut config = RpmqConfig::default();
        config.query.limit = 50;
        config.query.name = Some("python".into());
        let options = parse(&["--limit", "5", "--name", "sh", "--sort", "false"]).query_options(&config);
        assert_eq!(
            options,
            QueryOptions {
                name: Some("sh".into()),
                limit: 5,
                sorted: false
            }
        );
    }

    #[test]
    fn negative_limit_parses_then_fails_validation() {
        let options = parse(&["--limit", "-3"]).query_options(&RpmqConfig::default());
        assert!(matches!(options.cap(), Err(RpmqError::Config(_))));
    }

    #[test]
    fn sort_requires_a_boolean() {
        assert!(Cli::try_parse_from(["rpmq", "--sort", "maybe"]).is_err());
        assert_eq!(parse(&["--sort", "true"]).sort, Some(true));
    }

    #[test]
    fn sort_accepts_boolish_spellings() {
        for off in ["False", "false", "0", "no", "off", "n"] {
            assert_eq!(parse(&["--sort", off]).sort, Some(false), "--sort {off}");
        }
        for on in ["True", "1", "yes", "on", "y"] {
            assert_eq!(parse(&["--sort", on]).sort, Some(true), "--sort {on}");
        }
    }

    #[test]
    fn database_flags_override_config() {
        let mut config = RpmqConfig::default();
        config.rpm.dbpath = Some(PathBuf::from("/var/lib/rpm"));
        let database = parse(&["--dbpath", "/srv/rpmdb"]).database(&config).unwrap();
        assert!(database.describe().contains("--dbpath /srv/rpmdb"));
    }

    #[test]
    fn session_log_only_when_requested() {
        let mut config = RpmqConfig::default();
        assert_eq!(parse(&[]).log_path(&config), None);
        config.logging.persist = true;
        config.logging.log_dir = Some(PathBuf::from("/var/tmp/rpmq"));
        let path = parse(&[]).log_path(&config).unwrap();
        assert!(path.starts_with("/var/tmp/rpmq"));
        assert_eq!(
            parse(&["--log", "/tmp/x.log"]).log_path(&config),
            Some(PathBuf::from("/tmp/x.log"))
        );
    }
}
