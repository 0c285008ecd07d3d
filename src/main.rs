use clap::{ArgAction, Parser as ClapParser, Subcommand, ValueEnum};
use fdb_query::EvalConfig;
use fdb_query::ast::literals::parse_offset;
use fdb_query::cli::{self, CheckOptions, CheckResult, CliError, OutputFormat};
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "fdbq")]
#[command(about = "fdbq - Query a file index: filter, sort, and project files by name, size, and time")]
#[command(version)]
struct Cli {
    /// More logging (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query against an index
    Query {
        /// The query to execute
        query: String,

        /// Index JSON file (reads from stdin if not provided)
        #[arg(short, long, env = "FDBQ_INDEX")]
        index: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,

        /// Print the merged query plan instead of running it
        #[arg(long)]
        explain: bool,

        /// Days covered by the `recent` flag
        #[arg(long, default_value_t = 7)]
        recent_days: i64,

        /// Baseline for percentages, as COLUMN=VALUE (repeatable)
        #[arg(long = "baseline", value_name = "COLUMN=VALUE")]
        baselines: Vec<String>,

        /// Match patterns case-insensitively
        #[arg(long)]
        ignore_case: bool,

        /// UTC offset for dates written without one, e.g. +02:00
        #[arg(long, allow_hyphen_values = true)]
        timezone: Option<String>,
    },

    /// Show query language help
    HelpQuery {
        /// Topic name (omit to list topics)
        topic: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Query {
            query,
            index,
            format,
            pretty,
            explain,
            recent_days,
            baselines,
            ignore_case,
            timezone,
        } => build_config(recent_days, &baselines, ignore_case, timezone.as_deref()).and_then(
            |config| {
                let format = match format {
                    Format::Json => OutputFormat::Json,
                    Format::Table => OutputFormat::Table,
                };
                run_query(query, index, format, pretty, explain, config)
            },
        ),
        Commands::HelpQuery { topic: None } => {
            print!("{}", cli::get_help_overview());
            Ok(())
        }
        Commands::HelpQuery { topic: Some(topic) } => match cli::get_help_topic(&topic) {
            Ok(content) => {
                print!("{}", content);
                Ok(())
            }
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn build_config(
    recent_days: i64,
    baselines: &[String],
    ignore_case: bool,
    timezone: Option<&str>,
) -> Result<EvalConfig, CliError> {
    let mut config = EvalConfig {
        recent_window: chrono::Duration::try_days(recent_days).ok_or_else(|| {
            CliError::BadArgument(format!("--recent-days {} is out of range", recent_days))
        })?,
        case_insensitive: ignore_case,
        ..EvalConfig::default()
    };

    for arg in baselines {
        let (column, value) = cli::parse_baseline(arg)?;
        config.baselines.insert(column, value);
    }

    if let Some(zone) = timezone {
        config.timezone = match zone {
            "Z" | "UTC" | "utc" => config.timezone,
            _ => parse_offset(zone).ok_or_else(|| {
                CliError::BadArgument(format!("timezone '{}' is not ±HH:MM", zone))
            })?,
        };
    }

    Ok(config)
}

fn run_query(
    query: String,
    index: Option<PathBuf>,
    format: OutputFormat,
    pretty: bool,
    explain: bool,
    config: EvalConfig,
) -> Result<(), CliError> {
    let index = match index {
        Some(path) => {
            log::debug!("reading index from {}", path.display());
            Some(std::fs::read_to_string(&path)?)
        }
        None if !explain && !atty::is(atty::Stream::Stdin) => {
            log::debug!("reading index from stdin");
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Some(buffer)
        }
        None => None,
    };

    let options = CheckOptions {
        query,
        index,
        format,
        pretty,
        explain,
        config,
    };

    match cli::execute_check(&options)? {
        CheckResult::Explained(plan) => println!("{}", plan),
        CheckResult::Success(output) => {
            if output.ends_with('\n') {
                print!("{}", output);
            } else {
                println!("{}", output);
            }
        }
    }
    Ok(())
}
