///! index-reaper
///!
///! Deletes time-expired log indices from an Elasticsearch cluster

mod config;
mod output;
mod reap;

use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const AFTER_HELP: &str = "\
Examples:
    index-reaper            # Delete indices older than 30 days
    index-reaper -d 60      # Delete indices older than 60 days
    index-reaper --days 60  # Same as above

Note: Minimum retention period is 7 days for safety.";

#[derive(Parser, Debug)]
#[command(name = "index-reaper", author, version)]
#[command(about = "Delete Elasticsearch indices older than specified retention period.")]
#[command(after_help = AFTER_HELP)]
struct Cli {
    /// Number of days to retain indices [default: 30, minimum: 7]
    #[arg(short, long, allow_negative_numbers = true)]
    days: Option<i64>,

    /// Cluster address, e.g. https://localhost:9200
    #[arg(long, env = "ELASTIC_HOST")]
    host: Option<String>,

    /// Basic auth username
    #[arg(short, long = "user", env = "ELASTIC_USER")]
    user: Option<String>,

    /// Basic auth password
    #[arg(long, env = "ELASTIC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Prefix of the indices subject to retention
    #[arg(long, env = "REAPER_INDEX_PREFIX")]
    prefix: Option<String>,

    /// Accept invalid TLS certificates (`--insecure=false` overrides the config file)
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    insecure: Option<bool>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Config file [default: ~/.config/index-reaper/config.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Summary format (table, json, yaml)
    #[arg(short, long)]
    output: Option<String>,

    /// Exit with status 1 if any deletion failed
    #[arg(long)]
    fail_on_error: bool,
}

impl From<&Cli> for config::Overrides {
    fn from(cli: &Cli) -> Self {
        Self {
            days: cli.days,
            host: cli.host.clone(),
            username: cli.user.clone(),
            password: cli.password.clone(),
            prefix: cli.prefix.clone(),
            timeout_secs: cli.timeout,
            insecure: cli.insecure,
            output: cli.output.clone(),
            fail_on_error: cli.fail_on_error,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the summary
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let config = config::Config::load(cli.config.as_deref())?;
    let settings = config.resolve(config::Overrides::from(&cli))?;

    let today = chrono::Local::now().date_naive();

    let mut stdout = io::stdout();
    let mut stderr = io::stderr();

    let report = tokio::select! {
        result = reap::handle_reap_command(&settings, today, &mut stdout, &mut stderr) => result?,
        _ = tokio::signal::ctrl_c() => {
            anyhow::bail!("Interrupted; deletions already issued were not rolled back");
        }
    };

    let status = reap::exit_status(&settings, &report);
    if status != 0 {
        output::print_error(&format!(
            "{} index deletion(s) failed",
            report.summary().failed
        ));
        std::process::exit(status);
    }

    Ok(())
}
