use std::error::Error as _;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use cert_scrape::config::{self, ScanConfig};
use cert_scrape::error::ConfigError;
use cert_scrape::output::Emitter;
use cert_scrape::scanner;
use cert_scrape::targets::InputSource;

/// cert-scrape — pull organization and DNS names from every TLS certificate on a network range.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cert-scrape",
    version,
    about = "Pull organization and DNS names from TLS certificates across IPs and CIDR ranges.",
    override_usage = "cert-scrape [options] -i <IPs/CIDRs or File>",
    long_about = None
)]
struct Cli {
    /// Either IPs & CIDRs separated by commas, or a file with IPs/CIDRs on each line.
    #[arg(short = 'i')]
    input: Option<String>,

    /// TLS ports to check for certificates, comma separated.
    #[arg(short = 'p', default_value = config::DEFAULT_PORTS)]
    ports: String,

    /// How many handshakes run concurrently.
    #[arg(short = 'c', default_value_t = config::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Timeout for connect plus TLS handshake, in seconds.
    #[arg(short = 't', default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Show all output, including a line for every failed target.
    #[arg(short = 'a', default_value_t = false)]
    all_output: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    let config = match ScanConfig::new(
        cli.input,
        &cli.ports,
        cli.concurrency,
        cli.timeout,
        cli.all_output,
    ) {
        Ok(c) => c,
        Err(ConfigError::MissingInput) => {
            println!("No input detected, please use the -i flag to add input!\n");
            println!("{}", Cli::command().render_help());
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Ok(usage_failure(&e)),
    };

    let specs = match InputSource::resolve(&config.input).host_specs() {
        Ok(specs) => specs,
        Err(e) => return Ok(usage_failure(&e)),
    };

    let emitter = Emitter::stdout(config.show_failures);
    let stats = scanner::scan(Arc::new(config), specs, &emitter).await?;
    info!(
        "scanned {} targets: {} certificates, {} failures",
        stats.dispatched, stats.succeeded, stats.failed
    );
    Ok(ExitCode::SUCCESS)
}

fn usage_failure(err: &ConfigError) -> ExitCode {
    let mut msg = err.to_string();
    let mut cause = err.source();
    while let Some(c) = cause {
        msg.push_str(&format!(": {c}"));
        cause = c.source();
    }
    eprintln!("error: {msg}\n");
    eprintln!("{}", Cli::command().render_help());
    ExitCode::FAILURE
}

/// Log to stderr so stdout carries only result lines. `RUST_LOG` picks the level.
fn init_logging() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to install logger: {e}");
    }
}
