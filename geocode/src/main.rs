//! Geocode CLI Application
//!
//! A command-line interface for batch address geocoding using the Google
//! Geocoding API. This CLI application provides a user-friendly interface
//! to the geocode-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use geocode_lib::{
    default_output_path, load_env_config, parse_timeout_string, save_records, ConfigManager,
    FileConfig, GeocodeConfig, Geocoder, OutputFormat, ZeroResultsPolicy,
};
use std::path::Path;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for geocode
#[derive(Parser, Debug)]
#[command(name = "geocode")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch-geocode addresses via the Google Geocoding API")]
#[command(
    long_about = "Batch-geocode a file of addresses via the Google Geocoding API.\n\nAddresses are processed by a bounded worker pool capped to the upstream's per-second quota; results are written to a JSON or CSV file in input order."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Google API key used for every request
    #[arg(value_name = "API_KEY", help_heading = "Input")]
    pub api_key: String,

    /// Input file with one address per line
    #[arg(value_name = "FILE", help_heading = "Input")]
    pub input_file: String,

    /// Output format: "json" or "csv"
    #[arg(value_name = "FORMAT", value_parser = parse_output_format, help_heading = "Output")]
    pub format: OutputFormat,

    /// Restrict results to a country (ISO 3166-1 alpha-2 code)
    #[arg(long = "country", value_name = "CODE", help_heading = "Request")]
    pub country: Option<String>,

    /// Language for localized result fields
    #[arg(long = "lang", value_name = "CODE", help_heading = "Request")]
    pub language: Option<String>,

    /// Max concurrent lookups (default: available CPUs, max: 100)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Max lookups started per second (default: 50)
    #[arg(
        short = 'r',
        long = "rate-limit",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub rate_limit: Option<usize>,

    /// Output file path (default: results.json / results.csv)
    #[arg(short = 'o', long = "output", value_name = "FILE", help_heading = "Output")]
    pub output: Option<String>,

    /// Record zero-result responses as per-address errors
    #[arg(long = "strict-zero-results", help_heading = "Request")]
    pub strict_zero_results: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,

    /// Suppress everything except errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose", help_heading = "Configuration")]
    pub quiet: bool,
}

/// Parse the output format positional, rejecting anything but json/csv.
fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    s.parse()
}

/// Resolved settings for one run: geocoding config plus the output path.
#[derive(Debug, Clone)]
struct RunSettings {
    config: GeocodeConfig,
    output_path: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the tracing subscriber.
///
/// RUST_LOG always wins; otherwise --verbose lowers the filter to debug and
/// --quiet raises it to error. Events go to stderr so stdout stays clean.
fn init_logging(args: &Args) {
    let default_filter = if args.quiet {
        "geocode=error,geocode_lib=error"
    } else if args.verbose {
        "geocode=debug,geocode_lib=debug"
    } else {
        "geocode=info,geocode_lib=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main batch geocoding logic
async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = build_settings(&args)?;

    let addresses = read_addresses(&args.input_file)?;
    if addresses.is_empty() {
        return Err(format!("no addresses found in '{}'", args.input_file).into());
    }
    tracing::debug!(
        "loaded {} addresses from {} (output: {})",
        addresses.len(),
        args.input_file,
        settings.output_path
    );

    if !args.quiet {
        ui::print_header(
            addresses.len(),
            settings.config.concurrency,
            settings.config.max_calls_per_second,
        );
    }

    let geocoder = Geocoder::with_config(&args.api_key, settings.config.clone());

    // Spinner::start returns None if stderr isn't a TTY.
    let spinner = if args.quiet {
        None
    } else {
        ui::Spinner::start(format!("Geocoding {} addresses...", addresses.len()))
    };

    let start_time = std::time::Instant::now();
    let result = geocoder.geocode_addresses(&addresses).await;
    let duration = start_time.elapsed();

    if let Some(s) = spinner {
        s.stop().await;
    }

    let records = result?;

    save_records(&records, args.format, Path::new(&settings.output_path))?;

    if !args.quiet {
        ui::print_summary(&records, &settings.output_path, duration);
    }

    Ok(())
}

/// Build run settings from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (GEOCODE_*)
/// 3. Local config file (./geocode.toml, ./.geocode.toml)
/// 4. Global config file (~/.geocode.toml)
/// 5. XDG config file (~/.config/geocode/config.toml)
/// 6. Built-in defaults
fn build_settings(args: &Args) -> Result<RunSettings, Box<dyn std::error::Error>> {
    let mut config = GeocodeConfig::default();
    let mut output_path: Option<String> = None;

    let config_manager = ConfigManager::new(args.verbose);

    // Step 1: Determine config file path and load config files
    if let Some(explicit_config_path) = &args.config {
        if args.verbose {
            println!("Using explicit config file (CLI --config): {}", explicit_config_path);
        }

        let file_config = config_manager.load_file(explicit_config_path).map_err(|e| {
            format!("Failed to load config file '{}': {}", explicit_config_path, e)
        })?;

        apply_file_config(&mut config, &mut output_path, file_config);
    } else if let Ok(env_config_path) = std::env::var("GEOCODE_CONFIG") {
        if args.verbose {
            println!(
                "Using explicit config file (GEOCODE_CONFIG env var): {}",
                env_config_path
            );
        }

        let file_config = config_manager
            .load_file(&env_config_path)
            .map_err(|e| format!("Failed to load config file '{}': {}", env_config_path, e))?;

        apply_file_config(&mut config, &mut output_path, file_config);
    } else {
        if args.verbose {
            println!("Discovering config files...");
        }

        match config_manager.discover_and_load() {
            Ok(file_config) => {
                apply_file_config(&mut config, &mut output_path, file_config);
            }
            Err(e) if args.verbose => {
                eprintln!("Config discovery warning: {}", e);
            }
            Err(_) => {
                // Silently continue with defaults if no config files found
            }
        }
    }

    // Step 2: Apply environment variables (GEOCODE_*)
    let env_config = load_env_config(args.verbose);
    if let Some(concurrency) = env_config.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(rate_limit) = env_config.rate_limit {
        config.max_calls_per_second = rate_limit;
    }
    if let Some(timeout_str) = &env_config.timeout {
        if let Some(timeout_secs) = parse_timeout_string(timeout_str) {
            config.timeout = Duration::from_secs(timeout_secs);
        }
    }
    if let Some(country) = env_config.country {
        config.country = Some(country);
    }
    if let Some(language) = env_config.language {
        config.language = Some(language);
    }
    if let Some(output) = env_config.output {
        output_path = Some(output);
    }
    if let Some(strict) = env_config.strict_zero_results {
        config.zero_results = if strict {
            ZeroResultsPolicy::Error
        } else {
            ZeroResultsPolicy::Accept
        };
    }

    // Step 3: Apply CLI arguments (highest precedence). Option-typed args
    // make "not passed" unambiguous, so defaults never clobber env/config.
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".into());
        }
        config.concurrency = concurrency;
    }
    if let Some(rate_limit) = args.rate_limit {
        if rate_limit == 0 {
            return Err("Rate limit must be at least 1 call per second".into());
        }
        config.max_calls_per_second = rate_limit;
    }
    if let Some(country) = &args.country {
        config.country = Some(country.clone());
    }
    if let Some(language) = &args.language {
        config.language = Some(language.clone());
    }
    if args.strict_zero_results {
        config.zero_results = ZeroResultsPolicy::Error;
    }
    if let Some(output) = &args.output {
        output_path = Some(output.clone());
    }

    let output_path =
        output_path.unwrap_or_else(|| default_output_path(args.format).to_string());

    Ok(RunSettings {
        config,
        output_path,
    })
}

/// Fold a loaded config file into the run configuration.
fn apply_file_config(
    config: &mut GeocodeConfig,
    output_path: &mut Option<String>,
    file_config: FileConfig,
) {
    if let Some(defaults) = file_config.defaults {
        if let Some(concurrency) = defaults.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(rate_limit) = defaults.rate_limit {
            config.max_calls_per_second = rate_limit;
        }
        if let Some(timeout_str) = defaults.timeout {
            if let Some(timeout_secs) = parse_timeout_string(&timeout_str) {
                config.timeout = Duration::from_secs(timeout_secs);
            }
        }
        if let Some(country) = defaults.country {
            config.country = Some(country);
        }
        if let Some(language) = defaults.language {
            config.language = Some(language);
        }
        if let Some(strict) = defaults.strict_zero_results {
            config.zero_results = if strict {
                ZeroResultsPolicy::Error
            } else {
                ZeroResultsPolicy::Accept
            };
        }
    }

    if let Some(output) = file_config.output {
        if let Some(path) = output.path {
            *output_path = Some(path);
        }
    }
}

/// Read addresses from a newline-delimited file.
///
/// Lines are trimmed and blank lines skipped. '#' is NOT a comment marker:
/// street addresses legitimately contain it ("#12 Main St").
fn read_addresses(file_path: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {}", file_path).into());
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut addresses = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        addresses.push(trimmed.to_string());
    }

    Ok(addresses)
}
