//! # Geocode Library
//!
//! A fast, robust library for batch address geocoding against the Google
//! Geocoding API.
//!
//! The library fans a list of free-text addresses through a bounded worker
//! pool, caps upstream calls to a per-second budget, flattens each response
//! into a fixed record, and serializes the ordered batch to JSON or CSV.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geocode_lib::Geocoder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let geocoder = Geocoder::new("my-api-key");
//!     let addresses = vec!["Pariser Platz, Berlin".to_string()];
//!     let records = geocoder.geocode_addresses(&addresses).await?;
//!
//!     println!("{} records, first status: {:?}", records.len(), records[0].status);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Ordered batches**: output order always matches input order
//! - **Rate limiting**: a rolling-window budget shared by all workers
//! - **Failure isolation**: one bad address never aborts the batch
//! - **Configurable**: config files, environment variables, builders

// Re-export main public API types and functions
pub use config::{load_env_config, parse_timeout_string, ConfigManager, EnvConfig, FileConfig};
pub use dispatch::{dispatch, PROGRESS_INTERVAL};
pub use error::GeocodeError;
pub use geocoder::Geocoder;
pub use limiter::RateLimiter;
pub use resolver::{flatten_response, GeocodeClient, GEOCODE_ENDPOINT};
pub use sink::{default_output_path, save_records, to_csv_string};
pub use types::{
    GeocodeConfig, GeocodeRecord, GeocodeRequest, OutputFormat, ZeroResultsPolicy,
    DEFAULT_RATE_LIMIT, DEFAULT_TIMEOUT,
};

// Internal modules
mod config;
mod dispatch;
mod error;
mod geocoder;
mod limiter;
mod resolver;
mod sink;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, GeocodeError>;

// Library version metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
