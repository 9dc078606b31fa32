//! Main batch geocoder implementation.
//!
//! This module provides the primary `Geocoder` struct that orchestrates
//! batch address geocoding: configuration, the upstream client, the rate
//! limiter, and the concurrent dispatcher.

use crate::dispatch::dispatch;
use crate::error::GeocodeError;
use crate::limiter::RateLimiter;
use crate::resolver::GeocodeClient;
use crate::types::{GeocodeConfig, GeocodeRecord, GeocodeRequest, ZeroResultsPolicy};
use std::sync::Arc;
use tracing::warn;

/// Batch geocoder coordinating lookups against the upstream API.
///
/// The `Geocoder` handles all aspects of a batch run:
/// - Up-front credential validation (no network is touched without a key)
/// - Concurrent dispatch through a bounded worker pool
/// - Per-second rate limiting shared across all workers
/// - Isolation of per-address failures into the affected record
///
/// # Example
///
/// ```rust,no_run
/// use geocode_lib::Geocoder;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let geocoder = Geocoder::new("my-api-key");
///     let record = geocoder.geocode_address("Pariser Platz, Berlin").await?;
///     println!("{:?} {:?}", record.latitude, record.longitude);
///     Ok(())
/// }
/// ```
pub struct Geocoder {
    /// Configuration settings for this geocoder instance
    config: GeocodeConfig,
    /// HTTP client for the upstream geocoding API
    client: GeocodeClient,
    /// Rate limiter shared by every worker in a batch
    limiter: Arc<RateLimiter>,
}

impl Geocoder {
    /// Create a new geocoder with default configuration.
    ///
    /// Default settings:
    /// - Concurrency: number of available processing units
    /// - Rate limit: 50 calls per second
    /// - Timeout: 10 seconds
    /// - Zero results: accepted as valid records
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(api_key, GeocodeConfig::default())
    }

    /// Create a new geocoder with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use geocode_lib::{Geocoder, GeocodeConfig};
    ///
    /// let config = GeocodeConfig::default()
    ///     .with_concurrency(4)
    ///     .with_rate_limit(10)
    ///     .with_country("US");
    /// let geocoder = Geocoder::with_config("my-api-key", config);
    /// ```
    pub fn with_config(api_key: impl Into<String>, config: GeocodeConfig) -> Self {
        let client = GeocodeClient::with_timeout(api_key, config.timeout)
            .expect("Failed to create geocoding HTTP client");
        let limiter = Arc::new(RateLimiter::per_second(config.max_calls_per_second));

        Self {
            config,
            client,
            limiter,
        }
    }

    /// Get the current configuration for this geocoder.
    pub fn config(&self) -> &GeocodeConfig {
        &self.config
    }

    /// Geocode a single address.
    ///
    /// The call is rate limited like any batch worker. Errors are returned
    /// directly; batch-level error isolation only applies to
    /// [`geocode_addresses`](Self::geocode_addresses).
    pub async fn geocode_address(&self, address: &str) -> Result<GeocodeRecord, GeocodeError> {
        self.limiter.acquire().await;
        self.resolve_one(address).await
    }

    /// Geocode a list of addresses concurrently, preserving input order.
    ///
    /// The API key is validated before anything is dispatched, so a missing
    /// key fails fast without a single network call. Per-address upstream
    /// failures are folded into that address's record (`error` field); only
    /// configuration problems abort the batch.
    ///
    /// # Returns
    ///
    /// One `GeocodeRecord` per input address, in input order.
    pub async fn geocode_addresses(
        &self,
        addresses: &[String],
    ) -> Result<Vec<GeocodeRecord>, GeocodeError> {
        if self.client.api_key().trim().is_empty() {
            return Err(GeocodeError::config(
                "no API key configured; pass one on the command line",
            ));
        }
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let records = dispatch(
            addresses.to_vec(),
            self.config.concurrency,
            &self.limiter,
            |address| async move {
                match self.resolve_one(&address).await {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(address = %address, error = %e, "geocoding failed");
                        GeocodeRecord::from_error(&address, e.to_string())
                    }
                }
            },
        )
        .await;

        Ok(records)
    }

    /// Resolve one address and apply the zero-results policy.
    async fn resolve_one(&self, address: &str) -> Result<GeocodeRecord, GeocodeError> {
        let request = self.request_for(address);
        let record = self.client.resolve(&request).await?;

        if record.number_of_results == 0 && self.config.zero_results == ZeroResultsPolicy::Error {
            return Err(GeocodeError::upstream(
                address,
                format!(
                    "no results (status {})",
                    record.status.as_deref().unwrap_or("unknown")
                ),
            ));
        }

        Ok(record)
    }

    /// Build the request for one address, applying configured filters.
    fn request_for(&self, address: &str) -> GeocodeRequest {
        let mut request = GeocodeRequest::new(address);
        if let Some(country) = &self.config.country {
            request = request.with_country(country.clone());
        }
        if let Some(language) = &self.config.language {
            request = request.with_language(language.clone());
        }
        request
    }
}
