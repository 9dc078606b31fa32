//! Core data types for batch address geocoding.
//!
//! This module defines the main data structures used throughout the library:
//! geocoding requests, the flattened per-address record, and configuration
//! options.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single geocoding request. Immutable once built.
///
/// One request is created per input address, consumed exactly once by the
/// resolver, and discarded.
///
/// # Example
///
/// ```rust
/// use geocode_lib::GeocodeRequest;
///
/// let request = GeocodeRequest::new("1600 Amphitheatre Parkway")
///     .with_country("US")
///     .with_language("en");
/// assert_eq!(request.country_restriction.as_deref(), Some("US"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeRequest {
    /// Free-text address to geocode
    pub address: String,

    /// ISO 3166-1 alpha-2 country code restricting results
    pub country_restriction: Option<String>,

    /// Language code for localized result fields
    pub language: Option<String>,
}

impl GeocodeRequest {
    /// Create a request for a single address with no filters.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            country_restriction: None,
            language: None,
        }
    }

    /// Restrict results to a country (alpha-2 code, e.g. "DE").
    pub fn with_country(mut self, code: impl Into<String>) -> Self {
        self.country_restriction = Some(code.into());
        self
    }

    /// Request localized results in the given language (e.g. "fr").
    pub fn with_language(mut self, code: impl Into<String>) -> Self {
        self.language = Some(code.into());
        self
    }
}

/// Flattened geocoding result for one input address.
///
/// Field declaration order is the CSV column order. Optional fields are
/// omitted from JSON output when absent, so a zero-result lookup serializes
/// as just `input_string`, `number_of_results` and `status`.
///
/// Address-component fields hold the comma-joined long names of every
/// component carrying that type; a component type missing from a non-empty
/// result yields an empty string, matching upstream behavior for sparse
/// responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,

    /// Result types joined by comma (e.g. "street_address" or "locality,political")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_match: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport_northeast_lat: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport_northeast_lng: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport_southwest_lat: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport_southwest_lng: Option<f64>,

    /// Upstream location_type (ROOFTOP, RANGE_INTERPOLATED, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub intersection: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub political: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrative_area_level_1: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrative_area_level_2: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrative_area_level_3: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrative_area_level_4: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrative_area_level_5: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub colloquial_area: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sublocality: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub premise: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subpremise: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub natural_feature: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub airport: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub park: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_of_interest: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parking: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,

    /// The raw input address this record was produced for
    pub input_string: String,

    /// How many results the upstream returned for this address
    pub number_of_results: usize,

    /// Upstream status string (OK, ZERO_RESULTS, ...)
    pub status: Option<String>,

    /// Populated when the lookup for this address failed; the rest of the
    /// record is left empty so one bad address never aborts a batch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GeocodeRecord {
    /// CSV column names, in struct declaration order.
    pub const CSV_COLUMNS: [&'static str; 40] = [
        "place_id",
        "formatted_address",
        "type",
        "partial_match",
        "latitude",
        "longitude",
        "viewport_northeast_lat",
        "viewport_northeast_lng",
        "viewport_southwest_lat",
        "viewport_southwest_lng",
        "accuracy",
        "street_number",
        "street_address",
        "route",
        "intersection",
        "political",
        "country",
        "administrative_area_level_1",
        "administrative_area_level_2",
        "administrative_area_level_3",
        "administrative_area_level_4",
        "administrative_area_level_5",
        "colloquial_area",
        "locality",
        "sublocality",
        "neighborhood_name",
        "premise",
        "subpremise",
        "postal_code",
        "natural_feature",
        "airport",
        "park",
        "point_of_interest",
        "floor",
        "parking",
        "room",
        "input_string",
        "number_of_results",
        "status",
        "error",
    ];

    /// Build a record for an address whose lookup failed.
    ///
    /// Only `input_string` and `error` carry data; `number_of_results` is 0.
    pub fn from_error(address: &str, message: impl Into<String>) -> Self {
        Self {
            input_string: address.to_string(),
            number_of_results: 0,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Whether the lookup succeeded and produced at least one result.
    pub fn is_resolved(&self) -> bool {
        self.error.is_none() && self.number_of_results > 0
    }

    /// Render this record as CSV cell values, one per `CSV_COLUMNS` entry.
    pub fn csv_row(&self) -> Vec<String> {
        fn opt_str(value: &Option<String>) -> String {
            value.clone().unwrap_or_default()
        }
        fn opt_f64(value: &Option<f64>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }

        vec![
            opt_str(&self.place_id),
            opt_str(&self.formatted_address),
            opt_str(&self.result_type),
            self.partial_match.map(|v| v.to_string()).unwrap_or_default(),
            opt_f64(&self.latitude),
            opt_f64(&self.longitude),
            opt_f64(&self.viewport_northeast_lat),
            opt_f64(&self.viewport_northeast_lng),
            opt_f64(&self.viewport_southwest_lat),
            opt_f64(&self.viewport_southwest_lng),
            opt_str(&self.accuracy),
            opt_str(&self.street_number),
            opt_str(&self.street_address),
            opt_str(&self.route),
            opt_str(&self.intersection),
            opt_str(&self.political),
            opt_str(&self.country),
            opt_str(&self.administrative_area_level_1),
            opt_str(&self.administrative_area_level_2),
            opt_str(&self.administrative_area_level_3),
            opt_str(&self.administrative_area_level_4),
            opt_str(&self.administrative_area_level_5),
            opt_str(&self.colloquial_area),
            opt_str(&self.locality),
            opt_str(&self.sublocality),
            opt_str(&self.neighborhood_name),
            opt_str(&self.premise),
            opt_str(&self.subpremise),
            opt_str(&self.postal_code),
            opt_str(&self.natural_feature),
            opt_str(&self.airport),
            opt_str(&self.park),
            opt_str(&self.point_of_interest),
            opt_str(&self.floor),
            opt_str(&self.parking),
            opt_str(&self.room),
            self.input_string.clone(),
            self.number_of_results.to_string(),
            opt_str(&self.status),
            opt_str(&self.error),
        ]
    }
}

/// How a zero-result upstream response is treated.
///
/// The source implementations disagreed on this, so it is configurable
/// rather than hardcoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroResultsPolicy {
    /// A zero-result response is a valid record with `number_of_results: 0`
    Accept,

    /// A zero-result response is recorded as a per-address error
    Error,
}

impl Default for ZeroResultsPolicy {
    fn default() -> Self {
        Self::Accept
    }
}

/// Output file format for collected records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON array of records
    Json,

    /// Header row from the record columns, one row per record
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!(
                "invalid output format '{}': expected 'json' or 'csv'",
                other
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Configuration options for geocoding operations.
///
/// This struct allows fine-tuning of batch behavior: worker pool size,
/// the per-second call budget, timeouts, and default request filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeConfig {
    /// Maximum number of concurrent lookups
    /// Default: available parallelism, Range: 1-100
    pub concurrency: usize,

    /// Maximum lookups started within any rolling one-second window
    /// Default: 50 (the upstream's documented per-second quota)
    pub max_calls_per_second: usize,

    /// Timeout for each individual HTTP request
    /// Default: 10 seconds
    #[serde(skip)] // Don't serialize Duration directly
    pub timeout: Duration,

    /// Country restriction applied to every request (alpha-2 code)
    pub country: Option<String>,

    /// Language applied to every request
    pub language: Option<String>,

    /// How zero-result responses are treated
    pub zero_results: ZeroResultsPolicy,
}

/// Default rate budget, matching the upstream's documented 50 QPS quota.
pub const DEFAULT_RATE_LIMIT: usize = 50;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(8)
}

impl Default for GeocodeConfig {
    /// Create a sensible default configuration.
    ///
    /// Concurrency follows the number of available processing units; the
    /// rate budget follows the upstream quota.
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_calls_per_second: DEFAULT_RATE_LIMIT,
            timeout: DEFAULT_TIMEOUT,
            country: None,
            language: None,
            zero_results: ZeroResultsPolicy::default(),
        }
    }
}

impl GeocodeConfig {
    /// Set the worker pool size.
    ///
    /// Automatically caps concurrency at 100 to prevent resource exhaustion.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    /// Set the per-second call budget (floored at 1).
    pub fn with_rate_limit(mut self, max_calls_per_second: usize) -> Self {
        self.max_calls_per_second = max_calls_per_second.max(1);
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Apply a country restriction to every request.
    pub fn with_country(mut self, code: impl Into<String>) -> Self {
        self.country = Some(code.into());
        self
    }

    /// Request localized results for every request.
    pub fn with_language(mut self, code: impl Into<String>) -> Self {
        self.language = Some(code.into());
        self
    }

    /// Set the zero-result handling policy.
    pub fn with_zero_results_policy(mut self, policy: ZeroResultsPolicy) -> Self {
        self.zero_results = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let request = GeocodeRequest::new("Unter den Linden 1, Berlin")
            .with_country("DE")
            .with_language("de");

        assert_eq!(request.address, "Unter den Linden 1, Berlin");
        assert_eq!(request.country_restriction.as_deref(), Some("DE"));
        assert_eq!(request.language.as_deref(), Some("de"));
    }

    #[test]
    fn test_concurrency_clamped() {
        let config = GeocodeConfig::default().with_concurrency(500);
        assert_eq!(config.concurrency, 100);

        let config = GeocodeConfig::default().with_concurrency(0);
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_rate_limit_floored() {
        let config = GeocodeConfig::default().with_rate_limit(0);
        assert_eq!(config.max_calls_per_second, 1);
    }

    #[test]
    fn test_csv_row_matches_column_count() {
        let record = GeocodeRecord::default();
        assert_eq!(record.csv_row().len(), GeocodeRecord::CSV_COLUMNS.len());
    }

    #[test]
    fn test_error_record_shape() {
        let record = GeocodeRecord::from_error("nowhere", "request failed");
        assert_eq!(record.input_string, "nowhere");
        assert_eq!(record.number_of_results, 0);
        assert_eq!(record.error.as_deref(), Some("request failed"));
        assert!(record.place_id.is_none());
        assert!(!record.is_resolved());
    }

    #[test]
    fn test_zero_result_record_serializes_sparse() {
        let record = GeocodeRecord {
            input_string: "atlantis".to_string(),
            number_of_results: 0,
            status: Some("ZERO_RESULTS".to_string()),
            ..GeocodeRecord::default()
        };

        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(object["input_string"], "atlantis");
        assert_eq!(object["number_of_results"], 0);
        assert_eq!(object["status"], "ZERO_RESULTS");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("CSV".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
