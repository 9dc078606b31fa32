//! Geocoding API client: request construction and response flattening.
//!
//! One HTTPS GET per address against the Google Geocoding endpoint, with the
//! JSON body parsed and the first result flattened into the fixed
//! [`GeocodeRecord`] field set.

use crate::error::GeocodeError;
use crate::types::{GeocodeRecord, GeocodeRequest};
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::debug;

/// Production geocoding endpoint.
pub const GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// HTTP client for the geocoding API.
///
/// Holds the API key and endpoint; building the request URL, issuing the
/// GET, and flattening the response all live here so the orchestrator never
/// touches wire details.
#[derive(Clone)]
pub struct GeocodeClient {
    /// HTTP client for geocoding requests
    http_client: reqwest::Client,
    /// Endpoint base URL; overridable for tests or regional proxies
    endpoint: String,
    /// API key appended to every request
    api_key: String,
}

impl GeocodeClient {
    /// Create a new client with the default request timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GeocodeError> {
        Self::with_timeout(api_key, Duration::from_secs(10))
    }

    /// Create a new client with a custom request timeout.
    pub fn with_timeout(
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                GeocodeError::network_with_source(
                    "Failed to create geocoding HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http_client,
            endpoint: GEOCODE_ENDPOINT.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Point the client at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// The configured API key (possibly empty).
    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Build the request URL for one address.
    ///
    /// The address and filters are form-encoded into the query string;
    /// country restrictions ride in the `components` parameter.
    pub fn request_url(&self, request: &GeocodeRequest) -> Result<Url, GeocodeError> {
        let mut params: Vec<(&str, String)> = vec![
            ("address", request.address.clone()),
            ("key", self.api_key.clone()),
        ];
        if let Some(country) = &request.country_restriction {
            params.push(("components", format!("country:{}", country)));
        }
        if let Some(language) = &request.language {
            params.push(("language", language.clone()));
        }

        Url::parse_with_params(&self.endpoint, &params).map_err(|e| {
            GeocodeError::internal(format!("Failed to build request URL: {}", e))
        })
    }

    /// Resolve one address into a flattened record.
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError` if:
    /// - No API key is configured (`Config`, fatal)
    /// - The HTTP request fails or times out
    /// - The upstream returns a non-2xx status or a non-JSON body
    pub async fn resolve(&self, request: &GeocodeRequest) -> Result<GeocodeRecord, GeocodeError> {
        if self.api_key.trim().is_empty() {
            return Err(GeocodeError::config(
                "no API key configured; pass one on the command line",
            ));
        }

        let url = self.request_url(request)?;
        debug!(address = %request.address, "geocoding address");

        let response = self.http_client.get(url).send().await?;

        match response.status() {
            status if status.is_success() => {
                let body = response.json::<serde_json::Value>().await.map_err(|e| {
                    GeocodeError::upstream(
                        &request.address,
                        format!("response was not valid JSON: {}", e),
                    )
                })?;
                Ok(flatten_response(&request.address, &body))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(GeocodeError::upstream_with_status(
                &request.address,
                "quota exceeded",
                StatusCode::TOO_MANY_REQUESTS.as_u16(),
            )),
            status => Err(GeocodeError::upstream_with_status(
                &request.address,
                format!("upstream returned error: {}", status),
                status.as_u16(),
            )),
        }
    }
}

/// Flatten an upstream response body into a [`GeocodeRecord`].
///
/// When the result list is non-empty, the first entry's geometry and
/// address-component arrays are spread across the fixed field set; multiple
/// components sharing a type have their long names joined by comma in
/// response order. An empty result list yields a record carrying only
/// `input_string`, `number_of_results: 0` and `status`.
pub fn flatten_response(input: &str, body: &serde_json::Value) -> GeocodeRecord {
    let results = body
        .get("results")
        .and_then(|r| r.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut record = GeocodeRecord {
        input_string: input.to_string(),
        number_of_results: results.len(),
        status: body.get("status").and_then(|s| s.as_str()).map(String::from),
        ..GeocodeRecord::default()
    };

    let Some(answer) = results.first() else {
        return record;
    };

    record.place_id = string_field(answer, "place_id");
    record.formatted_address = string_field(answer, "formatted_address");
    record.result_type = Some(join_strings(answer.get("types")));
    record.partial_match = answer.get("partial_match").and_then(|v| v.as_bool());

    record.latitude = nested_f64(answer, &["geometry", "location", "lat"]);
    record.longitude = nested_f64(answer, &["geometry", "location", "lng"]);
    record.viewport_northeast_lat = nested_f64(answer, &["geometry", "viewport", "northeast", "lat"]);
    record.viewport_northeast_lng = nested_f64(answer, &["geometry", "viewport", "northeast", "lng"]);
    record.viewport_southwest_lat = nested_f64(answer, &["geometry", "viewport", "southwest", "lat"]);
    record.viewport_southwest_lng = nested_f64(answer, &["geometry", "viewport", "southwest", "lng"]);
    record.accuracy = answer
        .get("geometry")
        .and_then(|g| g.get("location_type"))
        .and_then(|v| v.as_str())
        .map(String::from);

    record.street_number = Some(join_components(answer, "street_number"));
    record.street_address = Some(join_components(answer, "street_address"));
    record.route = Some(join_components(answer, "route"));
    record.intersection = Some(join_components(answer, "intersection"));
    record.political = Some(join_components(answer, "political"));
    record.country = Some(join_components(answer, "country"));
    record.administrative_area_level_1 = Some(join_components(answer, "administrative_area_level_1"));
    record.administrative_area_level_2 = Some(join_components(answer, "administrative_area_level_2"));
    record.administrative_area_level_3 = Some(join_components(answer, "administrative_area_level_3"));
    record.administrative_area_level_4 = Some(join_components(answer, "administrative_area_level_4"));
    record.administrative_area_level_5 = Some(join_components(answer, "administrative_area_level_5"));
    record.colloquial_area = Some(join_components(answer, "colloquial_area"));
    record.locality = Some(join_components(answer, "locality"));
    record.sublocality = Some(join_components(answer, "sublocality"));
    record.neighborhood_name = Some(join_components(answer, "neighborhood"));
    record.premise = Some(join_components(answer, "premise"));
    record.subpremise = Some(join_components(answer, "subpremise"));
    record.postal_code = Some(join_components(answer, "postal_code"));
    record.natural_feature = Some(join_components(answer, "natural_feature"));
    record.airport = Some(join_components(answer, "airport"));
    record.park = Some(join_components(answer, "park"));
    record.point_of_interest = Some(join_components(answer, "point_of_interest"));
    record.floor = Some(join_components(answer, "floor"));
    record.parking = Some(join_components(answer, "parking"));
    record.room = Some(join_components(answer, "room"));

    record
}

/// Join the long names of every address component carrying `component_type`.
///
/// Components appear in response order; a type with no matches yields an
/// empty string.
fn join_components(answer: &serde_json::Value, component_type: &str) -> String {
    let Some(components) = answer.get("address_components").and_then(|c| c.as_array()) else {
        return String::new();
    };

    components
        .iter()
        .filter(|component| {
            component
                .get("types")
                .and_then(|t| t.as_array())
                .is_some_and(|types| types.iter().any(|t| t.as_str() == Some(component_type)))
        })
        .filter_map(|component| component.get("long_name").and_then(|n| n.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

fn string_field(answer: &serde_json::Value, key: &str) -> Option<String> {
    answer.get(key).and_then(|v| v.as_str()).map(String::from)
}

fn join_strings(value: Option<&serde_json::Value>) -> String {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default()
}

fn nested_f64(answer: &serde_json::Value, path: &[&str]) -> Option<f64> {
    let mut current = answer;
    for key in path {
        current = current.get(key)?;
    }
    current.as_f64()
}
