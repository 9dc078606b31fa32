// geocode-lib/tests/integration.rs

//! Integration tests for geocode-lib exports and core functionality

use geocode_lib::{
    default_output_path, dispatch, flatten_response, to_csv_string, GeocodeConfig, GeocodeRecord,
    GeocodeRequest, Geocoder, OutputFormat, RateLimiter, ZeroResultsPolicy,
};
use serde_json::json;

#[test]
fn test_library_exports_work() {
    // Core types are constructible through the public API
    let request = GeocodeRequest::new("Alexanderplatz, Berlin").with_country("DE");
    assert_eq!(request.country_restriction.as_deref(), Some("DE"));

    let config = GeocodeConfig::default()
        .with_concurrency(4)
        .with_rate_limit(10)
        .with_zero_results_policy(ZeroResultsPolicy::Error);
    assert_eq!(config.concurrency, 4);
    assert_eq!(config.max_calls_per_second, 10);

    assert_eq!(default_output_path(OutputFormat::Json), "results.json");
    assert!(!geocode_lib::VERSION.is_empty());
}

/// One record per input, in input order, even when later items finish first.
#[tokio::test(start_paused = true)]
async fn test_dispatch_preserves_input_order() {
    let limiter = RateLimiter::per_second(1000);
    let addresses: Vec<String> = (0..12).map(|i| format!("address {}", i)).collect();

    let results = dispatch(addresses.clone(), 6, &limiter, |address| async move {
        // Reverse the latencies so the last input would finish first.
        let position: u64 = address
            .rsplit(' ')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        tokio::time::sleep(std::time::Duration::from_millis((12 - position) * 20)).await;
        address
    })
    .await;

    assert_eq!(results, addresses);
}

/// A batch against a missing key fails fast, before any dispatch.
#[tokio::test]
async fn test_missing_api_key_short_circuits_batch() {
    let geocoder = Geocoder::new("   ");
    let addresses = vec!["somewhere".to_string(), "elsewhere".to_string()];

    let err = geocoder.geocode_addresses(&addresses).await.unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("API key"));
}

#[test]
fn test_zero_result_flatten_only_sets_status_fields() {
    let body = json!({"status": "ZERO_RESULTS", "results": []});
    let record = flatten_response("the lost city", &body);

    let value = serde_json::to_value(&record).unwrap();
    let object = value.as_object().unwrap();
    let keys: Vec<&str> = object.keys().map(String::as_str).collect();
    assert_eq!(keys, ["input_string", "number_of_results", "status"]);
    assert_eq!(object["number_of_results"], 0);
}

#[test]
fn test_duplicate_component_types_join_in_declared_order() {
    let body = json!({
        "status": "OK",
        "results": [{
            "address_components": [
                {"long_name": "Kreuzberg", "types": ["political"]},
                {"long_name": "Berlin", "types": ["political"]}
            ],
            "geometry": {"location": {"lat": 52.49, "lng": 13.4}},
            "types": ["neighborhood"]
        }]
    });

    let record = flatten_response("kreuzberg", &body);
    assert_eq!(record.political.as_deref(), Some("Kreuzberg,Berlin"));
}

/// Saving as JSON then reloading yields a key-for-key equal record set.
#[test]
fn test_json_round_trip_preserves_records() {
    let records = vec![
        flatten_response(
            "alexanderplatz",
            &json!({
                "status": "OK",
                "results": [{
                    "place_id": "xyz",
                    "formatted_address": "Alexanderplatz, 10178 Berlin, Germany",
                    "types": ["square"],
                    "geometry": {
                        "location": {"lat": 52.5219184, "lng": 13.4132147},
                        "location_type": "GEOMETRIC_CENTER",
                        "viewport": {
                            "northeast": {"lat": 52.5232673, "lng": 13.4145636},
                            "southwest": {"lat": 52.5205694, "lng": 13.4118657}
                        }
                    },
                    "address_components": [
                        {"long_name": "Alexanderplatz", "types": ["square"]},
                        {"long_name": "Berlin", "types": ["locality", "political"]}
                    ]
                }]
            }),
        ),
        flatten_response("atlantis", &json!({"status": "ZERO_RESULTS", "results": []})),
        GeocodeRecord::from_error("broken input", "upstream returned error: 502"),
    ];

    let serialized = serde_json::to_string(&records).unwrap();
    let reloaded: Vec<GeocodeRecord> = serde_json::from_str(&serialized).unwrap();
    assert_eq!(reloaded, records);
}

#[test]
fn test_csv_output_shape_matches_schema() {
    let records = vec![
        flatten_response("atlantis", &json!({"status": "ZERO_RESULTS", "results": []})),
        GeocodeRecord::from_error("bad input", "timed out"),
    ];

    let csv = to_csv_string(&records);
    let rows: Vec<&str> = csv.lines().collect();

    assert_eq!(rows.len(), records.len() + 1);

    let header: Vec<&str> = rows[0].split(',').collect();
    assert_eq!(header, GeocodeRecord::CSV_COLUMNS);
}
