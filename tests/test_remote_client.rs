//! Remote client tests: status routing, rate-limit backoff, record checks.
//!
//! All requests go through a scripted transport, so no network is needed.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{RecordingSleeper, ScriptedTransport};
use foodgrade_sdk::identifier::Identifier;
use foodgrade_sdk::models::RecommendationKind;
use foodgrade_sdk::remote::HttpResponse;
use foodgrade_sdk::{FoodGradeError, RemoteClient, RemoteDataSource};

const BASE: &str = "http://localhost:5000/api";

fn client(
    responses: Vec<HttpResponse>,
) -> (RemoteClient<ScriptedTransport>, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = RemoteClient::with_transport(BASE, ScriptedTransport::new(responses))
        .sleeper(sleeper.clone());
    (client, sleeper)
}

fn goodday() -> Identifier {
    Identifier::parse(common::GOODDAY).unwrap()
}

// ---------------------------------------------------------------------------
// Success
// ---------------------------------------------------------------------------

#[test]
fn ok_response_decodes_product() {
    let record = common::product(common::GOODDAY, "Biscuit");
    let (client, sleeper) = client(vec![HttpResponse::new(200, common::product_body(&record))]);

    let fetched = client.fetch_product(&goodday()).unwrap().unwrap();
    assert_eq!(fetched, record);
    assert!(sleeper.delays().is_empty());

    let requests = client.transport().requests.lock().unwrap().clone();
    assert_eq!(requests, vec![format!("{BASE}/products/{}", common::GOODDAY)]);
}

#[test]
fn trailing_slash_in_base_is_dropped() {
    let client = RemoteClient::with_transport(
        "http://example.test/api/",
        ScriptedTransport::new(vec![HttpResponse::new(404, "")]),
    );
    assert_eq!(client.base_url(), "http://example.test/api");
}

#[test]
fn recommendations_endpoint_decodes_list() {
    let record = common::product(common::QUINOA, "Chips");
    let body = serde_json::json!([
        {"type": "healthier", "product": record, "reason": "Less sugar"}
    ])
    .to_string();
    let (client, _) = client(vec![HttpResponse::new(200, body)]);

    let recs = client.fetch_recommendations(&goodday()).unwrap().unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].kind, RecommendationKind::Healthier);
    assert_eq!(recs[0].product, record);

    let requests = client.transport().requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![format!("{BASE}/products/{}/recommendations", common::GOODDAY)]
    );
}

// ---------------------------------------------------------------------------
// Status routing
// ---------------------------------------------------------------------------

#[test]
fn not_found_is_none_and_never_retried() {
    let (client, sleeper) = client(vec![HttpResponse::new(404, r#"{"error":"Product not found"}"#)]);

    assert!(client.fetch_product(&goodday()).unwrap().is_none());
    assert_eq!(client.transport().request_count(), 1);
    assert!(sleeper.delays().is_empty());
}

#[test]
fn bad_request_is_invalid_identifier() {
    let (client, _) = client(vec![HttpResponse::new(
        400,
        r#"{"error":"Invalid barcode format"}"#,
    )]);

    match client.fetch_product(&goodday()).unwrap_err() {
        FoodGradeError::InvalidIdentifier(msg) => assert_eq!(msg, "Invalid barcode format"),
        other => panic!("expected InvalidIdentifier, got {other:?}"),
    }
}

#[test]
fn server_error_is_degraded_and_never_retried() {
    let (client, sleeper) = client(vec![HttpResponse::new(500, r#"{"error":"Internal server error"}"#)]);

    let err = client.fetch_product(&goodday()).unwrap_err();
    assert!(matches!(err, FoodGradeError::ServiceDegraded(_)));
    assert!(!err.is_retryable());
    assert_eq!(client.transport().request_count(), 1);
    assert!(sleeper.delays().is_empty());
}

#[test]
fn unexpected_status_is_transport_error() {
    let (client, _) = client(vec![HttpResponse::new(503, "")]);
    assert!(matches!(
        client.fetch_product(&goodday()).unwrap_err(),
        FoodGradeError::TransportError(_)
    ));
}

#[test]
fn network_fault_propagates_without_retry() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = RemoteClient::with_transport(BASE, ScriptedTransport::failing(|| FoodGradeError::Timeout))
        .sleeper(sleeper.clone());

    assert!(matches!(
        client.fetch_product(&goodday()).unwrap_err(),
        FoodGradeError::Timeout
    ));
    assert_eq!(client.transport().request_count(), 1);
    assert!(sleeper.delays().is_empty());
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

#[test]
fn rate_limit_backs_off_then_gives_up() {
    let (client, sleeper) = client(vec![HttpResponse::new(429, "")]);

    let err = client.fetch_product(&goodday()).unwrap_err();
    assert!(matches!(err, FoodGradeError::RateLimited { attempts: 3 }), "{err:?}");
    assert!(err.is_retryable());
    assert_eq!(
        sleeper.delays(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4)
        ]
    );
    // One original request plus three retries.
    assert_eq!(client.transport().request_count(), 4);
}

#[test]
fn rate_limit_recovers_when_service_answers() {
    let record = common::product(common::GOODDAY, "Biscuit");
    let (client, sleeper) = client(vec![
        HttpResponse::new(429, ""),
        HttpResponse::new(429, ""),
        HttpResponse::new(200, common::product_body(&record)),
    ]);

    let fetched = client.fetch_product(&goodday()).unwrap().unwrap();
    assert_eq!(fetched, record);
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}

#[test]
fn retry_budget_is_configurable() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = RemoteClient::with_transport(
        BASE,
        ScriptedTransport::new(vec![HttpResponse::new(429, "")]),
    )
    .sleeper(sleeper.clone())
    .max_retries(1);

    assert!(matches!(
        client.fetch_product(&goodday()).unwrap_err(),
        FoodGradeError::RateLimited { attempts: 1 }
    ));
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(1)]);
}

// ---------------------------------------------------------------------------
// Record checks
// ---------------------------------------------------------------------------

#[test]
fn malformed_body_is_transport_error() {
    let (client, _) = client(vec![HttpResponse::new(200, "<html>oops</html>")]);
    match client.fetch_product(&goodday()).unwrap_err() {
        FoodGradeError::TransportError(msg) => assert!(msg.contains("malformed")),
        other => panic!("expected TransportError, got {other:?}"),
    }
}

#[test]
fn mismatched_barcode_is_rejected() {
    let other = common::product(common::QUINOA, "Chips");
    let (client, _) = client(vec![HttpResponse::new(200, common::product_body(&other))]);
    assert!(matches!(
        client.fetch_product(&goodday()).unwrap_err(),
        FoodGradeError::TransportError(_)
    ));
}

#[test]
fn record_breaking_numeric_invariants_is_rejected() {
    let mut record = common::product(common::GOODDAY, "Biscuit");
    record.nutrition.sugars = -1.0;
    let (client, _) = client(vec![HttpResponse::new(200, common::product_body(&record))]);
    assert!(client.fetch_product(&goodday()).is_err());
}
