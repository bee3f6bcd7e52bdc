use rumahrapih_client::api::{BookingService, BookingSubmission, ProofFile};
use rumahrapih_client::config::{ClientConfig, ClientOptions};
use rumahrapih_client::error::{Error, ErrorKind};
use rumahrapih_client::validation::{BookingDraft, BookingLookup};
use rumahrapih_client::RumahRapih;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Helper to create a client pointed at the mock server
fn setup_client(server: &MockServer) -> RumahRapih {
    let config = ClientConfig::new(
        &format!("{}/api", server.uri()),
        &format!("{}/storage", server.uri()),
    )
    .unwrap();
    let options = ClientOptions::default().with_client_info("storefront-test");
    RumahRapih::new_with_options(config, options).unwrap()
}

fn service_json(id: i64, slug: &str, price: i64) -> Value {
    json!({
        "id": id,
        "price": price,
        "duration": 2,
        "name": slug.replace('-', " "),
        "slug": slug,
        "is_popular": true,
        "thumbnail": format!("thumbnails/{}.png", slug),
        "about": "Professional service",
        "benefits": [{ "id": 1, "name": "Guaranteed" }],
        "testimonials": [],
        "category": {
            "id": 7,
            "name": "Cleaning",
            "slug": "cleaning",
            "photo": "categories/cleaning.png",
            "home_services_count": 3
        }
    })
}

fn booking_json(is_paid: bool) -> Value {
    json!({
        "id": 11,
        "name": "Jane",
        "phone": "0811",
        "email": "jane@x.com",
        "address": "Jl. A",
        "post_code": "12345",
        "city": "Jakarta",
        "booking_trx_id": "TRX1",
        "is_paid": is_paid,
        "sub_total": 100000,
        "total_tax_amount": 11000,
        "total_amount": 111000,
        "started_time": "09:00",
        "schedule_at": "2025-01-02",
        "proof": "proofs/transfer.png",
        "transaction_details": [{
            "id": 1,
            "price": 100000,
            "home_service_id": 3,
            "home_service": service_json(3, "ac-cleaning", 100000)
        }]
    })
}

#[tokio::test]
async fn test_fetch_service_by_slug() {
    let server = MockServer::start().await;
    let client = setup_client(&server);

    Mock::given(method("GET"))
        .and(path("/api/service/ac-cleaning"))
        .and(header("X-Client-Info", "storefront-test"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": service_json(3, "ac-cleaning", 150000) })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let service = client.api().fetch_service_by_slug("ac-cleaning").await.unwrap();
    assert_eq!(service.id, 3);
    assert_eq!(service.price, 150000);
    assert_eq!(service.category.unwrap().slug, "cleaning");
    assert_eq!(service.benefits.len(), 1);
}

#[tokio::test]
async fn test_missing_service_is_not_found() {
    let server = MockServer::start().await;
    let client = setup_client(&server);

    Mock::given(method("GET"))
        .and(path("/api/service/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/service/null-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
        .mount(&server)
        .await;

    let err = client.api().fetch_service_by_slug("gone").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = client.api().fetch_service_by_slug("null-data").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let server = MockServer::start().await;
    let client = setup_client(&server);

    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    match client.api().fetch_categories().await.unwrap_err() {
        Error::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("Expected Error::Api, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_categories_and_popular_services() {
    let server = MockServer::start().await;
    let client = setup_client(&server);

    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": 1, "name": "Cleaning", "slug": "cleaning", "photo": "c.png", "home_services_count": 4 },
                { "id": 2, "name": "Repair", "slug": "repair", "photo": "r.png", "home_services_count": 2 }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/services"))
        .and(query_param("limit", "5"))
        .and(query_param("is_popular", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [service_json(3, "ac-cleaning", 150000)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client.api();
    let categories = api.fetch_categories().await.unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[1].slug, "repair");
    assert!(categories[0].home_services.is_empty());

    let popular = api.fetch_popular_services(5).await.unwrap();
    assert_eq!(popular[0].slug, "ac-cleaning");
}

#[tokio::test]
async fn test_fetch_category_by_slug_lists_services() {
    let server = MockServer::start().await;
    let client = setup_client(&server);

    Mock::given(method("GET"))
        .and(path("/api/category/cleaning"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": 1,
                "name": "Cleaning",
                "slug": "cleaning",
                "photo": "c.png",
                "home_services_count": 2,
                "home_services": [service_json(3, "ac-cleaning", 150000), service_json(4, "sofa-cleaning", 90000)],
                "popular_services": [service_json(3, "ac-cleaning", 150000)]
            }
        })))
        .mount(&server)
        .await;

    let category = client.api().fetch_category_by_slug("cleaning").await.unwrap();
    assert_eq!(category.home_services.len(), 2);
    assert_eq!(category.popular_services[0].id, 3);
}

#[tokio::test]
async fn test_submit_booking_sends_multipart_fields() {
    let server = MockServer::start().await;
    let client = setup_client(&server);

    Mock::given(method("POST"))
        .and(path("/api/booking-transaction"))
        .and(body_string_contains("name=\"service_ids[0]\""))
        .and(body_string_contains("name=\"service_ids[1]\""))
        .and(body_string_contains("filename=\"transfer.png\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "booking_trx_id": "TRX1", "email": "jane@x.com", "is_paid": false }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let submission = BookingSubmission {
        proof: ProofFile::new("transfer.png", b"PNG-DATA".to_vec()),
        booking: Some(BookingDraft {
            name: "Jane".into(),
            email: "jane@x.com".into(),
            phone: "0811".into(),
            started_time: "09:00".into(),
            schedule_at: "2025-01-02".into(),
            post_code: "12345".into(),
            address: "Jl. A".into(),
            city: "Jakarta".into(),
        }),
        service_ids: vec![3, 4],
    };

    let receipt = client.api().submit_booking(submission).await.unwrap();
    assert_eq!(receipt.booking_trx_id, "TRX1");
    assert_eq!(receipt.email, "jane@x.com");

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"city\""));
    assert!(body.contains("Jakarta"));
    assert!(body.contains("image/png"));
}

#[tokio::test]
async fn test_submit_booking_rejected_by_server() {
    let server = MockServer::start().await;
    let client = setup_client(&server);

    Mock::given(method("POST"))
        .and(path("/api/booking-transaction"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "The proof field must be an image."
        })))
        .mount(&server)
        .await;

    let submission = BookingSubmission {
        proof: ProofFile::new("notes.txt", b"hello".to_vec()),
        booking: None,
        service_ids: vec![3],
    };
    let err = client.api().submit_booking(submission).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(
        err.to_string(),
        "Request failed with status 422: The proof field must be an image."
    );
}

#[tokio::test]
async fn test_check_booking_found() {
    let server = MockServer::start().await;
    let client = setup_client(&server);

    Mock::given(method("POST"))
        .and(path("/api/check-booking"))
        .and(body_json(json!({ "booking_trx_id": "TRX1", "email": "jane@x.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": booking_json(true) })))
        .expect(1)
        .mount(&server)
        .await;

    let details = client
        .api()
        .check_booking(&BookingLookup::new("TRX1", "jane@x.com"))
        .await
        .unwrap()
        .expect("booking should be found");
    assert!(details.is_paid);
    assert_eq!(details.total_amount, 111000);
    assert_eq!(details.transaction_details[0].home_service.slug, "ac-cleaning");
    assert_eq!(
        client.asset_url(details.proof.as_deref().unwrap()).unwrap().as_str(),
        format!("{}/storage/proofs/transfer.png", server.uri())
    );
}

#[tokio::test]
async fn test_check_booking_not_found_is_none() {
    let server = MockServer::start().await;
    let client = setup_client(&server);

    Mock::given(method("POST"))
        .and(path("/api/check-booking"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Booking not found" })))
        .mount(&server)
        .await;

    let result = client
        .api()
        .check_booking(&BookingLookup::new("NOPE", "jane@x.com"))
        .await
        .unwrap();
    assert!(result.is_none());
}
