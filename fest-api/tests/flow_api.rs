use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use fest_api::{app, AppState, Session, SessionDeps};
use fest_catalog::EventDetails;
use fest_core::{MockAvatarUploader, UploadError};
use fest_store::{MemoryBookingStore, SvgFileExporter};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: Arc<MemoryBookingStore>,
    exports: TempDir,
}

async fn test_app_with(uploader: MockAvatarUploader, upload_timeout: Duration) -> TestApp {
    let store = Arc::new(MemoryBookingStore::new());
    let exports = tempfile::tempdir().unwrap();

    let session = Session::spawn(SessionDeps {
        bookings: store.clone(),
        drafts: store.clone(),
        uploader: Arc::new(uploader),
        event: EventDetails::default(),
        upload_timeout,
    })
    .await;

    let state = AppState {
        session,
        bookings: store.clone(),
        exporter: Arc::new(SvgFileExporter::new(exports.path())),
    };

    TestApp {
        router: app(state),
        store,
        exports,
    }
}

async fn test_app() -> TestApp {
    test_app_with(
        MockAvatarUploader::succeeding("https://cdn.example.com/avatar.png"),
        Duration::from_secs(5),
    )
    .await
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| json!({ "raw": String::from_utf8_lossy(&bytes).to_string() }))
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let resp = router.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    (status, body_json(resp).await)
}

async fn select(router: &Router, tier: &str, count: i64) -> Value {
    let (status, view) = send(
        router,
        "POST",
        "/v1/flow/selection",
        Some(json!({ "tier": tier, "count": count })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", view);
    view
}

async fn fill(router: &Router, index: usize, name: &str, email: &str) {
    let (status, _) = send(
        router,
        "PATCH",
        &format!("/v1/flow/attendees/{}", index),
        Some(json!({ "fullName": name, "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

/// Select, fill every slot and submit. Returns the confirmed view.
async fn book(router: &Router, tier: &str, names: &[&str]) -> Value {
    select(router, tier, names.len() as i64).await;
    for (i, name) in names.iter().enumerate() {
        let email = format!("{}@example.com", name.split_whitespace().next().unwrap().to_lowercase());
        fill(router, i, name, &email).await;
    }
    let (status, view) = send(router, "POST", "/v1/flow/submit", None).await;
    assert_eq!(status, StatusCode::OK, "{}", view);
    view
}

async fn wait_for_flow(router: &Router, done: impl Fn(&Value) -> bool) -> Value {
    for _ in 0..200 {
        let (_, view) = send(router, "GET", "/v1/flow", None).await;
        if done(&view) {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("flow never reached the expected state");
}

#[tokio::test]
async fn test_health_and_tiers() {
    let t = test_app().await;

    let resp = t
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (status, tiers) = send(&t.router, "GET", "/v1/tiers", None).await;
    assert_eq!(status, StatusCode::OK);
    let tiers = tiers.as_array().unwrap();
    assert_eq!(tiers.len(), 3);
    assert_eq!(tiers[1]["tier"], "VIP");
    assert_eq!(tiers[1]["price_usd"], 100);
}

#[tokio::test]
async fn test_fresh_flow_starts_selecting_with_one_slot() {
    let t = test_app().await;
    let (status, view) = send(&t.router, "GET", "/v1/flow", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], "selecting");
    assert_eq!(view["attendees"].as_array().unwrap().len(), 1);
    assert!(view["booking_reference"].as_str().unwrap().starts_with("TKT-"));
}

#[tokio::test]
async fn test_incomplete_attendee_blocks_submit() {
    let t = test_app().await;
    let view = select(&t.router, "VIP", 2).await;
    assert_eq!(view["step"], "detailing");
    assert_eq!(view["attendees"].as_array().unwrap().len(), 2);
    assert_eq!(view["quote"]["total_usd"], 200);

    fill(&t.router, 0, "Ada Lovelace", "ada@example.com").await;

    let (status, body) = send(&t.router, "POST", "/v1/flow/submit", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["1"]["fullName"], "Full name is required");
    assert_eq!(body["fields"]["1"]["email"], "Email is required");
    assert!(body["fields"].get("0").is_none());

    let (_, view) = send(&t.router, "GET", "/v1/flow", None).await;
    assert_eq!(view["step"], "detailing");
    assert!(t.store.is_empty().await);
}

#[tokio::test]
async fn test_submit_confirms_and_persists() {
    let t = test_app().await;
    let view = book(&t.router, "VIP", &["Ada Lovelace", "Alan Turing"]).await;

    assert_eq!(view["step"], "reviewing");
    let reference = view["booking_reference"].as_str().unwrap().to_string();
    let confirmed = &view["confirmed"];
    assert_eq!(confirmed["bookingReference"], reference.as_str());
    assert_eq!(confirmed["tier"], "VIP");
    assert_eq!(confirmed["status"], "confirmed");
    assert_eq!(confirmed["attendees"][0]["ticketId"], format!("{}-1", reference));
    assert_eq!(confirmed["attendees"][1]["ticketId"], format!("{}-2", reference));

    let (status, stored) = send(&t.router, "GET", &format!("/v1/bookings/{}", reference), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored, *confirmed);

    let (status, qr) = send(&t.router, "GET", "/v1/flow/cards/1/qr", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(qr["bookingRef"], reference.as_str());
    assert_eq!(qr["ticketId"], format!("{}-2", reference));
    assert_eq!(qr["name"], "Alan Turing");
    assert_eq!(qr["type"], "VIP");
}

#[tokio::test]
async fn test_persistence_failure_stays_in_detailing() {
    let t = test_app().await;
    select(&t.router, "Standard", 1).await;
    fill(&t.router, 0, "Ada Lovelace", "ada@example.com").await;

    t.store.set_unavailable(true);
    let (status, body) = send(&t.router, "POST", "/v1/flow/submit", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("could not be saved"));

    let (_, view) = send(&t.router, "GET", "/v1/flow", None).await;
    assert_eq!(view["step"], "detailing");
    assert!(view["confirmed"].is_null());

    t.store.set_unavailable(false);
    let (status, view) = send(&t.router, "POST", "/v1/flow/submit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], "reviewing");
    assert_eq!(t.store.len().await, 1);
}

#[tokio::test]
async fn test_back_from_review_keeps_data() {
    let t = test_app().await;
    let confirmed = book(&t.router, "Interns", &["Grace Hopper"]).await;

    let (status, view) = send(&t.router, "POST", "/v1/flow/back", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], "detailing");
    assert_eq!(view["booking_reference"], confirmed["booking_reference"]);
    assert_eq!(view["attendees"][0]["fullName"], "Grace Hopper");
    assert_eq!(view["selection"]["tier"], "Interns");
}

#[tokio::test]
async fn test_back_from_details_discards_attendees() {
    let t = test_app().await;
    select(&t.router, "Standard", 2).await;
    fill(&t.router, 0, "Ada Lovelace", "ada@example.com").await;

    let (status, view) = send(&t.router, "POST", "/v1/flow/back", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], "selecting");
    assert_eq!(view["attendees"][0]["fullName"], "");
}

#[tokio::test]
async fn test_new_booking_resets_flow() {
    let t = test_app().await;
    let confirmed = book(&t.router, "Standard", &["Ada Lovelace", "Alan Turing"]).await;

    let (status, view) = send(&t.router, "POST", "/v1/flow/new", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], "selecting");
    assert_ne!(view["booking_reference"], confirmed["booking_reference"]);
    assert_eq!(view["attendees"].as_array().unwrap().len(), 1);
    assert!(view["selection"].is_null());

    // The earlier booking stays retrievable
    let reference = confirmed["booking_reference"].as_str().unwrap();
    let (status, _) = send(&t.router, "GET", &format!("/v1/bookings/{}", reference), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_out_of_step_events_conflict() {
    let t = test_app().await;

    let (status, _) = send(&t.router, "POST", "/v1/flow/submit", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&t.router, "POST", "/v1/flow/new", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&t.router, "GET", "/v1/flow/cards/0", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_bad_selection_input() {
    let t = test_app().await;

    let (status, _) = send(
        &t.router,
        "POST",
        "/v1/flow/selection",
        Some(json!({ "tier": "Gold", "count": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &t.router,
        "POST",
        "/v1/flow/selection",
        Some(json!({ "tier": "VIP", "count": 11 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("outside"));
}

#[tokio::test]
async fn test_count_change_keeps_entries_by_index() {
    let t = test_app().await;
    select(&t.router, "Standard", 3).await;
    fill(&t.router, 1, "Alan Turing", "alan@example.com").await;

    let (_, view) = send(&t.router, "PUT", "/v1/flow/count", Some(json!({ "count": 1 }))).await;
    assert_eq!(view["attendees"].as_array().unwrap().len(), 1);

    let (_, view) = send(&t.router, "PUT", "/v1/flow/count", Some(json!({ "count": 2 }))).await;
    assert_eq!(view["attendees"].as_array().unwrap().len(), 2);
    assert_eq!(view["attendees"][1]["fullName"], "Alan Turing");
    assert_eq!(view["quote"]["total_usd"], 100);
}

#[tokio::test]
async fn test_field_errors_show_while_editing() {
    let t = test_app().await;
    select(&t.router, "Standard", 1).await;

    let (status, view) = send(
        &t.router,
        "PATCH",
        "/v1/flow/attendees/0",
        Some(json!({ "email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["errors"]["0"]["email"], "Please enter a valid email address");

    let (status, _) = send(
        &t.router,
        "PATCH",
        "/v1/flow/attendees/5",
        Some(json!({ "fullName": "Nobody" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

async fn post_avatar(router: &Router, index: usize) -> StatusCode {
    let resp = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/v1/flow/attendees/{}/avatar?file_name=ada.png", index))
                .header(header::CONTENT_TYPE, "image/png")
                .body(Body::from(vec![0x89, 0x50, 0x4e, 0x47]))
                .unwrap(),
        )
        .await
        .unwrap();
    resp.status()
}

#[tokio::test]
async fn test_avatar_upload_sets_url() {
    let t = test_app().await;
    select(&t.router, "VIP", 1).await;

    assert_eq!(post_avatar(&t.router, 0).await, StatusCode::ACCEPTED);

    let view = wait_for_flow(&t.router, |v| !v["attendees"][0]["avatarUrl"].is_null()).await;
    assert_eq!(view["attendees"][0]["avatarUrl"], "https://cdn.example.com/avatar.png");
    assert!(view["uploads"].get("0").is_none());
}

#[tokio::test]
async fn test_avatar_upload_failure_is_reported() {
    let t = test_app_with(
        MockAvatarUploader::failing(UploadError::Rejected {
            status: 400,
            body: "Invalid image file".into(),
        }),
        Duration::from_secs(5),
    )
    .await;
    select(&t.router, "VIP", 1).await;
    assert_eq!(post_avatar(&t.router, 0).await, StatusCode::ACCEPTED);

    let view = wait_for_flow(&t.router, |v| v["uploads"]["0"]["state"] == "failed").await;
    assert!(view["uploads"]["0"]["message"].as_str().unwrap().contains("400"));
    assert!(view["attendees"][0]["avatarUrl"].is_null());
    assert_eq!(view["step"], "detailing");
}

#[tokio::test]
async fn test_slow_avatar_upload_times_out() {
    let t = test_app_with(
        MockAvatarUploader::succeeding("https://cdn.example.com/late.png").with_delay(Duration::from_secs(2)),
        Duration::from_millis(20),
    )
    .await;
    select(&t.router, "Standard", 1).await;
    assert_eq!(post_avatar(&t.router, 0).await, StatusCode::ACCEPTED);

    let view = wait_for_flow(&t.router, |v| v["uploads"]["0"]["state"] == "failed").await;
    assert!(view["uploads"]["0"]["message"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_empty_avatar_is_rejected() {
    let t = test_app().await;
    select(&t.router, "Standard", 1).await;

    let resp = t
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/flow/attendees/0/avatar")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_card_print_and_export() {
    let t = test_app().await;
    book(&t.router, "VIP", &["Ada Lovelace"]).await;

    let resp = t
        .router
        .clone()
        .oneshot(Request::builder().uri("/v1/flow/cards/0").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/svg+xml");
    let svg = body_json(resp).await["raw"].as_str().unwrap().to_string();
    assert!(svg.contains("Ada Lovelace"));

    let (status, _) = send(
        &t.router,
        "POST",
        "/v1/flow/cards/0/export",
        Some(json!({ "format": "png" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &t.router,
        "POST",
        "/v1/flow/cards/0/export",
        Some(json!({ "format": "svg" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_name"], "HNG2025_Ada_Lovelace_ID.svg");
    assert!(t.exports.path().join("HNG2025_Ada_Lovelace_ID.svg").exists());

    let (status, _) = send(&t.router, "GET", "/v1/flow/cards/3/qr", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_booking_is_not_found() {
    let t = test_app().await;
    let (status, _) = send(&t.router, "GET", "/v1/bookings/TKT-00000000", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_padded_input_is_saved_trimmed() {
    let t = test_app().await;
    select(&t.router, "VIP", 1).await;
    fill(&t.router, 0, " Ada Lovelace ", " ada@example.com ").await;

    let (status, view) = send(&t.router, "POST", "/v1/flow/submit", None).await;
    assert_eq!(status, StatusCode::OK, "{}", view);

    let reference = view["booking_reference"].as_str().unwrap();
    let (_, stored) = send(&t.router, "GET", &format!("/v1/bookings/{}", reference), None).await;
    assert_eq!(stored["attendees"][0]["email"], "ada@example.com");
    assert_eq!(stored["attendees"][0]["fullName"], "Ada Lovelace");
}

#[tokio::test]
async fn test_submit_during_upload_conflicts() {
    let t = test_app_with(
        MockAvatarUploader::succeeding("https://cdn.example.com/slow.png").with_delay(Duration::from_millis(300)),
        Duration::from_secs(5),
    )
    .await;
    select(&t.router, "Standard", 1).await;
    fill(&t.router, 0, "Ada Lovelace", "ada@example.com").await;
    assert_eq!(post_avatar(&t.router, 0).await, StatusCode::ACCEPTED);

    let (status, body) = send(&t.router, "POST", "/v1/flow/submit", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("still running"));

    wait_for_flow(&t.router, |v| !v["attendees"][0]["avatarUrl"].is_null()).await;
    let (status, view) = send(&t.router, "POST", "/v1/flow/submit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["confirmed"]["attendees"][0]["avatarUrl"], "https://cdn.example.com/slow.png");
}

#[tokio::test]
async fn test_multi_field_patch_for_missing_attendee_changes_nothing() {
    let t = test_app().await;
    select(&t.router, "Standard", 1).await;

    let (status, _) = send(
        &t.router,
        "PATCH",
        "/v1/flow/attendees/3",
        Some(json!({ "fullName": "Ghost", "email": "ghost@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, view) = send(&t.router, "GET", "/v1/flow", None).await;
    assert_eq!(view["attendees"][0]["fullName"], "");
}
