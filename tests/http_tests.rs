mod common;

use axum::http::{StatusCode, header};
use harvesthub::app::error::RETRY_LATER;
use serde_json::json;
use uuid::Uuid;

use common::{demo_catalog, empty_request, json_request, offline_app, send, write_cart};

async fn open_session(app: &axum::Router) -> Uuid {
    let (status, body) = send(app, empty_request("POST", "/carts")).await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["session_id"]
        .as_str()
        .and_then(|raw| raw.parse().ok())
        .unwrap()
}

#[tokio::test]
async fn new_cart_sessions_start_empty() {
    let (app, _carts) = offline_app().await;
    let session = open_session(&app).await;

    let (status, body) = send(&app, empty_request("GET", &format!("/carts/{}", session))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 0);
    assert_eq!(body["data"]["lines"], json!([]));
}

#[tokio::test]
async fn unknown_cart_sessions_are_not_found() {
    let (app, _carts) = offline_app().await;

    let (status, _) = send(
        &app,
        empty_request("GET", &format!("/carts/{}", Uuid::new_v4())),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn checkout_of_an_empty_cart_is_a_bad_request() {
    let (app, _carts) = offline_app().await;
    let session = open_session(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/carts/{}/checkout", session),
            json!({
                "name": "Ana Farmer",
                "email": "ana@example.com",
                "phone": "555-0100",
                "address": "12 Orchard Lane",
                "city": "Springfield",
                "zip_code": "12345"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Your cart is empty");
}

fn delivery_json(email: &str) -> serde_json::Value {
    json!({
        "name": "Ana Farmer",
        "email": email,
        "phone": "555-0100",
        "address": "12 Orchard Lane",
        "city": "Springfield",
        "zip_code": "12345"
    })
}

#[tokio::test]
async fn checkout_with_bad_details_is_unprocessable_and_keeps_the_cart() {
    let (app, carts) = offline_app().await;
    let session = open_session(&app).await;
    let catalog = demo_catalog();
    write_cart(&carts, session, &[(&catalog.apples, 5)]);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/carts/{}/checkout", session),
            delivery_json("not-an-email"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["data"],
        json!([{ "field": "email", "message": "Invalid email address" }])
    );

    let (_, body) = send(&app, empty_request("GET", &format!("/carts/{}", session))).await;
    assert_eq!(body["data"]["total_items"], 5);
}

#[tokio::test]
async fn checkout_with_unverifiable_products_is_a_conflict() {
    let (app, carts) = offline_app().await;
    let session = open_session(&app).await;
    let catalog = demo_catalog();
    write_cart(&carts, session, &[(&catalog.apples, 5)]);

    // The database is unreachable, so the product cannot be confirmed.
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/carts/{}/checkout", session),
            delivery_json("ana@example.com"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Some products are no longer available: Apples");

    let (_, body) = send(&app, empty_request("GET", &format!("/carts/{}", session))).await;
    assert_eq!(body["data"]["total_items"], 5);
}

#[tokio::test]
async fn cart_edits_and_session_removal() {
    let (app, _carts) = offline_app().await;
    let session = open_session(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/carts/{}/items/7", session),
            json!({ "quantity": 3 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 0);

    let (status, _) = send(
        &app,
        empty_request("DELETE", &format!("/carts/{}/items/7", session)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        empty_request("DELETE", &format!("/carts/{}/items", session)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, empty_request("DELETE", &format!("/carts/{}", session))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, empty_request("GET", &format!("/carts/{}", session))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_tracking_code_is_a_bad_request() {
    let (app, _carts) = offline_app().await;

    let (status, body) = send(&app, empty_request("GET", "/tracking/%20%20")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please enter a tracking ID");
}

#[tokio::test]
async fn admin_routes_require_a_bearer_token() {
    let (app, _carts) = offline_app().await;

    for uri in ["/admin/dashboard", "/admin/orders", "/admin/products", "/admin/me"] {
        let (status, _) = send(&app, empty_request("GET", uri)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn unreachable_identity_provider_is_a_retry_later() {
    let (app, _carts) = offline_app().await;
    let mut request = empty_request("GET", "/admin/dashboard");
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer some.jwt.token".parse().unwrap());

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], RETRY_LATER);
}

#[tokio::test]
async fn login_requires_both_fields() {
    let (app, _carts) = offline_app().await;

    let (status, body) = send(
        &app,
        json_request("POST", "/admin/login", json!({ "email": " ", "password": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
}
