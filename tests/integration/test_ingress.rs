use super::helpers::{
    assert_status, from_peer, read_json, send, spawn_app, spawn_app_with, submission_parts,
    submit_request, tiny_jpeg_bytes,
};
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::Value;

#[tokio::test]
async fn foreign_origin_is_rejected_before_the_handler() {
    let app = spawn_app().await;
    let proof = tiny_jpeg_bytes();
    let mut req = submit_request(&submission_parts(&proof, "image/jpeg"));
    req.headers_mut()
        .insert(header::ORIGIN, "https://evil.example".parse().unwrap());

    let res = send(&app.app, req).await;
    assert_status(res.status(), StatusCode::FORBIDDEN);
    assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    let body: Value = read_json(res).await;
    assert_eq!(body["error"], "Origin not allowed");
    assert!(app.relay.calls().is_empty());
    assert!(app.scratch_files().is_empty());
}

#[tokio::test]
async fn allowed_origin_gets_its_own_cors_header() {
    let app = spawn_app().await;
    let proof = tiny_jpeg_bytes();
    let mut req = submit_request(&submission_parts(&proof, "image/jpeg"));
    req.headers_mut()
        .insert(header::ORIGIN, "http://localhost:3000".parse().unwrap());

    let res = send(&app.app, req).await;
    assert_status(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(app.relay.calls().len(), 1);
}

#[tokio::test]
async fn preflight_from_allowed_origin_is_answered() {
    let app = spawn_app().await;
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/submit-ticket")
        .header(header::ORIGIN, "http://127.0.0.1:5500")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let res = send(&app.app, req).await;
    assert_status(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://127.0.0.1:5500"
    );
    let methods = res.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .to_string();
    assert!(methods.contains("POST"));
    assert!(!methods.contains("GET"));
}

#[tokio::test]
async fn preflight_from_foreign_origin_is_rejected() {
    let app = spawn_app().await;
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/submit-ticket")
        .header(header::ORIGIN, "https://evil.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let res = send(&app.app, req).await;
    assert_status(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn methods_other_than_post_and_options_are_refused() {
    let app = spawn_app().await;
    for method in ["GET", "PUT", "DELETE", "PATCH"] {
        let req = Request::builder()
            .method(method)
            .uri("/api/submit-ticket")
            .body(Body::empty())
            .unwrap();
        let res = send(&app.app, req).await;
        assert_status(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[header::ALLOW], "POST, OPTIONS");
    }
}

#[tokio::test]
async fn security_headers_are_on_every_response() {
    let app = spawn_app().await;

    let ok = send(
        &app.app,
        submit_request(&submission_parts(&tiny_jpeg_bytes(), "image/jpeg")),
    )
    .await;
    let mut rejected_req = Request::builder()
        .method("POST")
        .uri("/api/submit-ticket")
        .body(Body::empty())
        .unwrap();
    rejected_req
        .headers_mut()
        .insert(header::ORIGIN, "https://evil.example".parse().unwrap());
    let rejected = send(&app.app, rejected_req).await;

    for res in [&ok, &rejected] {
        let headers = res.headers();
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::REFERRER_POLICY], "no-referrer");
        assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
        assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(headers.contains_key("x-request-id"));
    }
}

#[tokio::test]
async fn client_past_the_hourly_limit_is_throttled() {
    let app = spawn_app_with(false, 100).await;

    for i in 0..100 {
        let req = from_peer(
            submit_request(&[super::helpers::Part::Text("name", "Ann")]),
            "198.51.100.7:40000",
        );
        let res = send(&app.app, req).await;
        assert_status(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            res.headers()["x-ratelimit-remaining"],
            (99 - i).to_string().as_str()
        );
    }

    let proof = tiny_jpeg_bytes();
    let req = from_peer(
        submit_request(&submission_parts(&proof, "image/jpeg")),
        "198.51.100.7:40001",
    );
    let res = send(&app.app, req).await;
    assert_status(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(res.headers()["x-ratelimit-limit"], "100");
    assert!(app.relay.calls().is_empty());
    assert!(app.scratch_files().is_empty());

    let other = from_peer(
        submit_request(&submission_parts(&proof, "image/jpeg")),
        "203.0.113.1:40000",
    );
    let res = send(&app.app, other).await;
    assert_status(res.status(), StatusCode::OK);
}
