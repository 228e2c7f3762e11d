use super::{
    handlers::submit_ticket,
    middleware::{
        ingress::{method_guard, origin_guard},
        logging::logging_middleware,
        rate_limit::rate_limit_middleware,
        request_id::request_id_middleware,
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::post,
};
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

/// Whole-request cap. Kept above the proof limit so oversized files reach the upload policy.
pub const MAX_REQUEST_BODY_BYTES: usize = 10 * 1024 * 1024;

fn security_headers() -> [(HeaderName, HeaderValue); 9] {
    [
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ),
        (
            header::X_DNS_PREFETCH_CONTROL,
            HeaderValue::from_static("off"),
        ),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("x-permitted-cross-domain-policies"),
            HeaderValue::from_static("none"),
        ),
        (
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        ),
    ]
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}

/// Headers the submission route sends to its own frontend. The ingress CORS layer runs
/// later on the way out and overrides these whenever it answers for the request's origin.
fn submission_cors_headers(state: &AppState) -> [(HeaderName, HeaderValue); 3] {
    let frontend = HeaderValue::from_str(&state.config.frontend_origin)
        .unwrap_or_else(|_| HeaderValue::from_static("null"));
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, frontend),
        (
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST"),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ),
    ]
}

pub fn create_router(state: AppState) -> Router {
    let mut submit_routes =
        Router::new().route("/api/submit-ticket", post(submit_ticket::submit_ticket));
    for (name, value) in submission_cors_headers(&state) {
        submit_routes = submit_routes.route_layer(SetResponseHeaderLayer::if_not_present(name, value));
    }

    // Layers run outermost-last: security headers wrap everything, then request id,
    // origin check, CORS (answers preflights), rate limit, method check.
    let mut app = Router::new()
        .merge(submit_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(middleware::from_fn(method_guard))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors_layer(&state))
        .layer(middleware::from_fn_with_state(state.clone(), origin_guard))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state);

    for (name, value) in security_headers() {
        app = app.layer(SetResponseHeaderLayer::overriding(name, value));
    }
    app
}
