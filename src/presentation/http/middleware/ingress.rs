use axum::{
    extract::{Request, State},
    http::{Method, header},
    middleware::Next,
    response::Response,
};

use crate::presentation::http::{errors::AppError, state::AppState};

/// Requests that declare an `Origin` outside the allow-list stop here.
/// Requests without one (curl, server-to-server) pass.
pub async fn origin_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(origin) = request.headers().get(header::ORIGIN) {
        let allowed = origin
            .to_str()
            .map(|origin| state.config.allowed_origins.iter().any(|o| o == origin))
            .unwrap_or(false);
        if !allowed {
            tracing::warn!(origin = ?origin, "Request from disallowed origin");
            return Err(AppError::Forbidden("Origin not allowed".into()));
        }
    }
    Ok(next.run(request).await)
}

pub async fn method_guard(request: Request, next: Next) -> Result<Response, AppError> {
    if request.method() != Method::POST && request.method() != Method::OPTIONS {
        return Err(AppError::MethodNotAllowed);
    }
    Ok(next.run(request).await)
}
