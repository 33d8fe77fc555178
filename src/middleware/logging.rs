use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{error, info, warn};

/// Attached to error responses so the request log carries the real cause,
/// even when the body sent to the client is redacted.
#[derive(Clone, Debug)]
pub struct LoggedError(pub String);

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed = start.elapsed();

    match response.extensions().get::<LoggedError>() {
        Some(LoggedError(cause)) if status.is_server_error() => error!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            cause = %cause,
            "Failed to process request"
        ),
        Some(LoggedError(cause)) => warn!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            cause = %cause,
            "Rejected request"
        ),
        None => info!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Processed request"
        ),
    }

    response
}
