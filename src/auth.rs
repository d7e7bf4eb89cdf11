use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::errors::AppError;
use crate::handlers::AppState;

pub const INTERNAL_KEY_HEADER: &str = "x-internal-key";
pub const LEGACY_KEY_HEADER: &str = "internal_webhook_key";

/// Checks the shared secret against either header spelling.
///
/// Plain equality; this gate is only meant for trusted-network callers.
pub fn validate_internal_key(expected: &str, headers: &HeaderMap) -> Result<(), AppError> {
    let provided = headers
        .get(INTERNAL_KEY_HEADER)
        .or_else(|| headers.get(LEGACY_KEY_HEADER))
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing internal key header".to_string()))?;

    if provided != expected {
        return Err(AppError::Unauthorized("Invalid internal key".to_string()));
    }

    Ok(())
}

/// Middleware guarding every protected route.
pub async fn require_internal_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    validate_internal_key(&state.config.internal_webhook_key, request.headers())?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_accepts_both_header_spellings() {
        let mut headers = HeaderMap::new();
        headers.insert(INTERNAL_KEY_HEADER, HeaderValue::from_static("s3cret"));
        assert!(validate_internal_key("s3cret", &headers).is_ok());

        let mut legacy = HeaderMap::new();
        legacy.insert(LEGACY_KEY_HEADER, HeaderValue::from_static("s3cret"));
        assert!(validate_internal_key("s3cret", &legacy).is_ok());
    }

    #[test]
    fn test_rejects_missing_or_wrong_key() {
        assert!(matches!(
            validate_internal_key("s3cret", &HeaderMap::new()),
            Err(AppError::Unauthorized(_))
        ));

        let mut headers = HeaderMap::new();
        headers.insert(INTERNAL_KEY_HEADER, HeaderValue::from_static("S3CRET"));
        assert!(matches!(
            validate_internal_key("s3cret", &headers),
            Err(AppError::Unauthorized(_))
        ));
    }
}
