//! Caller identity extracted from gateway headers.
//!
//! The API gateway authenticates the user and forwards their email in
//! `X-User-Email`. The header is trusted as-is; permissions are resolved per
//! request from it.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

pub const CALLER_EMAIL_HEADER: &str = "x-user-email";

#[derive(Debug, Clone)]
pub struct Caller {
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(CALLER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!("Missing X-User-Email header"))
            })?;

        tracing::Span::current().record("user_email", email);

        Ok(Caller {
            email: email.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<Caller, AppError> {
        let (mut parts, _) = req.into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let err = extract(Request::builder().body(()).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = extract(
            Request::builder()
                .header(CALLER_EMAIL_HEADER, "   ")
                .body(())
                .unwrap(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_email_is_read() {
        let caller = extract(
            Request::builder()
                .header("X-User-Email", " clerk@shop.test ")
                .body(())
                .unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(caller.email, "clerk@shop.test");
    }
}
