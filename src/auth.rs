use crate::{config::Config, error::AppError};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";

/// Authentication middleware.
///
/// The `Authorization` header must be exactly `Bearer <shared_secret>`. This is a plain
/// string comparison against one static secret; it makes no timing-safety claims.
pub async fn auth_middleware(
    State(config): State<Arc<Config>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default());

    match auth_header {
        None => Err(AppError::Unauthorized(
            "Missing Authorization header".to_string(),
        )),
        Some(value) if is_authorized(value, &config.auth.shared_secret) => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized(
            "Bearer token does not match".to_string(),
        )),
    }
}

/// Compare a raw `Authorization` header value against the configured secret
pub fn is_authorized(header_value: &str, shared_secret: &str) -> bool {
    header_value
        .strip_prefix(BEARER_PREFIX)
        .is_some_and(|token| token == shared_secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, AzureConfig, MetricsConfig, ServerConfig};
    use axum::{body::Body, http::StatusCode, middleware, routing::post, Router};
    use tower::ServiceExt;

    fn create_test_config(secret: &str) -> Arc<Config> {
        Arc::new(Config {
            server: ServerConfig::default(),
            azure: AzureConfig {
                endpoint: "https://example.openai.azure.com".to_string(),
                api_key: "azure-key".to_string(),
                ..AzureConfig::default()
            },
            auth: AuthConfig {
                shared_secret: secret.to_string(),
            },
            models: Vec::new(),
            metrics: MetricsConfig::default(),
        })
    }

    fn app(secret: &str) -> Router {
        let config = create_test_config(secret);
        Router::new()
            .route("/test", post(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(config, auth_middleware))
    }

    async fn status_for(secret: &str, header: Option<&str>) -> StatusCode {
        let mut builder = axum::http::Request::builder().method("POST").uri("/test");
        if let Some(header) = header {
            builder = builder.header("Authorization", header);
        }
        let request = builder.body(Body::empty()).unwrap();

        app(secret).oneshot(request).await.unwrap().status()
    }

    #[test]
    fn test_is_authorized_exact_match() {
        assert!(is_authorized("Bearer s3cret", "s3cret"));
        assert!(!is_authorized("Bearer s3cret ", "s3cret"));
        assert!(!is_authorized("bearer s3cret", "s3cret"));
        assert!(!is_authorized("s3cret", "s3cret"));
        assert!(!is_authorized("Bearer other", "s3cret"));
    }

    #[test]
    fn test_empty_secret_is_a_valid_value() {
        assert!(is_authorized("Bearer ", ""));
        assert!(!is_authorized("Bearer x", ""));
    }

    #[tokio::test]
    async fn test_auth_middleware_valid_token() {
        assert_eq!(status_for("s3cret", Some("Bearer s3cret")).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_middleware_wrong_token() {
        assert_eq!(
            status_for("s3cret", Some("Bearer nope")).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_auth_middleware_missing_header() {
        assert_eq!(status_for("s3cret", None).await, StatusCode::UNAUTHORIZED);
    }
}
