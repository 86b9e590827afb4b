//! Tower middleware wiring the admission engine into an HTTP service.
//!
//! Provides [`AdmissionLayer`] and [`AdmissionService`]: per-request
//! bearer-token admission at the HTTP boundary, with the challenge
//! surfaced through the `WWW-Authenticate` header and the
//! [`AuthorizationContext`](crate::AuthorizationContext) injected into
//! request extensions on success.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::Layer;
use tracing::debug;

use crate::engine::AdmissionEngine;
use crate::error::AdmissionError;
use crate::policy::AdmissionPolicy;
use crate::token::TokenVerifier;

/// Tower layer that gates requests behind the bearer-token admission
/// check.
///
/// Wraps services in [`AdmissionService`]. Each protected route gets its
/// own layer carrying its [`AdmissionPolicy`]. Requests that pass are
/// forwarded with the [`AuthorizationContext`](crate::AuthorizationContext)
/// in their extensions; requests that fail are answered directly with
/// 400 or 401.
///
/// # Example
///
/// ```rust
/// use axum::{routing::get, Router};
/// use tower_appid::{AdmissionLayer, AdmissionPolicy, JwtVerifier};
///
/// let verifier = JwtVerifier::from_secret(b"shared-secret")
///     .expected_issuer("https://auth.example.com");
///
/// let layer = AdmissionLayer::new(verifier)
///     .policy(AdmissionPolicy::new().scope("read write").audience("app"));
///
/// let app: Router = Router::new()
///     .route("/protected", get(|| async { "ok" }))
///     .layer(layer);
/// ```
#[derive(Clone)]
pub struct AdmissionLayer<V> {
    engine: AdmissionEngine<V>,
    policy: AdmissionPolicy,
}

impl<V: TokenVerifier> AdmissionLayer<V> {
    /// Gate requests with `verifier`, requiring only the default scope.
    pub fn new(verifier: V) -> Self {
        Self {
            engine: AdmissionEngine::new(verifier),
            policy: AdmissionPolicy::new(),
        }
    }

    /// Apply a per-route admission policy.
    pub fn policy(mut self, policy: AdmissionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl<S, V: TokenVerifier> Layer<S> for AdmissionLayer<V> {
    type Service = AdmissionService<S, V>;

    fn layer(&self, inner: S) -> Self::Service {
        AdmissionService {
            inner,
            engine: self.engine.clone(),
            policy: self.policy.clone(),
        }
    }
}

/// Tower service that runs the admission check on each request.
///
/// Created by [`AdmissionLayer`]. For each incoming request:
///
/// 1. Reads the `Authorization` header (header lookup is
///    case-insensitive per HTTP semantics)
/// 2. Runs the [`AdmissionEngine`] against the configured policy
/// 3. On success, injects [`AuthorizationContext`](crate::AuthorizationContext)
///    into request extensions and forwards to the inner service
/// 4. On failure, responds with the error's status and, for 401s, the
///    bearer challenge in `WWW-Authenticate`
#[derive(Clone)]
pub struct AdmissionService<S, V> {
    inner: S,
    engine: AdmissionEngine<V>,
    policy: AdmissionPolicy,
}

impl<S, V> tower_service::Service<Request<Body>> for AdmissionService<S, V>
where
    S: tower_service::Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<crate::BoxError> + Send,
    V: TokenVerifier,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let authorization = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let engine = self.engine.clone();
        let policy = self.policy.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match engine.admit(authorization.as_deref(), &policy).await {
                Ok(context) => {
                    let mut req = req;
                    req.extensions_mut().insert(context);
                    inner.call(req).await
                }
                Err(error) => {
                    debug!(status = error.status_code(), "request not admitted");
                    Ok(admission_error_response(&error))
                }
            }
        })
    }
}

/// Build the HTTP response for a failed admission.
///
/// 401 responses carry the bearer challenge in `WWW-Authenticate`; 400
/// responses carry only the status.
fn admission_error_response(error: &AdmissionError) -> Response {
    let status = match error.status_code() {
        400 => StatusCode::BAD_REQUEST,
        _ => StatusCode::UNAUTHORIZED,
    };

    let mut response = status.into_response();
    if let Some(challenge) = error.challenge() {
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            challenge
                .parse()
                .unwrap_or_else(|_| HeaderValue::from_static("Bearer")),
        );
    }
    response
}
