//! End-to-end admission tests over the tower middleware with real
//! HS256-signed tokens.
//!
//! These exercise the whole path: header parsing, JWT verification via
//! [`JwtVerifier`], scope reconciliation, and context injection, using
//! fixture tokens signed on the fly.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::json;
use tower::{Layer, ServiceExt};
use tower_appid::{AdmissionLayer, AdmissionPolicy, AuthorizationContext, JwtVerifier};
use tower_service::Service;

const SECRET: &[u8] = b"integration-test-secret";

fn sign(claims: &serde_json::Value) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(SECRET),
    )
    .unwrap()
}

fn verifier() -> JwtVerifier {
    JwtVerifier::from_secret(SECRET).disable_exp_validation()
}

/// Inner service returning 200, or 500 when the probe closure rejects
/// the request's authorization context.
#[derive(Clone)]
struct Probe(fn(Option<&AuthorizationContext>) -> bool);

impl Service<Request<Body>> for Probe {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let ok = (self.0)(req.extensions().get::<AuthorizationContext>());
        Box::pin(async move {
            let status = if ok {
                StatusCode::OK
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            Ok(status.into_response())
        })
    }
}

fn any_context(_: Option<&AuthorizationContext>) -> bool {
    true
}

#[tokio::test]
async fn signed_token_with_required_scopes_is_admitted() {
    let access = sign(&json!({
        "sub": "user123",
        "scope": "appid_default app/read app/write",
    }));

    let layer = AdmissionLayer::new(verifier())
        .policy(AdmissionPolicy::new().scope("read write").audience("app"));
    let mut service = layer.layer(Probe(any_context));

    let req = Request::builder()
        .uri("/protected")
        .header("Authorization", format!("Bearer {access}"))
        .body(Body::empty())
        .unwrap();

    let resp = service.ready().await.unwrap().call(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn identity_token_claims_reach_the_handler() {
    let access = sign(&json!({"sub": "client-1", "scope": "appid_default"}));
    let identity = sign(&json!({
        "sub": "user123",
        "scope": "appid_default",
        "email": "user@example.com",
    }));

    fn probe(ctx: Option<&AuthorizationContext>) -> bool {
        let Some(ctx) = ctx else { return false };
        let Some(identity) = ctx.identity_payload() else {
            return false;
        };
        identity.sub.as_deref() == Some("user123")
            && identity.extra["email"] == serde_json::json!("user@example.com")
    }

    let layer = AdmissionLayer::new(verifier());
    let mut service = layer.layer(Probe(probe));

    let req = Request::builder()
        .uri("/protected")
        .header("Authorization", format!("Bearer {access} {identity}"))
        .body(Body::empty())
        .unwrap();

    let resp = service.ready().await.unwrap().call(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn garbage_identity_token_still_admits_without_identity() {
    let access = sign(&json!({"sub": "client-1", "scope": "appid_default"}));

    fn probe(ctx: Option<&AuthorizationContext>) -> bool {
        ctx.is_some_and(|ctx| ctx.identity_payload().is_none())
    }

    let layer = AdmissionLayer::new(verifier());
    let mut service = layer.layer(Probe(probe));

    let req = Request::builder()
        .uri("/protected")
        .header("Authorization", format!("Bearer {access} not-a-jwt"))
        .body(Body::empty())
        .unwrap();

    let resp = service.ready().await.unwrap().call(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_access_token_is_rejected_as_invalid() {
    let access = sign(&json!({"sub": "user123", "scope": "appid_default", "exp": 0}));

    // Expiry validation on, unlike the other tests.
    let layer = AdmissionLayer::new(JwtVerifier::from_secret(SECRET));
    let mut service = layer.layer(Probe(any_context));

    let req = Request::builder()
        .uri("/protected")
        .header("Authorization", format!("Bearer {access}"))
        .body(Body::empty())
        .unwrap();

    let resp = service.ready().await.unwrap().call(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers().get("WWW-Authenticate").unwrap(),
        "Bearer scope=\"appid_default\", error=\"invalid_token\""
    );
}

#[tokio::test]
async fn token_signed_with_other_key_is_rejected() {
    let access = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({"sub": "user123", "scope": "appid_default"}),
        &EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();

    let layer = AdmissionLayer::new(verifier());
    let mut service = layer.layer(Probe(any_context));

    let req = Request::builder()
        .uri("/protected")
        .header("Authorization", format!("Bearer {access}"))
        .body(Body::empty())
        .unwrap();

    let resp = service.ready().await.unwrap().call(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_scopes_produce_the_full_challenge() {
    let access = sign(&json!({"sub": "user123", "scope": "appid_default app/scope1"}));

    let layer = AdmissionLayer::new(verifier())
        .policy(AdmissionPolicy::new().scope("scope1 scope2").audience("app"));
    let mut service = layer.layer(Probe(any_context));

    let req = Request::builder()
        .uri("/protected")
        .header("Authorization", format!("Bearer {access}"))
        .body(Body::empty())
        .unwrap();

    let resp = service.ready().await.unwrap().call(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers().get("WWW-Authenticate").unwrap(),
        "Bearer scope=\"appid_default app/scope1 app/scope2\", error=\"insufficient_scope\""
    );
}

#[tokio::test]
async fn policy_from_configuration_with_wrong_type_fails_400() {
    let access = sign(&json!({"sub": "user123", "scope": "appid_default"}));

    let policy: AdmissionPolicy = serde_json::from_value(json!({"scope": 42})).unwrap();
    let layer = AdmissionLayer::new(verifier()).policy(policy);
    let mut service = layer.layer(Probe(any_context));

    let req = Request::builder()
        .uri("/protected")
        .header("Authorization", format!("Bearer {access}"))
        .body(Body::empty())
        .unwrap();

    let resp = service.ready().await.unwrap().call(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(!resp.headers().contains_key("WWW-Authenticate"));
}
