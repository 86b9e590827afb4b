//! # tower-appid
//!
//! Tower-native bearer-token admission middleware for OAuth2/OIDC
//! resource servers.
//!
//! Given an incoming HTTP request, the middleware decides whether the
//! caller presents a valid, unexpired, correctly scoped access token.
//! On success it attaches the decoded claims (and, when one is
//! presented, a companion identity token) to the request as an
//! [`AuthorizationContext`]; on failure it answers with 401 and an
//! RFC 6750 bearer challenge, or 400 for a misconfigured policy.
//!
//! ## How admission works
//!
//! 1. The required-scope set is resolved from the route's
//!    [`AdmissionPolicy`]: the default scope `appid_default` first, then
//!    any policy scopes, each prefixed with `<audience>/` when an
//!    audience is configured.
//! 2. The `Authorization` header is parsed into
//!    [`BearerCredentials`]: `Bearer <access_token>` or
//!    `Bearer <access_token> <identity_token>`.
//! 3. The access token is verified through the injected
//!    [`TokenVerifier`].
//! 4. Every required scope must appear, as an exact string, in the
//!    token's space-separated `scope` claim.
//! 5. The identity token, if present, is verified best-effort: when it
//!    is missing or invalid the request still succeeds, just without an
//!    identity context.
//!
//! ## Quick start
//!
//! ```rust
//! use axum::{routing::get, Router};
//! use tower_appid::{AdmissionLayer, AdmissionPolicy, JwtVerifier};
//!
//! let verifier = JwtVerifier::from_secret(b"shared-secret")
//!     .expected_issuer("https://auth.example.com");
//!
//! let layer = AdmissionLayer::new(verifier)
//!     .policy(AdmissionPolicy::new().scope("read write").audience("app"));
//!
//! let app: Router = Router::new()
//!     .route("/protected", get(|| async { "ok" }))
//!     .layer(layer);
//! ```
//!
//! Handlers read the caller's identity from request extensions:
//!
//! ```rust
//! use axum::extract::Request;
//! use tower_appid::AuthorizationContext;
//!
//! fn subject(req: &Request) -> Option<String> {
//!     let ctx = req.extensions().get::<AuthorizationContext>()?;
//!     ctx.access_token_payload.sub.clone()
//! }
//! ```
//!
//! ## Key types
//!
//! - [`AdmissionLayer`] / [`AdmissionService`]: the tower middleware
//! - [`AdmissionEngine`]: the transport-free admission check, usable
//!   directly for non-HTTP integration or testing
//! - [`AdmissionPolicy`]: per-route required scopes and audience
//! - [`TokenVerifier`]: pluggable verification capability, with
//!   [`JwtVerifier`] (static-key JWTs) and [`StaticTokenVerifier`]
//!   (canned payloads) provided
//! - [`AuthorizationContext`]: what downstream handlers get on success
//!
//! Verification of a token is a suspension point: the verifier may fetch
//! signing keys over the network. The engine holds no state across
//! requests and never retries a failed admission; bound a slow verifier
//! with a caller-side timeout layer such as `tower::timeout`.

pub mod context;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod policy;
pub mod token;

pub use context::AuthorizationContext;
pub use credentials::BearerCredentials;
pub use engine::AdmissionEngine;
pub use error::{AdmissionError, VerifyError};
pub use middleware::{AdmissionLayer, AdmissionService};
pub use policy::{AdmissionPolicy, DEFAULT_SCOPE};
pub use token::{Audience, JwtVerifier, StaticTokenVerifier, TokenPayload, TokenVerifier};

/// Boxed error type used in middleware trait bounds.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
