//! Token payloads and verification.
//!
//! [`TokenVerifier`] is the injectable verification capability: the
//! admission engine only ever sees `verify(token) -> payload | error`, so
//! cryptographic and key-management concerns stay behind the trait and
//! the engine can be tested with canned payloads. [`JwtVerifier`] is the
//! shipped JWT implementation with static keys; key retrieval (JWKS
//! fetch, rotation, caching) belongs to the caller.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::VerifyError;

/// Audience claim value, either a single string or an array of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// A single audience string.
    One(String),
    /// Multiple audience strings.
    Many(Vec<String>),
}

impl Audience {
    /// Check whether the audience contains a specific value.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Audience::One(s) => s == value,
            Audience::Many(v) => v.iter().any(|s| s == value),
        }
    }
}

/// Decoded claims of a verified token.
///
/// Standard JWT claims are typed; everything else lands in `extra`. The
/// payload lives for one request and is attached to the
/// [`AuthorizationContext`](crate::AuthorizationContext) on success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Issuer URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject (user or client identifier).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Audience the token was issued for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Expiration time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    /// Issued-at time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    /// Space-separated granted scope identifiers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Claims not covered by the standard fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl TokenPayload {
    /// The granted scopes as a set of identifiers.
    ///
    /// An absent `scope` claim yields the empty set.
    pub fn scopes(&self) -> HashSet<String> {
        self.scope
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .map(String::from)
            .collect()
    }

    /// Exact-match membership in the granted scope set.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes().contains(scope)
    }
}

/// Trait for verifying bearer tokens.
///
/// Implementations may be asynchronous (for example, fetching signing
/// keys over the network); the engine awaits each verification before
/// proceeding. Implement this to plug in JWT verification, token
/// introspection, or an opaque token lookup.
///
/// # Example
///
/// ```rust
/// use tower_appid::{TokenPayload, TokenVerifier, VerifyError};
///
/// #[derive(Clone)]
/// struct AlwaysValid;
///
/// impl TokenVerifier for AlwaysValid {
///     async fn verify(&self, _token: &str) -> Result<TokenPayload, VerifyError> {
///         Ok(TokenPayload {
///             scope: Some("appid_default".to_string()),
///             ..Default::default()
///         })
///     }
/// }
/// ```
pub trait TokenVerifier: Clone + Send + Sync + 'static {
    /// Verify a compact token string and return its decoded payload.
    fn verify(&self, token: &str)
        -> impl Future<Output = Result<TokenPayload, VerifyError>> + Send;
}

/// JWT verifier using static keys.
///
/// Verifies JWTs with pre-configured decoding keys. Supports HMAC, RSA,
/// and EC algorithms via the `jsonwebtoken` crate.
///
/// # Example
///
/// ```rust
/// use tower_appid::JwtVerifier;
///
/// let verifier = JwtVerifier::from_secret(b"shared-secret")
///     .expected_issuer("https://auth.example.com")
///     .expected_audience("https://api.example.com");
/// ```
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtVerifier {
    /// Build the base `Validation` for an algorithm.
    ///
    /// `jsonwebtoken` validates the audience and requires an `exp` claim
    /// by default; both are opt-in here through
    /// [`expected_audience`](Self::expected_audience) and the issuer's
    /// own claim set.
    fn base_validation(algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation
    }

    /// Create a verifier from an HMAC secret.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            validation: Arc::new(Self::base_validation(Algorithm::HS256)),
        }
    }

    /// Create a verifier from an RSA PEM-encoded public key.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM data is invalid.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self {
            decoding_key: Arc::new(DecodingKey::from_rsa_pem(pem)?),
            validation: Arc::new(Self::base_validation(Algorithm::RS256)),
        })
    }

    /// Create a verifier from an EC PEM-encoded public key.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM data is invalid.
    pub fn from_ec_pem(pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self {
            decoding_key: Arc::new(DecodingKey::from_ec_pem(pem)?),
            validation: Arc::new(Self::base_validation(Algorithm::ES256)),
        })
    }

    /// Require a matching `aud` claim.
    pub fn expected_audience(mut self, audience: &str) -> Self {
        let mut validation = (*self.validation).clone();
        validation.set_audience(&[audience]);
        self.validation = Arc::new(validation);
        self
    }

    /// Require a matching `iss` claim.
    pub fn expected_issuer(mut self, issuer: &str) -> Self {
        let mut validation = (*self.validation).clone();
        validation.set_issuer(&[issuer]);
        self.validation = Arc::new(validation);
        self
    }

    /// Disable expiration validation.
    ///
    /// Use with caution: tokens without expiration checks may be reused
    /// indefinitely.
    pub fn disable_exp_validation(mut self) -> Self {
        let mut validation = (*self.validation).clone();
        validation.validate_exp = false;
        self.validation = Arc::new(validation);
        self
    }

    /// Set the allowed signing algorithms.
    pub fn algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        let mut validation = (*self.validation).clone();
        validation.algorithms = algorithms;
        self.validation = Arc::new(validation);
        self
    }
}

impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<TokenPayload, VerifyError> {
        let data = jsonwebtoken::decode::<TokenPayload>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => VerifyError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidAudience => VerifyError::Audience,
                _ => VerifyError::Invalid(e.to_string()),
            })?;
        Ok(data.claims)
    }
}

/// Verifier backed by a fixed token-to-payload map.
///
/// Any token not in the map fails verification. Useful behind a trusted
/// gateway that has already checked signatures, and for deterministic
/// tests with canned payloads.
///
/// # Example
///
/// ```rust
/// use tower_appid::{StaticTokenVerifier, TokenPayload};
///
/// let verifier = StaticTokenVerifier::new().token(
///     "access_token",
///     TokenPayload {
///         scope: Some("appid_default".to_string()),
///         ..Default::default()
///     },
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    payloads: Arc<HashMap<String, TokenPayload>>,
}

impl StaticTokenVerifier {
    /// Create an empty verifier that rejects every token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a token string to the payload it decodes to.
    pub fn token(mut self, token: impl Into<String>, payload: TokenPayload) -> Self {
        Arc::make_mut(&mut self.payloads).insert(token.into(), payload);
        self
    }
}

impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<TokenPayload, VerifyError> {
        self.payloads
            .get(token)
            .cloned()
            .ok_or_else(|| VerifyError::Invalid("unknown token".to_string()))
    }
}
