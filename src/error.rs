//! Admission error taxonomy and bearer challenge construction.
//!
//! Every failed admission resolves to exactly one [`AdmissionError`]
//! variant. The two credential-related variants render an RFC 6750-style
//! challenge for the `WWW-Authenticate` header; a misconfigured policy is
//! a caller bug and carries no challenge.

/// Outcome of a failed admission check.
///
/// Each variant maps to a fixed HTTP status. The 401 variants carry the
/// full required-scope set so the challenge lists exactly what the route
/// demands, even when no credential was presented at all.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdmissionError {
    /// The admission policy itself is malformed (wrongly typed `scope`
    /// or `audience` option). HTTP 400, no challenge.
    #[error("bad request: {reason}")]
    BadRequest {
        /// What was wrong with the policy.
        reason: String,
    },

    /// Missing header, wrong scheme, malformed token count, or an access
    /// token that failed verification. HTTP 401.
    #[error("invalid token (required scopes: {})", .required.join(" "))]
    InvalidToken {
        /// The required-scope set resolved from the policy.
        required: Vec<String>,
    },

    /// The access token verified but is missing one or more required
    /// scopes. HTTP 401.
    #[error("insufficient scope (required scopes: {})", .required.join(" "))]
    InsufficientScope {
        /// The required-scope set resolved from the policy.
        required: Vec<String>,
    },
}

impl AdmissionError {
    /// The HTTP status for this failure: 400 for policy errors, 401 for
    /// credential and scope failures.
    pub fn status_code(&self) -> u16 {
        match self {
            AdmissionError::BadRequest { .. } => 400,
            _ => 401,
        }
    }

    /// The bearer challenge for the `WWW-Authenticate` header, in the
    /// form `Bearer scope="<scopes>", error="<kind>"`.
    ///
    /// [`BadRequest`](AdmissionError::BadRequest) has no challenge.
    pub fn challenge(&self) -> Option<String> {
        let (required, kind) = match self {
            AdmissionError::BadRequest { .. } => return None,
            AdmissionError::InvalidToken { required } => (required, "invalid_token"),
            AdmissionError::InsufficientScope { required } => (required, "insufficient_scope"),
        };
        Some(format!(
            "Bearer scope=\"{}\", error=\"{}\"",
            required.join(" "),
            kind
        ))
    }
}

/// Why a token failed verification.
///
/// Verifier implementations report the reason so it can be logged; the
/// admission outcome is the same `invalid_token` failure either way.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VerifyError {
    /// The token's expiry is in the past.
    #[error("token has expired")]
    Expired,

    /// The token's audience claim is not accepted by the verifier.
    #[error("token audience is not accepted")]
    Audience,

    /// The token is structurally or cryptographically invalid.
    #[error("invalid token: {0}")]
    Invalid(String),
}
