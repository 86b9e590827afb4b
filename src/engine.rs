//! The admission engine: extraction, verification, scope reconciliation.

use tracing::debug;

use crate::context::AuthorizationContext;
use crate::credentials::BearerCredentials;
use crate::error::AdmissionError;
use crate::policy::AdmissionPolicy;
use crate::token::{TokenPayload, TokenVerifier};

/// Evaluates one request's bearer credentials against an admission policy.
///
/// Each call to [`admit`](Self::admit) is a single pass through the
/// states below. Terminal outcomes are a built [`AuthorizationContext`]
/// or an [`AdmissionError`]; nothing is retried, and no state is shared
/// across requests.
///
/// ```text
/// Start -> HeaderParsed -> AccessVerified -> ScopeChecked -> Success
///    \          \                \                 \
///     `----------`----------------`-----------------`-------> Fail
/// ```
#[derive(Clone)]
pub struct AdmissionEngine<V> {
    verifier: V,
}

/// Non-terminal admission states. Data verified so far rides along to
/// the next transition.
enum State {
    Start,
    HeaderParsed(BearerCredentials),
    AccessVerified(BearerCredentials, TokenPayload),
    ScopeChecked(BearerCredentials, TokenPayload),
}

impl<V: TokenVerifier> AdmissionEngine<V> {
    /// Create an engine around the given token verifier.
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }

    /// Run the admission check for one request.
    ///
    /// `header` is the raw `Authorization` header value, if any. The
    /// required-scope set is resolved from `policy` before any token
    /// inspection, so a misconfigured policy fails with 400 regardless
    /// of the header, and the challenge on credential failures reflects
    /// the policy even when no credential arrived.
    pub async fn admit(
        &self,
        header: Option<&str>,
        policy: &AdmissionPolicy,
    ) -> Result<AuthorizationContext, AdmissionError> {
        let required = policy.required_scopes()?;

        let mut state = State::Start;
        loop {
            state = match state {
                State::Start => match BearerCredentials::parse(header) {
                    Some(credentials) => State::HeaderParsed(credentials),
                    None => {
                        debug!("missing or malformed bearer credentials");
                        return Err(AdmissionError::InvalidToken { required });
                    }
                },
                State::HeaderParsed(credentials) => {
                    match self.verifier.verify(&credentials.access_token).await {
                        Ok(payload) => State::AccessVerified(credentials, payload),
                        Err(err) => {
                            debug!(error = %err, "access token rejected");
                            return Err(AdmissionError::InvalidToken { required });
                        }
                    }
                }
                State::AccessVerified(credentials, payload) => {
                    let granted = payload.scopes();
                    if let Some(missing) = required.iter().find(|s| !granted.contains(s.as_str())) {
                        debug!(scope = %missing, "required scope not granted");
                        return Err(AdmissionError::InsufficientScope { required });
                    }
                    State::ScopeChecked(credentials, payload)
                }
                State::ScopeChecked(credentials, payload) => {
                    let mut context = AuthorizationContext::new(credentials.access_token, payload);
                    if let Some(token) = credentials.identity_token {
                        // An unusable identity token degrades to "no
                        // identity context" rather than failing admission.
                        match self.verifier.verify(&token).await {
                            Ok(identity) => context = context.with_identity(token, identity),
                            Err(err) => {
                                debug!(error = %err, "identity token rejected, continuing without identity context");
                            }
                        }
                    }
                    return Ok(context);
                }
            };
        }
    }
}
