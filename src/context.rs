//! The per-request authorization context attached on successful admission.

use serde::Serialize;

use crate::token::TokenPayload;

/// Attributes attached to a request once admission succeeds.
///
/// Downstream handlers read the caller's identity and granted scopes from
/// here instead of re-parsing tokens. The identity fields are set only
/// when an identity token was presented and verified; an absent or
/// invalid identity token leaves them unset without failing admission.
///
/// The context exists if and only if admission succeeded, is attached
/// once, and is never mutated afterward.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationContext {
    /// The verified access token, as presented.
    pub access_token: String,
    /// Decoded claims of the access token.
    pub access_token_payload: TokenPayload,
    /// The verified identity token, if one was presented and valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_token: Option<String>,
    /// Decoded claims of the identity token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_token_payload: Option<TokenPayload>,
}

impl AuthorizationContext {
    pub(crate) fn new(access_token: String, access_token_payload: TokenPayload) -> Self {
        Self {
            access_token,
            access_token_payload,
            identity_token: None,
            identity_token_payload: None,
        }
    }

    pub(crate) fn with_identity(mut self, token: String, payload: TokenPayload) -> Self {
        self.identity_token = Some(token);
        self.identity_token_payload = Some(payload);
        self
    }

    /// The verified identity payload, when one was attached.
    ///
    /// `None` means "no identity context", not an error.
    pub fn identity_payload(&self) -> Option<&TokenPayload> {
        self.identity_token_payload.as_ref()
    }
}
