//! Bearer credential extraction from the `Authorization` header.
//!
//! A request may carry one or two whitespace-separated tokens after the
//! `Bearer ` scheme prefix: the access token, optionally followed by an
//! identity token. Any other shape is malformed.

/// Tokens extracted from an `Authorization: Bearer ...` header.
///
/// The access token always gates admission. The identity token, when
/// present, is verified best-effort and only enriches the resulting
/// [`AuthorizationContext`](crate::AuthorizationContext); it never fails
/// the request on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerCredentials {
    /// The access token presented by the caller.
    pub access_token: String,
    /// The identity token presented alongside the access token, if any.
    pub identity_token: Option<String>,
}

impl BearerCredentials {
    /// Parse an `Authorization` header value into bearer credentials.
    ///
    /// Returns `None` when the header is absent, does not use the
    /// `Bearer ` scheme, or carries anything other than one or two
    /// whitespace-separated tokens.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tower_appid::BearerCredentials;
    ///
    /// let creds = BearerCredentials::parse(Some("Bearer access id")).unwrap();
    /// assert_eq!(creds.access_token, "access");
    /// assert_eq!(creds.identity_token.as_deref(), Some("id"));
    ///
    /// assert!(BearerCredentials::parse(Some("Basic dXNlcjpwYXNz")).is_none());
    /// ```
    pub fn parse(header: Option<&str>) -> Option<Self> {
        let rest = header?.strip_prefix("Bearer ")?;
        let mut parts = rest.split_whitespace();
        let access_token = parts.next()?.to_string();
        let identity_token = parts.next().map(String::from);
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            access_token,
            identity_token,
        })
    }
}
