//! Per-route admission policy and required-scope resolution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AdmissionError;

/// Scope every access token must carry, regardless of policy.
pub const DEFAULT_SCOPE: &str = "appid_default";

/// Admission policy for a protected route.
///
/// Both options are open-typed (`serde_json::Value`) because policies are
/// commonly deserialized from route configuration; a wrongly typed value
/// surfaces as a 400 at admission time instead of a deserialization
/// failure far from the route definition.
///
/// - `scope` expands the required-scope set beyond [`DEFAULT_SCOPE`]
///   with a space-separated list of scope identifiers.
/// - `audience` prefixes each `scope` token with `<audience>/`.
///
/// A policy is immutable once passed to the engine; build it with the
/// fluent methods or deserialize it from configuration.
///
/// # Example
///
/// ```rust
/// use tower_appid::AdmissionPolicy;
///
/// let policy = AdmissionPolicy::new().scope("scope1 scope2").audience("app");
/// assert_eq!(
///     policy.required_scopes().unwrap(),
///     ["appid_default", "app/scope1", "app/scope2"],
/// );
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdmissionPolicy {
    /// Extra required scopes, space separated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Value>,

    /// Audience prefix applied to each extra scope token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<Value>,
}

impl AdmissionPolicy {
    /// Policy requiring only [`DEFAULT_SCOPE`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Require extra scopes (space-separated identifiers).
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(Value::String(scope.into()));
        self
    }

    /// Prefix each extra scope token with `<audience>/`.
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(Value::String(audience.into()));
        self
    }

    /// Compute the ordered required-scope set: [`DEFAULT_SCOPE`] first,
    /// then each `scope` token in the order supplied, audience-prefixed
    /// when `audience` is set.
    ///
    /// A whitespace-only `scope` is equivalent to no extra scopes, and a
    /// `null` audience is equivalent to an absent one. The audience
    /// prefix is applied verbatim to every token, including tokens that
    /// already carry a prefix, so callers mixing the two styles end up
    /// with a requirement no token can satisfy.
    pub fn required_scopes(&self) -> Result<Vec<String>, AdmissionError> {
        let scope = match &self.scope {
            None => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(other) => {
                return Err(AdmissionError::BadRequest {
                    reason: format!("scope option must be a string, got {other}"),
                });
            }
        };
        let audience = match &self.audience {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(other) => {
                return Err(AdmissionError::BadRequest {
                    reason: format!("audience option must be a string, got {other}"),
                });
            }
        };

        let mut required = vec![DEFAULT_SCOPE.to_string()];
        for token in scope.unwrap_or_default().split_whitespace() {
            match audience {
                Some(audience) => required.push(format!("{audience}/{token}")),
                None => required.push(token.to_string()),
            }
        }
        Ok(required)
    }
}
