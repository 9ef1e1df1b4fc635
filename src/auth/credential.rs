//! Credential material handled by the auth coordinator.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Opaque access/refresh token pair representing an authenticated session.
///
/// The coordinator never inspects the tokens; validity is judged solely by the
/// injected [`TokenActions`](crate::auth::TokenActions) collaborator, and the
/// pair is replaced wholesale on every successful refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	access: TokenSecret,
	refresh: TokenSecret,
}
impl Credential {
	/// Creates a credential from raw token strings.
	pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
		Self { access: TokenSecret::new(access), refresh: TokenSecret::new(refresh) }
	}

	/// Returns the access token secret.
	pub fn access_token(&self) -> &TokenSecret {
		&self.access
	}

	/// Returns the refresh token secret.
	pub fn refresh_token(&self) -> &TokenSecret {
		&self.refresh
	}
}

/// Raw sign-in material exchanged for a [`Credential`] via
/// [`TokenActions::authenticate`](crate::auth::TokenActions::authenticate).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCredential {
	/// Account identifier.
	pub username: String,
	/// Account secret, redacted in debug output.
	pub password: TokenSecret,
}
impl AuthCredential {
	/// Creates sign-in material from raw strings.
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { username: username.into(), password: TokenSecret::new(password) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn credential_debug_never_leaks_tokens() {
		let credential = Credential::new("access-plain", "refresh-plain");
		let rendered = format!("{credential:?}");

		assert!(!rendered.contains("access-plain"));
		assert!(!rendered.contains("refresh-plain"));
	}

	#[test]
	fn credential_serializes_for_stores() {
		let credential = Credential::new("a", "r");
		let payload = serde_json::to_string(&credential)
			.expect("Credential should serialize for store backends.");
		let round_trip: Credential =
			serde_json::from_str(&payload).expect("Credential should deserialize from stores.");

		assert_eq!(round_trip, credential);
	}
}
