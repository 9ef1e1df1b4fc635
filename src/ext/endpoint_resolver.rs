//! Endpoint resolution seam for callers addressing requests by relative path.
//!
//! The session itself only accepts absolute URLs; resolution from an
//! environment-specific base is a caller concern, and this trait is the seam
//! for it.

// self
use crate::_prelude::*;

/// Resolves relative paths into absolute request URLs.
pub trait EndpointResolver
where
	Self: Send + Sync,
{
	/// Resolves a relative path, e.g. `v1/users?page=2`.
	fn resolve(&self, relative: &str) -> Result<Url, ResolveError>;
}

/// Error returned when a relative path cannot be resolved.
#[derive(Clone, Debug, ThisError)]
pub enum ResolveError {
	/// The path does not join cleanly onto the base URL.
	#[error("Relative path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// The offending relative path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Resolver joining relative paths onto one fixed base URL.
#[derive(Clone, Debug)]
pub struct BaseUrlResolver {
	base: Url,
}
impl BaseUrlResolver {
	/// Creates a resolver over the provided base URL.
	///
	/// Give the base a trailing slash when its last segment should be kept;
	/// `Url::join` semantics apply.
	pub fn new(base: Url) -> Self {
		Self { base }
	}
}
impl EndpointResolver for BaseUrlResolver {
	fn resolve(&self, relative: &str) -> Result<Url, ResolveError> {
		self.base
			.join(relative)
			.map_err(|source| ResolveError::InvalidPath { path: relative.into(), source })
	}
}
