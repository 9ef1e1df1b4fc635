//! Token-action boundary the auth coordinator delegates to.

// self
use crate::{
	_prelude::*,
	auth::{AuthCredential, Credential},
};

/// Boxed future returned by [`TokenActions`] operations.
pub type TokenActionFuture<'a> = Pin<Box<dyn Future<Output = Result<Credential>> + 'a + Send>>;

/// Network-facing token operations injected into the auth coordinator.
///
/// Implementations own the wire protocol (whatever grant or proprietary
/// exchange the backend speaks); the coordinator only sequences the calls and
/// guards them with the single-flight protocol. Each operation returns the
/// credential to use going forward, which allows `validate` to normalize or
/// upgrade the pair it was handed.
pub trait TokenActions
where
	Self: Send + Sync,
{
	/// Exchanges raw sign-in material for a fresh credential.
	fn authenticate<'a>(&'a self, credential: &'a AuthCredential) -> TokenActionFuture<'a>;

	/// Judges whether a credential is still usable, returning it (possibly
	/// normalized) when it is.
	fn validate<'a>(&'a self, credential: &'a Credential) -> TokenActionFuture<'a>;

	/// Obtains a replacement credential from the current one.
	fn refresh<'a>(&'a self, credential: &'a Credential) -> TokenActionFuture<'a>;
}
