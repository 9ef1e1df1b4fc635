//! Storage contracts and built-in stores for the session credential.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Credential};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for the session credential.
///
/// The credential is read on every credentialed dispatch and replaced
/// wholesale after each successful refresh or authentication; the auth
/// coordinator is the only component that writes.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches the stored credential, if one exists.
	fn load(&self) -> StoreFuture<'_, Option<Credential>>;

	/// Persists or replaces the stored credential.
	fn store(&self, credential: Credential) -> StoreFuture<'_, ()>;

	/// Discards the stored credential, if any.
	fn invalidate(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
