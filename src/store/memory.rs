//! Thread-safe in-memory [`CredentialStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{CredentialStore, StoreError, StoreFuture},
};

type Slot = Arc<RwLock<Option<Credential>>>;

/// Keeps the credential in-process; contents are lost when the process exits.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	/// Creates a store pre-seeded with a credential.
	pub fn seeded(credential: Credential) -> Self {
		Self(Arc::new(RwLock::new(Some(credential))))
	}

	fn load_now(slot: Slot) -> Option<Credential> {
		slot.read().clone()
	}

	fn store_now(slot: Slot, credential: Credential) -> Result<(), StoreError> {
		*slot.write() = Some(credential);

		Ok(())
	}

	fn invalidate_now(slot: Slot) -> Result<(), StoreError> {
		*slot.write() = None;

		Ok(())
	}
}
impl CredentialStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, Option<Credential>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(Self::load_now(slot)) })
	}

	fn store(&self, credential: Credential) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move { Self::store_now(slot, credential) })
	}

	fn invalidate(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move { Self::invalidate_now(slot) })
	}
}
