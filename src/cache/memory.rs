//! Process-local [`ExpiringCache`] for tests, demos, and short-lived tools.

// self
use crate::{
	_prelude::*,
	cache::{CacheError, CacheFuture, ExpiringCache},
};

type Slot = Arc<RwLock<Option<Vec<u8>>>>;

/// Thread-safe volatile slot; contents vanish with the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(Slot);
impl MemoryCache {
	/// Empties the slot.
	pub fn clear(&self) {
		self.0.write().take();
	}

	/// Returns `true` when a record has been stored.
	pub fn is_populated(&self) -> bool {
		self.0.read().is_some()
	}

	/// Returns a copy of the raw stored bytes.
	pub fn snapshot(&self) -> Option<Vec<u8>> {
		self.0.read().clone()
	}

	fn store_now(slot: Slot, bytes: Vec<u8>) -> Result<(), CacheError> {
		*slot.write() = Some(bytes);

		Ok(())
	}

	fn load_now(slot: Slot) -> Result<Vec<u8>, CacheError> {
		slot.read().clone().ok_or(CacheError::NotFound)
	}
}
impl ExpiringCache for MemoryCache {
	fn store(&self, bytes: Vec<u8>) -> CacheFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move { Self::store_now(slot, bytes) })
	}

	fn load(&self) -> CacheFuture<'_, Vec<u8>> {
		let slot = self.0.clone();

		Box::pin(async move { Self::load_now(slot) })
	}
}
