//! Thread-safe in-memory [`SessionStore`] for tests and single-process deployments.

// self
use crate::{
	_prelude::*,
	store::{SessionStore, StoreFuture},
};

/// Session backend that keeps entries in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<HashMap<String, String>>>);
impl MemoryStore {
	/// Number of stored entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Whether the store holds no entries.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl SessionStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let value = self.0.read().get(key).cloned();

		Box::pin(async move { Ok(value) })
	}

	fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		self.0.write().insert(key.to_owned(), value);

		Box::pin(async { Ok(()) })
	}

	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		self.0.write().remove(key);

		Box::pin(async { Ok(()) })
	}
}
