//! Thread-safe in-memory [`QuoteStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{Quote, QuoteFilter, QuoteStore, StoreError, StoreFuture},
};

type QuoteMap = Arc<RwLock<BTreeMap<u64, Quote>>>;

/// Keeps quotes in-process, ordered by identifier so `find` returns a stable
/// insertion order for tie-breaking.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(QuoteMap);
impl MemoryStore {
	/// Builds a store pre-seeded with the provided quotes.
	pub fn seeded(quotes: impl IntoIterator<Item = Quote>) -> Self {
		let map = quotes.into_iter().map(|quote| (quote.id, quote)).collect();

		Self(Arc::new(RwLock::new(map)))
	}

	fn save_now(map: QuoteMap, quote: Quote) -> Result<(), StoreError> {
		map.write().insert(quote.id, quote);

		Ok(())
	}

	fn load_now(map: QuoteMap, id: u64) -> Option<Quote> {
		map.read().get(&id).cloned()
	}

	fn find_now(map: QuoteMap, filter: QuoteFilter) -> Vec<Quote> {
		map.read().values().filter(|quote| filter.matches(quote)).cloned().collect()
	}
}
impl QuoteStore for MemoryStore {
	fn save(&self, quote: Quote) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_now(map, quote) })
	}

	fn load(&self, id: u64) -> StoreFuture<'_, Option<Quote>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::load_now(map, id)) })
	}

	fn find(&self, filter: QuoteFilter) -> StoreFuture<'_, Vec<Quote>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::find_now(map, filter)) })
	}
}
