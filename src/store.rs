//! Storage contracts and the built-in quote store implementation.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Boxed future returned by [`QuoteStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// A queued quote item with its publishing bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
	/// Stable item identifier.
	pub id: u64,
	/// The text to post.
	pub text: String,
	/// Editorial approval flag; only approved items are eligible for posting.
	pub approved: bool,
	/// Publish flag; flipped true once the item is live remotely.
	pub published: bool,
	/// Explicit queue position; lowest posts first.
	pub weight: i64,
	/// Handle of the person who submitted the quote, if any.
	pub submitted_by: Option<String>,
	/// Identifier assigned by the remote service on success.
	pub remote_id: Option<String>,
	/// Raw JSON payload of the last remote response, kept for inspection.
	pub remote_payload: Option<String>,
	/// Normalized local-time stamp of the successful post.
	pub posted_at: Option<String>,
}
impl Quote {
	/// Creates a fresh unapproved, unpublished quote.
	pub fn new(id: u64, text: impl Into<String>) -> Self {
		Self {
			id,
			text: text.into(),
			approved: false,
			published: false,
			weight: i64::try_from(id).unwrap_or(i64::MAX),
			submitted_by: None,
			remote_id: None,
			remote_payload: None,
			posted_at: None,
		}
	}

	/// Sets the queue weight.
	pub fn with_weight(mut self, weight: i64) -> Self {
		self.weight = weight;

		self
	}

	/// Marks the quote approved.
	pub fn approve(mut self) -> Self {
		self.approved = true;

		self
	}

	/// Sets the submitter handle.
	pub fn with_submitter(mut self, handle: impl Into<String>) -> Self {
		self.submitted_by = Some(handle.into());

		self
	}
}

/// Flag filters applied by [`QuoteStore::find`]. `None` matches either value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuoteFilter {
	/// Filter on the approval flag.
	pub approved: Option<bool>,
	/// Filter on the publish flag.
	pub published: Option<bool>,
}
impl QuoteFilter {
	/// Items eligible for posting: approved and not yet published.
	pub const fn pending() -> Self {
		Self { approved: Some(true), published: Some(false) }
	}

	/// Items awaiting editorial approval.
	pub const fn unapproved() -> Self {
		Self { approved: Some(false), published: Some(false) }
	}

	fn matches(&self, quote: &Quote) -> bool {
		self.approved.is_none_or(|flag| quote.approved == flag)
			&& self.published.is_none_or(|flag| quote.published == flag)
	}
}

/// Repository contract for quote items, injected into the orchestration layer.
pub trait QuoteStore
where
	Self: Send + Sync,
{
	/// Persists or replaces a quote.
	fn save(&self, quote: Quote) -> StoreFuture<'_, ()>;

	/// Fetches a quote by identifier.
	fn load(&self, id: u64) -> StoreFuture<'_, Option<Quote>>;

	/// Returns every quote matching the filter, in stable insertion order.
	fn find(&self, filter: QuoteFilter) -> StoreFuture<'_, Vec<Quote>>;
}

/// Error type produced by [`QuoteStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// No quote exists for the requested identifier.
	#[error("No quote found with id {id}.")]
	Missing {
		/// The identifier that failed to resolve.
		id: u64,
	},
}
