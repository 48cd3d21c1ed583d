//! Queue maintenance actions: bulk approval, weight resets, and remote-data
//! resets. Each action walks the store synchronously and returns the number of
//! items it touched.

// self
use crate::{
	_prelude::*,
	flows::Courier,
	http::Transport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::QuoteFilter,
};

impl<T> Courier<T>
where
	T: ?Sized + Transport,
{
	/// Approves every unpublished, unapproved quote.
	pub async fn approve_all(&self) -> Result<usize> {
		self.maintain("approve_all", QuoteFilter::unapproved(), |quote| {
			quote.approved = true;
		})
		.await
	}

	/// Resets every quote's weight to its identifier, restoring insertion
	/// order as the queue order.
	pub async fn reset_weights(&self) -> Result<usize> {
		self.maintain("reset_weights", QuoteFilter::default(), |quote| {
			// Saturates instead of wrapping for ids beyond the weight range.
			quote.weight = i64::try_from(quote.id).unwrap_or(i64::MAX);
		})
		.await
	}

	/// Clears all remote bookkeeping (remote id, payload, post stamp) and
	/// flips every quote back to unpublished.
	pub async fn reset_remote_data(&self) -> Result<usize> {
		self.maintain("reset_remote_data", QuoteFilter::default(), |quote| {
			quote.remote_id = None;
			quote.remote_payload = None;
			quote.posted_at = None;
			quote.published = false;
		})
		.await
	}

	async fn maintain(
		&self,
		stage: &'static str,
		filter: QuoteFilter,
		mutate: impl Fn(&mut crate::store::Quote),
	) -> Result<usize> {
		const KIND: FlowKind = FlowKind::Maintenance;

		let span = FlowSpan::new(KIND, stage);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let quotes = self.store.find(filter).await?;
				let count = quotes.len();

				for mut quote in quotes {
					mutate(&mut quote);

					self.store.save(quote).await?;
				}

				Ok(count)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
