//! Publish flow: select the lowest-weight pending quote, post it, persist the
//! outcome on the item, and thank the submitter when eligible.

// crates.io
use serde_json::Value;
use time::{format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::{
	_prelude::*,
	flows::Courier,
	http::Transport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	oauth::SignedRequest,
	request::{Method, RequestSpec},
	store::{Quote, QuoteFilter, StoreError},
};

/// Error message the remote service reports for repeated status text. A
/// duplicate leaves the publish flag untouched so the item can retry once the
/// window passes; every other API error blocks republishing.
pub const DUPLICATE_STATUS_MESSAGE: &str = "Status is a duplicate.";

// Remote `created_at` shape: `Mon Jan 01 00:00:00 +0000 2024`.
const CREATED_AT_FORMAT: &[BorrowedFormatItem<'_>] = format_description!(
	"[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] \
	[offset_hour sign:mandatory][offset_minute] [year]"
);
const STORAGE_FORMAT: &[BorrowedFormatItem<'_>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Result of one posting attempt. API-level rejections are outcomes, not
/// errors: the raw payload is already persisted on the item by the time the
/// caller sees one of these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PostOutcome {
	/// No approved, unpublished quote was queued.
	Idle,
	/// The quote is live remotely.
	Posted {
		/// Identifier assigned by the remote service.
		remote_id: String,
		/// Whether a thank-you reply was issued to the submitter.
		thanked: bool,
	},
	/// The service reported the status as a duplicate; the publish flag was
	/// left untouched.
	Duplicate {
		/// The service's error message.
		message: String,
	},
	/// The service rejected the post; the item was marked unpublishable.
	Rejected {
		/// The service's error message, or a description of the defect.
		message: String,
	},
}

impl<T> Courier<T>
where
	T: ?Sized + Transport,
{
	/// Returns the next quote eligible for posting: lowest explicit weight
	/// among approved, unpublished items, ties broken by insertion order.
	pub async fn next_pending(&self) -> Result<Option<Quote>> {
		let pending = self.store.find(QuoteFilter::pending()).await?;

		Ok(pending.into_iter().min_by_key(|quote| quote.weight))
	}

	/// Returns the text of the next quote that would be posted.
	pub async fn show_next(&self) -> Result<Option<String>> {
		Ok(self.next_pending().await?.map(|quote| quote.text))
	}

	/// Posts the next eligible quote, if any.
	pub async fn post_next(&self) -> Result<PostOutcome> {
		const KIND: FlowKind = FlowKind::Publish;

		let span = FlowSpan::new(KIND, "post_next");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let guard = self.post_guard();
				let _serialized = guard.lock().await;

				match self.next_pending().await? {
					Some(quote) => self.publish(quote).await,
					None => Ok(PostOutcome::Idle),
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Posts a specific quote by identifier, bypassing queue selection.
	pub async fn post_by_id(&self, id: u64) -> Result<PostOutcome> {
		const KIND: FlowKind = FlowKind::Publish;

		let span = FlowSpan::new(KIND, "post_by_id");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let guard = self.post_guard();
				let _serialized = guard.lock().await;
				let quote =
					self.store.load(id).await?.ok_or(StoreError::Missing { id })?;

				self.publish(quote).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn publish(&self, mut quote: Quote) -> Result<PostOutcome> {
		let spec =
			RequestSpec::builder(Method::Post, self.settings.status_endpoint.clone())
				.body_param("status", quote.text.clone())
				.build()?;
		let signed = self.signer.sign(spec);
		let response = self.executor.execute(&signed).await?;

		quote.remote_payload = Some(response.raw_text());

		if let Some(message) = response.api_error_message().map(str::to_owned) {
			return if message == DUPLICATE_STATUS_MESSAGE {
				// Publish flag stays untouched; the payload is still persisted.
				self.store.save(quote).await?;

				Ok(PostOutcome::Duplicate { message })
			} else {
				quote.published = false;

				self.store.save(quote.clone()).await?;

				#[cfg(feature = "tracing")]
				tracing::warn!(quote = quote.id, %message, "Post rejected by the service.");

				Ok(PostOutcome::Rejected { message })
			};
		}

		let Some(remote_id) = response.json().and_then(extract_remote_id) else {
			let message = "Response did not include a post id.".to_owned();

			quote.published = false;

			self.store.save(quote).await?;

			return Ok(PostOutcome::Rejected { message });
		};

		quote.posted_at = response
			.json()
			.and_then(|json| json.get("created_at"))
			.and_then(Value::as_str)
			.and_then(|raw| self.normalize_created_at(raw));
		quote.remote_id = Some(remote_id.clone());
		quote.published = true;
		quote.approved = true;

		self.store.save(quote.clone()).await?;

		let thanked = self.thank_submitter(&quote, &remote_id).await;

		Ok(PostOutcome::Posted { remote_id, thanked })
	}

	/// Issues one thank-you reply to the submitter, unless the handle is
	/// empty or blocklisted. Reply failures are logged and never unwind the
	/// already-persisted post.
	async fn thank_submitter(&self, quote: &Quote, remote_id: &str) -> bool {
		let Some(handle) = quote.submitted_by.as_deref().map(str::trim) else {
			return false;
		};

		if handle.is_empty() || self.handle_is_blocked(handle) {
			return false;
		}

		const KIND: FlowKind = FlowKind::Reply;

		let span = FlowSpan::new(KIND, "thank_submitter");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let sent = span
			.instrument(async move {
				let comment = format!("Thanks for the submission {handle}!");
				let Ok(spec) = RequestSpec::builder(
					Method::Post,
					self.settings.status_endpoint.clone(),
				)
				.body_param("status", comment)
				.body_param("in_reply_to_status_id", remote_id)
				.build() else {
					return false;
				};
				let signed: SignedRequest = self.signer.sign(spec);

				match self.executor.execute(&signed).await {
					Ok(_response) => {
						#[cfg(feature = "tracing")]
						tracing::info!(
							quote = quote.id,
							payload = %_response.raw_text(),
							"Thank-you reply response."
						);

						true
					},
					Err(_e) => {
						#[cfg(feature = "tracing")]
						tracing::warn!(quote = quote.id, error = %_e, "Thank-you reply failed.");

						false
					},
				}
			})
			.await;

		if sent {
			obs::record_flow_outcome(KIND, FlowOutcome::Success);
		} else {
			obs::record_flow_outcome(KIND, FlowOutcome::Failure);
		}

		sent
	}

	fn handle_is_blocked(&self, handle: &str) -> bool {
		if handle == "@" {
			return true;
		}

		let own = self.settings.service_handle.trim_start_matches('@');

		!own.is_empty() && handle.trim_start_matches('@') == own
	}

	fn normalize_created_at(&self, raw: &str) -> Option<String> {
		OffsetDateTime::parse(raw, CREATED_AT_FORMAT)
			.ok()?
			.to_offset(self.settings.local_offset)
			.format(STORAGE_FORMAT)
			.ok()
	}
}

fn extract_remote_id(json: &Value) -> Option<String> {
	// `id_str` dodges the 64-bit precision loss a numeric `id` read risks.
	if let Some(id) = json.get("id_str").and_then(Value::as_str) {
		return Some(id.to_owned());
	}

	json.get("id").filter(|id| id.is_number()).map(Value::to_string)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn remote_id_prefers_id_str() {
		let json = serde_json::json!({ "id": 850_006_245_121_695_744_u64, "id_str": "850006245121695744" });

		assert_eq!(extract_remote_id(&json), Some("850006245121695744".to_owned()));
		assert_eq!(
			extract_remote_id(&serde_json::json!({ "id": 42 })),
			Some("42".to_owned())
		);
		assert_eq!(extract_remote_id(&serde_json::json!({ "ok": true })), None);
	}

	#[test]
	fn created_at_parses_the_remote_shape() {
		let parsed = OffsetDateTime::parse("Mon Jan 01 00:00:00 +0000 2024", CREATED_AT_FORMAT)
			.expect("Remote created_at fixture should parse.");

		assert_eq!(parsed.unix_timestamp(), 1_704_067_200);
	}
}
