// std
use std::sync::Mutex as StdMutex;
// crates.io
use serde_json::json;
// self
use oauth1_courier::{
	_preludet::*,
	error::Error,
	flows::{Courier, CourierSettings, PostOutcome},
	http::{RawResponse, Transport, TransportFuture, TransportOptions, WireRequest},
	store::{MemoryStore, Quote, QuoteStore, StoreError},
};

fn success_body(id: u64) -> String {
	json!({
		"id": id,
		"id_str": id.to_string(),
		"created_at": "Mon Jan 01 00:00:00 +0000 2024",
	})
	.to_string()
}

fn duplicate_body() -> String {
	json!({ "errors": [{ "code": 187, "message": "Status is a duplicate." }] }).to_string()
}

#[tokio::test]
async fn post_next_selects_the_lowest_weight_quote() {
	let quotes = [
		Quote::new(1, "heavy").approve().with_weight(5),
		Quote::new(2, "light").approve().with_weight(1),
		Quote::new(3, "middle").approve().with_weight(3),
	];
	let (courier, store, transport) =
		build_static_courier(quotes, [(200, success_body(42))]);
	let outcome = courier.post_next().await.expect("Posting should succeed.");

	assert_eq!(outcome, PostOutcome::Posted { remote_id: "42".into(), thanked: false });

	let sent = transport.sent();

	assert_eq!(sent.len(), 1);
	assert!(
		sent[0]
			.body
			.as_deref()
			.expect("Status updates travel as form bodies.")
			.contains("status=light")
	);

	let posted = store
		.load(2)
		.await
		.expect("Store load should succeed.")
		.expect("Posted quote should still exist.");

	assert!(posted.published);
	assert!(posted.approved);
	assert_eq!(posted.remote_id.as_deref(), Some("42"));
	// UTC midnight shifted to the reference -08:00 offset.
	assert_eq!(posted.posted_at.as_deref(), Some("2023-12-31T16:00:00"));
	assert!(posted.remote_payload.is_some());
}

#[tokio::test]
async fn duplicate_errors_leave_the_publish_flag_untouched() {
	let quotes = [Quote::new(1, "again").approve()];
	let (courier, store, _transport) =
		build_static_courier(quotes, [(403, duplicate_body())]);
	let outcome = courier.post_next().await.expect("Posting should succeed.");

	assert_eq!(outcome, PostOutcome::Duplicate { message: "Status is a duplicate.".into() });

	let quote = store
		.load(1)
		.await
		.expect("Store load should succeed.")
		.expect("Quote should still exist.");

	assert!(!quote.published);
	assert!(quote.approved);
	assert_eq!(quote.remote_payload.as_deref(), Some(duplicate_body().as_str()));
}

#[tokio::test]
async fn other_api_errors_mark_the_quote_unpublishable() {
	let body =
		json!({ "errors": [{ "code": 186, "message": "Status is over the character limit." }] })
			.to_string();
	let quotes = [Quote::new(1, "too long").approve()];
	let (courier, store, _transport) = build_static_courier(quotes, [(403, body.clone())]);
	let outcome = courier.post_next().await.expect("Posting should succeed.");

	assert_eq!(
		outcome,
		PostOutcome::Rejected { message: "Status is over the character limit.".into() }
	);

	let quote = store
		.load(1)
		.await
		.expect("Store load should succeed.")
		.expect("Quote should still exist.");

	assert!(!quote.published);
	assert_eq!(quote.remote_payload.as_deref(), Some(body.as_str()));
}

#[tokio::test]
async fn submitters_receive_one_thank_you_reply() {
	let quotes = [Quote::new(1, "credited").approve().with_submitter("@reader")];
	let (courier, _store, transport) = build_static_courier(quotes, [
		(200, success_body(42)),
		(200, success_body(43)),
	]);
	let outcome = courier.post_next().await.expect("Posting should succeed.");

	assert_eq!(outcome, PostOutcome::Posted { remote_id: "42".into(), thanked: true });

	let sent = transport.sent();

	assert_eq!(sent.len(), 2);

	let reply_body = sent[1].body.as_deref().expect("Replies travel as form bodies.");

	assert!(reply_body.contains("in_reply_to_status_id=42"));
	assert!(reply_body.contains("submission"));
}

#[tokio::test]
async fn blocklisted_handles_are_never_thanked() {
	for handle in ["@", "QuoteCourier", "@QuoteCourier"] {
		let quotes = [Quote::new(1, "uncredited").approve().with_submitter(handle)];
		let (courier, _store, transport) =
			build_static_courier(quotes, [(200, success_body(42))]);
		let outcome = courier.post_next().await.expect("Posting should succeed.");

		assert_eq!(
			outcome,
			PostOutcome::Posted { remote_id: "42".into(), thanked: false },
			"handle: {handle:?}",
		);
		assert_eq!(transport.sent().len(), 1, "handle: {handle:?}");
	}
}

#[tokio::test]
async fn empty_queue_reports_idle_without_network_activity() {
	let (courier, _store, transport) = build_static_courier([], []);
	let outcome = courier.post_next().await.expect("Posting should succeed.");

	assert_eq!(outcome, PostOutcome::Idle);
	assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn post_by_id_surfaces_missing_quotes() {
	let (courier, _store, _transport) = build_static_courier([], []);
	let err = courier.post_by_id(7).await.expect_err("Missing ids should fail.");

	assert!(matches!(err, Error::Store(StoreError::Missing { id: 7 })));
}

#[tokio::test]
async fn show_next_returns_the_pending_text() {
	let quotes = [
		Quote::new(1, "first").approve().with_weight(2),
		Quote::new(2, "second").approve().with_weight(9),
	];
	let (courier, _store, _transport) = build_static_courier(quotes, []);

	assert_eq!(courier.show_next().await.expect("Show next should succeed."), Some("first".into()));
}

/// Transport that parks inside `send` long enough for an unserialized second
/// call to enter, logging entry and exit so interleaving is observable.
#[derive(Debug, Default)]
struct SlowTransport {
	events: StdMutex<Vec<&'static str>>,
}
impl Transport for SlowTransport {
	fn send(&self, _request: WireRequest, _options: TransportOptions) -> TransportFuture<'_> {
		Box::pin(async move {
			self.events.lock().expect("Event log should not be poisoned.").push("enter");

			tokio::time::sleep(std::time::Duration::from_millis(200)).await;

			self.events.lock().expect("Event log should not be poisoned.").push("exit");

			Ok(RawResponse { status: 200, body: success_body(42) })
		})
	}
}

#[tokio::test]
async fn concurrent_posts_never_overlap_on_the_wire() {
	let store: Arc<dyn QuoteStore> = Arc::new(MemoryStore::seeded([
		Quote::new(1, "first").approve(),
		Quote::new(2, "second").approve(),
	]));
	let transport = Arc::new(SlowTransport::default());
	let settings = CourierSettings::default().with_service_handle("QuoteCourier");
	let courier: Courier<SlowTransport> =
		Courier::with_transport(store, fixture_credentials(), settings, transport.clone());
	let clone = courier.clone();
	let (first, second) = tokio::join!(courier.post_next(), clone.post_next());

	assert!(matches!(
		first.expect("First post should succeed."),
		PostOutcome::Posted { .. }
	));
	assert!(matches!(
		second.expect("Second post should succeed."),
		PostOutcome::Posted { .. }
	));
	// One call fully completes before the next reaches the transport.
	assert_eq!(
		*transport.events.lock().expect("Event log should not be poisoned."),
		["enter", "exit", "enter", "exit"],
	);
}
