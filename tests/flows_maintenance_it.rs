// self
use oauth1_courier::{
	_preludet::*,
	store::{Quote, QuoteFilter, QuoteStore},
};

#[tokio::test]
async fn approve_all_targets_unpublished_unapproved_quotes() {
	let mut published = Quote::new(3, "live").approve();

	published.published = true;

	let quotes = [Quote::new(1, "draft"), Quote::new(2, "ready").approve(), published];
	let (courier, store, _transport) = build_static_courier(quotes, []);
	let touched = courier.approve_all().await.expect("Approval should succeed.");

	assert_eq!(touched, 1);

	let approved = store
		.find(QuoteFilter { approved: Some(true), published: None })
		.await
		.expect("Find should succeed.");

	assert_eq!(approved.iter().map(|quote| quote.id).collect::<Vec<_>>(), [1, 2, 3]);
}

#[tokio::test]
async fn reset_weights_restores_insertion_order() {
	let quotes = [
		Quote::new(1, "a").with_weight(90),
		Quote::new(2, "b").with_weight(10),
		Quote::new(3, "c").with_weight(50),
		Quote::new(u64::MAX, "d").with_weight(1),
	];
	let (courier, store, _transport) = build_static_courier(quotes, []);
	let touched = courier.reset_weights().await.expect("Reset should succeed.");

	assert_eq!(touched, 4);

	for id in 1..=3 {
		let quote = store
			.load(id)
			.await
			.expect("Load should succeed.")
			.expect("Quote should exist.");

		assert_eq!(quote.weight, id as i64);
	}

	let huge = store
		.load(u64::MAX)
		.await
		.expect("Load should succeed.")
		.expect("Quote should exist.");

	assert_eq!(huge.weight, i64::MAX, "Weights saturate instead of wrapping.");
}

#[tokio::test]
async fn reset_remote_data_clears_all_bookkeeping() {
	let mut stamped = Quote::new(1, "was live").approve();

	stamped.published = true;
	stamped.remote_id = Some("42".into());
	stamped.remote_payload = Some("{}".into());
	stamped.posted_at = Some("2023-12-31T16:00:00".into());

	let (courier, store, _transport) = build_static_courier([stamped], []);
	let touched = courier.reset_remote_data().await.expect("Reset should succeed.");

	assert_eq!(touched, 1);

	let quote = store
		.load(1)
		.await
		.expect("Load should succeed.")
		.expect("Quote should exist.");

	assert!(!quote.published);
	assert_eq!(quote.remote_id, None);
	assert_eq!(quote.remote_payload, None);
	assert_eq!(quote.posted_at, None);
	assert!(quote.approved, "Approval survives a remote-data reset.");
}
