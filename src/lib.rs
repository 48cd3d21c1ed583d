//! OAuth 1.0a posting courier—sign single-shot requests, execute them over
//! HTTPS, and drain a weight-ordered quote queue in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod error;
pub mod flows;
pub mod http;
pub mod media;
pub mod oauth;
pub mod obs;
pub mod request;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience fakes and builders for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		flows::{Courier, CourierSettings},
		http::{RawResponse, Transport, TransportFuture, TransportOptions, WireRequest},
		oauth::Credentials,
		store::{MemoryStore, Quote, QuoteStore},
	};

	/// Courier type alias used by fake-transport integration tests.
	pub type StaticTestCourier = Courier<StaticTransport>;

	/// Transport fake that replays queued responses and records every wire request.
	#[derive(Debug, Default)]
	pub struct StaticTransport {
		responses: Mutex<VecDeque<RawResponse>>,
		requests: Mutex<Vec<WireRequest>>,
	}
	impl StaticTransport {
		/// Builds a transport answering with the provided status/body pairs in order.
		pub fn with_responses(responses: impl IntoIterator<Item = (u16, String)>) -> Self {
			let queued = responses
				.into_iter()
				.map(|(status, body)| RawResponse { status, body })
				.collect();

			Self { responses: Mutex::new(queued), requests: Default::default() }
		}

		/// Returns a copy of every wire request sent so far.
		pub fn sent(&self) -> Vec<WireRequest> {
			self.requests.lock().clone()
		}
	}
	impl Transport for StaticTransport {
		fn send(&self, request: WireRequest, _options: TransportOptions) -> TransportFuture<'_> {
			self.requests.lock().push(request);

			let response = self
				.responses
				.lock()
				.pop_front()
				.expect("StaticTransport ran out of queued responses.");

			Box::pin(async move { Ok(response) })
		}
	}

	/// Credential set shared by fixture tests.
	pub fn fixture_credentials() -> Credentials {
		Credentials::new("key1", "secret1", "token1", "secret2")
			.expect("Fixture credentials should be valid.")
	}

	/// Constructs a [`Courier`] over a seeded [`MemoryStore`] and a [`StaticTransport`].
	pub fn build_static_courier(
		quotes: impl IntoIterator<Item = Quote>,
		responses: impl IntoIterator<Item = (u16, String)>,
	) -> (StaticTestCourier, Arc<MemoryStore>, Arc<StaticTransport>) {
		let store_backend = Arc::new(MemoryStore::seeded(quotes));
		let store: Arc<dyn QuoteStore> = store_backend.clone();
		let transport = Arc::new(StaticTransport::with_responses(responses));
		let settings = CourierSettings::default().with_service_handle("QuoteCourier");
		let courier =
			Courier::with_transport(store, fixture_credentials(), settings, transport.clone());

		(courier, store_backend, transport)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{OffsetDateTime, UtcOffset};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
#[cfg(test)] use oauth1_courier as _;
#[cfg(test)] use tokio as _;
