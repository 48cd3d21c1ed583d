//! Secondary media-fetch integration.
//!
//! The media upstream authenticates with a long-lived access token passed as a
//! query parameter, not OAuth signing, so the fetcher drives the executor's
//! unsigned path while reusing the same transport stack.

// self
use crate::{
	_prelude::*,
	http::{ApiResponse, RequestExecutor, Transport, TransportOptions},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request::{Method, RequestSpec},
};

/// Fetches recent media from a token-in-query REST endpoint.
#[derive(Debug)]
pub struct MediaFetcher<T>
where
	T: ?Sized + Transport,
{
	executor: RequestExecutor<T>,
	endpoint: Url,
	access_token: String,
}
impl<T> Clone for MediaFetcher<T>
where
	T: ?Sized + Transport,
{
	fn clone(&self) -> Self {
		Self {
			executor: self.executor.clone(),
			endpoint: self.endpoint.clone(),
			access_token: self.access_token.clone(),
		}
	}
}
impl<T> MediaFetcher<T>
where
	T: ?Sized + Transport,
{
	/// Creates a fetcher for the provided endpoint + access token.
	pub fn new(
		transport: impl Into<Arc<T>>,
		endpoint: Url,
		access_token: impl Into<String>,
	) -> Self {
		Self { executor: RequestExecutor::new(transport), endpoint, access_token: access_token.into() }
	}

	/// Overrides the transport options (timeout) used by the fetcher.
	pub fn with_transport_options(mut self, options: TransportOptions) -> Self {
		self.executor = self.executor.with_options(options);

		self
	}

	/// Queries the recent-media listing. The response is returned as-is;
	/// callers interpret the payload.
	pub async fn recent_media(&self) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::MediaFetch;

		let span = FlowSpan::new(KIND, "recent_media");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let spec = RequestSpec::builder(Method::Get, self.endpoint.clone())
					.query_param("access_token", self.access_token.clone())
					.build()?;
				let response = self
					.executor
					.execute_bare(&spec, &[("Accept", "application/json".to_owned())])
					.await?;

				Ok(response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
