//! High-level courier orchestration over the signer, executor, and store.

pub mod maintenance;
pub mod publish;

pub use publish::*;

// self
use crate::{
	_prelude::*,
	http::{RequestExecutor, Transport, TransportOptions},
	oauth::{Credentials, Signer},
	store::QuoteStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Courier specialized for the crate's default reqwest transport.
pub type ReqwestCourier = Courier<ReqwestTransport>;

/// Deployment settings for a courier instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourierSettings {
	/// Status-update endpoint of the remote service.
	pub status_endpoint: Url,
	/// The service's own handle; submissions credited to it never receive a
	/// thank-you reply.
	pub service_handle: String,
	/// Reference offset used when stamping post timestamps.
	pub local_offset: UtcOffset,
}
impl Default for CourierSettings {
	fn default() -> Self {
		Self {
			status_endpoint: Url::parse("https://api.twitter.com/1.1/statuses/update.json")
				.expect("Hard-coded endpoint URL is valid."),
			service_handle: String::new(),
			local_offset: time::macros::offset!(-8),
		}
	}
}
impl CourierSettings {
	/// Sets the service's own handle.
	pub fn with_service_handle(mut self, handle: impl Into<String>) -> Self {
		self.service_handle = handle.into();

		self
	}

	/// Sets the reference offset for post timestamps.
	pub fn with_local_offset(mut self, offset: UtcOffset) -> Self {
		self.local_offset = offset;

		self
	}
}

/// Coordinates posting and queue maintenance against a single credential set.
///
/// The courier owns the signer, the executor, and the injected quote store.
/// One post runs at a time per courier: an internal async mutex serializes
/// posting so concurrent invocations over the same credentials cannot collide
/// on nonce/timestamp pairs.
pub struct Courier<T>
where
	T: ?Sized + Transport,
{
	/// Signer over the courier's credential set.
	pub signer: Signer,
	/// Executor used for every outbound call.
	pub executor: RequestExecutor<T>,
	/// Quote repository implementation.
	pub store: Arc<dyn QuoteStore>,
	/// Deployment settings.
	pub settings: CourierSettings,
	post_guard: Arc<AsyncMutex<()>>,
}
impl<T> Courier<T>
where
	T: ?Sized + Transport,
{
	/// Creates a courier that reuses the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn QuoteStore>,
		credentials: Credentials,
		settings: CourierSettings,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			signer: Signer::new(credentials),
			executor: RequestExecutor::new(transport),
			store,
			settings,
			post_guard: Default::default(),
		}
	}

	/// Overrides the transport options (timeout) used by the executor.
	pub fn with_transport_options(mut self, options: TransportOptions) -> Self {
		self.executor = self.executor.with_options(options);

		self
	}

	pub(crate) fn post_guard(&self) -> Arc<AsyncMutex<()>> {
		self.post_guard.clone()
	}
}
#[cfg(feature = "reqwest")]
impl Courier<ReqwestTransport> {
	/// Creates a courier with its own reqwest-backed transport.
	pub fn new(
		store: Arc<dyn QuoteStore>,
		credentials: Credentials,
		settings: CourierSettings,
	) -> Self {
		Self::with_transport(store, credentials, settings, ReqwestTransport::default())
	}
}
// Clones share the posting guard, so clones still post one at a time.
impl<T> Clone for Courier<T>
where
	T: ?Sized + Transport,
{
	fn clone(&self) -> Self {
		Self {
			signer: self.signer.clone(),
			executor: self.executor.clone(),
			store: self.store.clone(),
			settings: self.settings.clone(),
			post_guard: self.post_guard.clone(),
		}
	}
}
impl<T> Debug for Courier<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Courier")
			.field("settings", &self.settings)
			.field("signer", &self.signer)
			.finish()
	}
}
