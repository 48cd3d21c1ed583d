//! Courier-level error types shared across the signer, executor, and flows.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical courier error exposed by public APIs.
///
/// API-level failures reported by the remote service are deliberately absent:
/// they are decoded response data (see [`ApiResponse`](crate::http::ApiResponse))
/// that the orchestration layer inspects, not exceptional control flow.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Request construction or signing precondition failure.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// Storage-layer failure.
	#[error("{0}")]
	Store(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Caller/config errors raised before any network activity.
///
/// These are expected, recoverable conditions and are never retried.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SigningError {
	/// Request used an HTTP method outside GET/POST/PUT/DELETE.
	#[error("Request method must be GET, POST, PUT, or DELETE, got `{method}`.")]
	InvalidMethod {
		/// The rejected method token.
		method: String,
	},
	/// Both query and body parameter sets were populated on one request.
	#[error("A request must carry either query parameters or body parameters, not both.")]
	ConflictingParameters,
	/// One of the four credential strings was empty.
	#[error("Credential field `{field}` must be non-empty.")]
	MissingCredential {
		/// Name of the offending credential field.
		field: &'static str,
	},
}

/// Transport-level failures (network, IO, timeout). Never retried here; the
/// caller decides whether another attempt makes sense.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The fixed per-call deadline elapsed before a response arrived.
	#[error("Request exceeded the {limit:?} transport deadline.")]
	Timeout {
		/// Configured upper bound for the call.
		limit: StdDuration,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() {
			Self::Timeout { limit: crate::http::TransportOptions::default().timeout }
		} else {
			Self::network(e)
		}
	}
}
