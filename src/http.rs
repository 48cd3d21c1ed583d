//! Transport primitives for signed single-shot API calls.
//!
//! [`Transport`] is the crate's only seam onto an HTTP stack: it receives a
//! fully assembled [`WireRequest`] and returns the raw status + body. The
//! [`RequestExecutor`] sitting above it owns request assembly (query string vs.
//! form body, the method-override accommodation, the cleared `Expect` header)
//! and response normalization into [`ApiResponse`]. API-level errors and
//! malformed JSON bodies are returned as data so callers can inspect them.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	error::TransportError,
	oauth::SignedRequest,
	request::{Method, ParamSet, RequestSpec},
};

/// Reference upper bound for a single call.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Knobs applied to every call made through one executor.
#[derive(Clone, Copy, Debug)]
pub struct TransportOptions {
	/// Fixed deadline after which the call fails with a timeout.
	pub timeout: StdDuration,
}
impl Default for TransportOptions {
	fn default() -> Self {
		Self { timeout: DEFAULT_TIMEOUT }
	}
}

/// A request shaped for the wire: final URL, headers, and optional form body.
#[derive(Clone, Debug)]
pub struct WireRequest {
	/// HTTP method to issue.
	pub method: Method,
	/// Final URL, query string already attached for query-parameter requests.
	pub url: Url,
	/// Header name/value pairs, `Authorization` and `Expect` included.
	pub headers: Vec<(&'static str, String)>,
	/// Form-encoded body for body-parameter requests.
	pub body: Option<String>,
	/// Set for PUT/DELETE so transports that only natively speak GET/POST can
	/// tunnel the verb through their method-override mechanism. Transports
	/// with native support for every verb ignore it.
	pub method_override: Option<Method>,
}

/// Raw transport result before JSON decoding.
#[derive(Clone, Debug)]
pub struct RawResponse {
	/// Numeric HTTP status code.
	pub status: u16,
	/// Unparsed response body.
	pub body: String,
}

/// Boxed future returned by [`Transport`] implementations.
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of one synchronous request/response
/// exchange. No retries, no redirect policy requirements beyond the stack's
/// defaults.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Issues the request and resolves with the raw status + body.
	fn send(&self, request: WireRequest, options: TransportOptions) -> TransportFuture<'_>;
}

/// Decoded response body: either parsed JSON or the raw text when the body was
/// not valid JSON (many REST APIs return JSON error objects on 4xx/5xx, so the
/// executor never throws on decode).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiBody {
	/// The body parsed as JSON.
	Json(Value),
	/// The body was not valid JSON; kept verbatim for inspection.
	Raw {
		/// The unparsed body text.
		text: String,
		/// Description of the parse failure, with the offending path.
		reason: String,
	},
}

/// Normalized result of one API call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// Numeric HTTP status code.
	pub status: u16,
	/// Decoded body.
	pub body: ApiBody,
}
impl ApiResponse {
	/// Borrows the parsed JSON body, if the body parsed.
	pub fn json(&self) -> Option<&Value> {
		match &self.body {
			ApiBody::Json(value) => Some(value),
			ApiBody::Raw { .. } => None,
		}
	}

	/// Renders the body back to text, suitable for persisting on the item
	/// that triggered the call.
	pub fn raw_text(&self) -> String {
		match &self.body {
			ApiBody::Json(value) => value.to_string(),
			ApiBody::Raw { text, .. } => text.clone(),
		}
	}

	/// Extracts the first `errors[].message` entry of a structured API error
	/// body, when present.
	pub fn api_error_message(&self) -> Option<&str> {
		self.json()?.get("errors")?.get(0)?.get("message")?.as_str()
	}
}

/// Executes signed requests over an injected [`Transport`].
#[derive(Debug)]
pub struct RequestExecutor<T>
where
	T: ?Sized + Transport,
{
	transport: Arc<T>,
	options: TransportOptions,
}
// Derived `Clone` would demand `T: Clone`; only the handle is cloned.
impl<T> Clone for RequestExecutor<T>
where
	T: ?Sized + Transport,
{
	fn clone(&self) -> Self {
		Self { transport: self.transport.clone(), options: self.options }
	}
}
impl<T> RequestExecutor<T>
where
	T: ?Sized + Transport,
{
	/// Creates an executor with the reference 10-second deadline.
	pub fn new(transport: impl Into<Arc<T>>) -> Self {
		Self { transport: transport.into(), options: TransportOptions::default() }
	}

	/// Overrides the transport options.
	pub fn with_options(mut self, options: TransportOptions) -> Self {
		self.options = options;

		self
	}

	/// Performs the signed call and normalizes the result.
	pub async fn execute(&self, signed: &SignedRequest) -> Result<ApiResponse, TransportError> {
		let wire = assemble(&signed.spec, Some(&signed.authorization), &[]);

		self.dispatch(wire).await
	}

	/// Performs an unsigned call with extra headers; used by collaborators
	/// whose upstream authenticates through a query token instead of OAuth.
	pub(crate) async fn execute_bare(
		&self,
		spec: &RequestSpec,
		extra_headers: &[(&'static str, String)],
	) -> Result<ApiResponse, TransportError> {
		let wire = assemble(spec, None, extra_headers);

		self.dispatch(wire).await
	}

	async fn dispatch(&self, wire: WireRequest) -> Result<ApiResponse, TransportError> {
		let raw = self.transport.send(wire, self.options).await?;

		Ok(decode(raw))
	}
}

/// Shapes a [`RequestSpec`] for the wire.
///
/// Query parameters are appended to the URL `application/x-www-form-urlencoded`
/// style (no trailing `?` when the set is empty); body parameters become the
/// form-encoded request body. The `Expect` header is cleared to sidestep HTTP
/// 100-continue stalls on some endpoints.
pub fn assemble(
	spec: &RequestSpec,
	authorization: Option<&str>,
	extra_headers: &[(&'static str, String)],
) -> WireRequest {
	let mut url = spec.url.clone();
	let mut body = None;

	match &spec.params {
		ParamSet::Query(map) =>
			if !map.is_empty() {
				url.query_pairs_mut().extend_pairs(map.iter()).finish();
			},
		ParamSet::Body(map) => {
			let encoded = url::form_urlencoded::Serializer::new(String::new())
				.extend_pairs(map.iter())
				.finish();

			body = Some(encoded);
		},
	}

	let mut headers = Vec::with_capacity(2 + extra_headers.len());

	if let Some(value) = authorization {
		headers.push(("Authorization", value.to_owned()));
	}

	headers.push(("Expect", String::new()));
	headers.extend(extra_headers.iter().cloned());

	WireRequest {
		method: spec.method,
		url,
		headers,
		body,
		method_override: spec.method.needs_override().then_some(spec.method),
	}
}

fn decode(raw: RawResponse) -> ApiResponse {
	let deserializer = &mut serde_json::Deserializer::from_str(&raw.body);

	match serde_path_to_error::deserialize::<_, Value>(deserializer) {
		Ok(value) => ApiResponse { status: raw.status, body: ApiBody::Json(value) },
		Err(e) =>
			ApiResponse { status: raw.status, body: ApiBody::Raw { text: raw.body, reason: e.to_string() } },
	}
}

/// Thin wrapper around [`ReqwestClient`] implementing [`Transport`]. reqwest
/// issues PUT/DELETE natively, so the method-override field is ignored.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn send(&self, request: WireRequest, options: TransportOptions) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut builder = client.request(method, request.url).timeout(options.timeout);

			for (name, value) in &request.headers {
				builder = builder.header(*name, value);
			}
			if let Some(body) = request.body {
				builder = builder
					.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
					.body(body);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.text().await.map_err(TransportError::from)?;

			Ok(RawResponse { status, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test URL.")
	}

	#[test]
	fn query_requests_append_to_the_url() {
		let spec = RequestSpec::builder(Method::Get, url("https://api.example.com/1/x.json"))
			.query_param("q", "#twitter")
			.build()
			.expect("Fixture spec should build.");
		let wire = assemble(&spec, Some("OAuth fixture"), &[]);

		assert_eq!(wire.url.as_str(), "https://api.example.com/1/x.json?q=%23twitter");
		assert_eq!(wire.body, None);
		assert_eq!(wire.method_override, None);
		assert!(wire.headers.contains(&("Authorization", "OAuth fixture".to_owned())));
		assert!(wire.headers.contains(&("Expect", String::new())));
	}

	#[test]
	fn empty_query_sets_leave_the_url_untouched() {
		let spec = RequestSpec::builder(Method::Get, url("https://api.example.com/1/x.json"))
			.build()
			.expect("Fixture spec should build.");
		let wire = assemble(&spec, None, &[]);

		assert_eq!(wire.url.as_str(), "https://api.example.com/1/x.json");
	}

	#[test]
	fn body_requests_form_encode_and_flag_overrides() {
		let spec = RequestSpec::builder(Method::Put, url("https://api.example.com/1/x.json"))
			.body_param("name", "Important")
			.body_flag("paused", true)
			.build()
			.expect("Fixture spec should build.");
		let wire = assemble(&spec, None, &[]);

		assert_eq!(wire.body.as_deref(), Some("name=Important&paused=true"));
		assert_eq!(wire.method_override, Some(Method::Put));
	}

	#[test]
	fn decode_keeps_malformed_bodies_verbatim() {
		let response = decode(RawResponse { status: 502, body: "<html>bad gateway</html>".into() });

		assert_eq!(response.status, 502);
		assert!(response.json().is_none());
		assert_eq!(response.raw_text(), "<html>bad gateway</html>");

		let ApiBody::Raw { reason, .. } = &response.body else {
			panic!("Malformed bodies should decode to the raw variant.");
		};

		assert!(!reason.is_empty());
	}

	#[test]
	fn api_error_message_reads_the_first_error() {
		let response = decode(RawResponse {
			status: 403,
			body: json!({ "errors": [{ "code": 187, "message": "Status is a duplicate." }] })
				.to_string(),
		});

		assert_eq!(response.api_error_message(), Some("Status is a duplicate."));
	}
}
