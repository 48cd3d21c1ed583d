//! Request descriptions consumed by the signer and the executor.
//!
//! A [`RequestSpec`] carries the HTTP method, the base URL (never a query
//! string), and exactly one live parameter set. Query and body parameters are
//! mutually exclusive; populating both is a caller error caught at build time,
//! before any signing or network activity.

// self
use crate::{_prelude::*, error::SigningError};

/// HTTP methods accepted by the signer and executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// HTTP GET.
	Get,
	/// HTTP POST.
	Post,
	/// HTTP PUT.
	Put,
	/// HTTP DELETE.
	Delete,
}
impl Method {
	/// Returns the uppercase wire token for the method.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}

	/// True for the verbs some transports cannot issue natively and must send
	/// through an explicit method-override field.
	pub const fn needs_override(self) -> bool {
		matches!(self, Method::Put | Method::Delete)
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Method {
	type Err = SigningError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_uppercase().as_str() {
			"GET" => Ok(Method::Get),
			"POST" => Ok(Method::Post),
			"PUT" => Ok(Method::Put),
			"DELETE" => Ok(Method::Delete),
			other => Err(SigningError::InvalidMethod { method: other.to_owned() }),
		}
	}
}

/// The single live parameter set of a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamSet {
	/// Parameters appended to the URL as a query string.
	Query(BTreeMap<String, String>),
	/// Parameters form-encoded into the request body.
	Body(BTreeMap<String, String>),
}
impl ParamSet {
	/// Borrows the underlying ordered mapping regardless of placement.
	pub fn entries(&self) -> &BTreeMap<String, String> {
		match self {
			ParamSet::Query(map) | ParamSet::Body(map) => map,
		}
	}

	/// True when the parameters travel in the request body.
	pub fn is_body(&self) -> bool {
		matches!(self, ParamSet::Body(_))
	}
}

/// A single HTTP request to be signed and executed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestSpec {
	/// HTTP method.
	pub method: Method,
	/// Target URL without any query string.
	pub url: Url,
	/// The live parameter set.
	pub params: ParamSet,
}
impl RequestSpec {
	/// Creates a builder for the provided method + URL.
	pub fn builder(method: Method, url: Url) -> RequestSpecBuilder {
		RequestSpecBuilder {
			method,
			url,
			query: BTreeMap::new(),
			body: BTreeMap::new(),
			query_set: false,
			body_set: false,
		}
	}
}

/// Builder that enforces the query-or-body exclusivity invariant.
#[derive(Clone, Debug)]
pub struct RequestSpecBuilder {
	method: Method,
	url: Url,
	query: BTreeMap<String, String>,
	body: BTreeMap<String, String>,
	query_set: bool,
	body_set: bool,
}
impl RequestSpecBuilder {
	/// Adds a single query parameter with an already-decoded value.
	pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.insert(key.into(), value.into());
		self.query_set = true;

		self
	}

	/// Ingests a raw query string such as `?screen_name=J7mbo&count=5`,
	/// percent-decoding every pair before it joins the parameter set.
	pub fn query_str(mut self, raw: &str) -> Self {
		let trimmed = raw.strip_prefix('?').unwrap_or(raw);

		for (key, value) in url::form_urlencoded::parse(trimmed.as_bytes()) {
			if !key.is_empty() {
				self.query.insert(key.into_owned(), value.into_owned());
			}
		}

		self.query_set = true;

		self
	}

	/// Adds a body parameter. Values beginning with `@` are escaped with a NUL
	/// byte prefix, a legacy quirk the upstream API expects.
	pub fn body_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		let value = value.into();
		let value =
			if value.starts_with('@') { format!("\0{value}") } else { value };

		self.body.insert(key.into(), value);
		self.body_set = true;

		self
	}

	/// Adds a boolean body parameter rendered as the literal `"true"`/`"false"`.
	pub fn body_flag(mut self, key: impl Into<String>, value: bool) -> Self {
		self.body.insert(key.into(), if value { "true" } else { "false" }.to_owned());
		self.body_set = true;

		self
	}

	/// Finalizes the spec, rejecting requests that populated both sets.
	pub fn build(self) -> Result<RequestSpec, SigningError> {
		if self.query_set && self.body_set {
			return Err(SigningError::ConflictingParameters);
		}

		let params = if self.body_set {
			ParamSet::Body(self.body)
		} else {
			ParamSet::Query(self.query)
		};

		Ok(RequestSpec { method: self.method, url: self.url, params })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test URL.")
	}

	#[test]
	fn method_parse_rejects_unsupported_verbs() {
		assert_eq!("get".parse::<Method>(), Ok(Method::Get));
		assert_eq!("DELETE".parse::<Method>(), Ok(Method::Delete));
		assert_eq!(
			"PATCH".parse::<Method>(),
			Err(SigningError::InvalidMethod { method: "PATCH".into() })
		);
	}

	#[test]
	fn mixed_parameter_sets_are_rejected() {
		let err = RequestSpec::builder(Method::Post, url("https://api.example.com/1/x.json"))
			.query_param("a", "1")
			.body_param("b", "2")
			.build()
			.expect_err("Builder should reject mixed parameter sets.");

		assert_eq!(err, SigningError::ConflictingParameters);
	}

	#[test]
	fn query_string_ingestion_percent_decodes() {
		let spec = RequestSpec::builder(Method::Get, url("https://api.example.com/1/x.json"))
			.query_str("?q=%23twitter&count=5")
			.build()
			.expect("Builder should accept a pure query set.");

		assert_eq!(spec.params.entries().get("q").map(String::as_str), Some("#twitter"));
		assert_eq!(spec.params.entries().get("count").map(String::as_str), Some("5"));
	}

	#[test]
	fn body_values_keep_legacy_quirks() {
		let spec = RequestSpec::builder(Method::Post, url("https://api.example.com/1/x.json"))
			.body_param("status", "@reader hello")
			.body_flag("possibly_sensitive", false)
			.build()
			.expect("Builder should accept a pure body set.");
		let entries = spec.params.entries();

		assert_eq!(entries.get("status").map(String::as_str), Some("\0@reader hello"));
		assert_eq!(entries.get("possibly_sensitive").map(String::as_str), Some("false"));
		assert!(spec.params.is_body());
	}
}
