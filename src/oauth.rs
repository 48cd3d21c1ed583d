//! OAuth 1.0a request signing.
//!
//! The signer turns a [`RequestSpec`] plus a set of [`Credentials`] into an
//! `Authorization: OAuth ...` header: it merges the canonical `oauth_*` fields
//! with every live request parameter, sorts the merged mapping bytewise,
//! percent-encodes keys and values per RFC 3986, HMAC-SHA1-signs the resulting
//! base string with the composite secret key, and renders the header from the
//! seven canonical fields only. Signing is pure computation with no side
//! effects; given a fixed nonce and timestamp it is fully deterministic.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use rand::Rng;
use sha1::Sha1;
// self
use crate::{_prelude::*, error::SigningError, request::RequestSpec};

type HmacSha1 = Hmac<Sha1>;

/// Signature method token carried by every signed request.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
/// Protocol version token carried by every signed request.
pub const OAUTH_VERSION: &str = "1.0";

const NONCE_LEN: usize = 32;

// RFC 3986 / RFC 5849 section 3.6: ALPHA, DIGIT, '-', '.', '_', '~' must not
// be encoded; everything else must be, with uppercase hex digits.
const RESERVED: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encodes a value per RFC 3986 with the OAuth unreserved set.
pub fn percent_encode(input: &str) -> String {
	utf8_percent_encode(input, RESERVED).to_string()
}

/// Decodes a percent-encoded value, replacing invalid UTF-8 sequences.
pub fn percent_decode(input: &str) -> String {
	percent_decode_str(input).decode_utf8_lossy().into_owned()
}

/// The four opaque credential strings, immutable for the signer's lifetime.
///
/// All four must be non-empty; [`Credentials::new`] and the serde path both
/// enforce the invariant so a constructed value always signs validly.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "CredentialParts")]
pub struct Credentials {
	consumer_key: String,
	consumer_secret: String,
	access_token: String,
	access_token_secret: String,
}
impl Credentials {
	/// Validates and assembles a credential set.
	pub fn new(
		consumer_key: impl Into<String>,
		consumer_secret: impl Into<String>,
		access_token: impl Into<String>,
		access_token_secret: impl Into<String>,
	) -> Result<Self, SigningError> {
		let parts = CredentialParts {
			consumer_key: consumer_key.into(),
			consumer_secret: consumer_secret.into(),
			access_token: access_token.into(),
			access_token_secret: access_token_secret.into(),
		};

		parts.try_into()
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("consumer_key", &self.consumer_key)
			.field("consumer_secret", &"<redacted>")
			.field("access_token", &self.access_token)
			.field("access_token_secret", &"<redacted>")
			.finish()
	}
}

#[derive(Clone, Deserialize)]
struct CredentialParts {
	consumer_key: String,
	consumer_secret: String,
	access_token: String,
	access_token_secret: String,
}
impl TryFrom<CredentialParts> for Credentials {
	type Error = SigningError;

	fn try_from(parts: CredentialParts) -> Result<Self, Self::Error> {
		for (field, value) in [
			("consumer_key", &parts.consumer_key),
			("consumer_secret", &parts.consumer_secret),
			("access_token", &parts.access_token),
			("access_token_secret", &parts.access_token_secret),
		] {
			if value.trim().is_empty() {
				return Err(SigningError::MissingCredential { field });
			}
		}

		Ok(Self {
			consumer_key: parts.consumer_key,
			consumer_secret: parts.consumer_secret,
			access_token: parts.access_token,
			access_token_secret: parts.access_token_secret,
		})
	}
}

/// The canonical `oauth_*` parameter set, constructed fresh per request and
/// discarded after signing.
#[derive(Clone, Debug)]
pub struct OAuthParams {
	/// Consumer key identifying the application.
	pub consumer_key: String,
	/// Per-request uniqueness value.
	pub nonce: String,
	/// Unix time of the request, in seconds, rendered as a decimal string.
	pub timestamp: String,
	/// Access token identifying the account.
	pub token: String,
}
impl OAuthParams {
	fn signing_entries(&self) -> [(&'static str, &str); 6] {
		[
			("oauth_consumer_key", &self.consumer_key),
			("oauth_nonce", &self.nonce),
			("oauth_signature_method", SIGNATURE_METHOD),
			("oauth_timestamp", &self.timestamp),
			("oauth_token", &self.token),
			("oauth_version", OAUTH_VERSION),
		]
	}

	/// Renders the `Authorization` header value from the seven canonical
	/// fields. Merged request parameters never appear here; they only
	/// participate in the signature.
	pub fn authorization_header(&self, signature: &str) -> String {
		let fields = [
			("oauth_consumer_key", self.consumer_key.as_str()),
			("oauth_nonce", &self.nonce),
			("oauth_signature", signature),
			("oauth_signature_method", SIGNATURE_METHOD),
			("oauth_timestamp", &self.timestamp),
			("oauth_token", &self.token),
			("oauth_version", OAUTH_VERSION),
		];
		let rendered = fields
			.into_iter()
			.map(|(key, value)| format!("{key}=\"{}\"", percent_encode(value)))
			.collect::<Vec<_>>()
			.join(", ");

		format!("OAuth {rendered}")
	}
}

/// A [`RequestSpec`] paired with its computed `Authorization` header, ready
/// for the executor and never persisted.
#[derive(Clone, Debug)]
pub struct SignedRequest {
	/// The request being authorized.
	pub spec: RequestSpec,
	/// Complete `Authorization` header value, `OAuth ` prefix included.
	pub authorization: String,
}

/// Produces OAuth 1.0a authorization headers for single HTTP requests.
#[derive(Clone, Debug)]
pub struct Signer {
	credentials: Credentials,
}
impl Signer {
	/// Creates a signer over a validated credential set.
	pub fn new(credentials: Credentials) -> Self {
		Self { credentials }
	}

	/// Signs a request with a fresh random nonce and the current Unix time.
	pub fn sign(&self, spec: RequestSpec) -> SignedRequest {
		let nonce = random_nonce();
		let timestamp = OffsetDateTime::now_utc().unix_timestamp();

		self.sign_at(spec, &nonce, timestamp)
	}

	/// Signs a request with a caller-chosen nonce and timestamp.
	///
	/// Deterministic: the same credentials, nonce, timestamp, and parameters
	/// always yield the same signature, which is what fixture tests rely on.
	pub fn sign_at(&self, spec: RequestSpec, nonce: &str, timestamp: i64) -> SignedRequest {
		let params = OAuthParams {
			consumer_key: self.credentials.consumer_key.clone(),
			nonce: nonce.to_owned(),
			timestamp: timestamp.to_string(),
			token: self.credentials.access_token.clone(),
		};
		let base = signature_base_string(&spec, &params);
		let signing_key = format!(
			"{}&{}",
			percent_encode(&self.credentials.consumer_secret),
			percent_encode(&self.credentials.access_token_secret),
		);
		// HMAC accepts keys of any length, so construction cannot fail.
		let mut mac = <HmacSha1 as Mac>::new_from_slice(signing_key.as_bytes())
			.expect("HMAC-SHA1 key setup is infallible.");

		mac.update(base.as_bytes());

		let signature = BASE64.encode(mac.finalize().into_bytes());
		let authorization = params.authorization_header(&signature);

		SignedRequest { spec, authorization }
	}
}

/// Builds the canonical signature base string for a request:
/// `METHOD&pct(url)&pct(sorted-parameter-string)`.
///
/// On key collision a request parameter replaces the canonical entry in the
/// merged mapping, while [`OAuthParams::authorization_header`] still renders
/// the canonical value. A request carrying a parameter literally named
/// `oauth_nonce` (or any `oauth_*` key) therefore signs over one value and
/// advertises another, and the upstream verifier will reject it. Do not use
/// `oauth_`-prefixed parameter names.
pub fn signature_base_string(spec: &RequestSpec, params: &OAuthParams) -> String {
	let mut merged = BTreeMap::new();

	for (key, value) in params.signing_entries() {
		merged.insert(key.to_owned(), value.to_owned());
	}
	for (key, value) in spec.params.entries() {
		merged.insert(key.clone(), value.clone());
	}

	// BTreeMap iteration is already bytewise-ascending by key.
	let parameter_string = merged
		.iter()
		.map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
		.collect::<Vec<_>>()
		.join("&");

	format!(
		"{}&{}&{}",
		spec.method.as_str(),
		percent_encode(spec.url.as_str()),
		percent_encode(&parameter_string),
	)
}

fn random_nonce() -> String {
	rand::rng()
		.sample_iter(rand::distr::Alphanumeric)
		.take(NONCE_LEN)
		.map(char::from)
		.collect()
}
