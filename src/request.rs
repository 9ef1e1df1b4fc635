//! Immutable request descriptors submitted to the session coordinator.

pub mod headers;
pub mod payload;

pub use headers::*;
pub use payload::*;

// self
use crate::{
	_prelude::*,
	codec::{ErrorParser, ModelParser},
};

const REQUEST_ID_MAX_LEN: usize = 128;

/// Default per-request timeout applied when the builder receives none.
pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(60);

/// Error returned when request identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RequestIdError {
	/// The identifier was empty.
	#[error("Request identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Request identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier exceeded the allowed character count.
	#[error("Request identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Stable unique identifier of a submitted request.
///
/// Identifiers are what the coordinator deduplicates and cancels by; a retry of
/// the same logical request must carry a fresh identifier
/// (see [`Request::with_new_identifier`]).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestId(String);
impl RequestId {
	/// Creates an identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, RequestIdError> {
		let view = value.as_ref();

		if view.is_empty() {
			return Err(RequestIdError::Empty);
		}
		if view.chars().any(char::is_whitespace) {
			return Err(RequestIdError::ContainsWhitespace);
		}
		if view.len() > REQUEST_ID_MAX_LEN {
			return Err(RequestIdError::TooLong { max: REQUEST_ID_MAX_LEN });
		}

		Ok(Self(view.to_owned()))
	}

	/// Generates a fresh random identifier.
	pub fn generate() -> Self {
		Self(format!("{:032x}", rand::random::<u128>()))
	}
}
impl AsRef<str> for RequestId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<RequestId> for String {
	fn from(value: RequestId) -> Self {
		value.0
	}
}
impl TryFrom<String> for RequestId {
	type Error = RequestIdError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(&value)
	}
}
impl Debug for RequestId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "RequestId({})", self.0)
	}
}
impl Display for RequestId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// HTTP method of an outgoing request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// HTTP GET.
	Get,
	/// HTTP POST.
	Post,
	/// HTTP PUT.
	Put,
	/// HTTP PATCH.
	Patch,
	/// HTTP DELETE.
	Delete,
	/// HTTP HEAD.
	Head,
}
impl Method {
	/// Returns the canonical uppercase method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
			Self::Head => "HEAD",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Whether a request must carry a session credential.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthRequirement {
	/// Dispatch without consulting the auth coordinator.
	#[default]
	None,
	/// Resolve an Authorization header before dispatch; 401 responses re-route
	/// through the refresh pipeline.
	Credentialed,
}

/// Local cache directive forwarded to the transport.
///
/// Transports without a cache layer are free to ignore it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CachePolicy {
	/// Bypass any local cache and always hit the network.
	#[default]
	IgnoreCache,
	/// Defer to the transport's protocol-level cache handling.
	ProtocolDefault,
}

/// Immutable descriptor of one outgoing request.
///
/// Descriptors are created through [`Request::builder`] and never mutated after
/// submission; retrying produces a sibling under a fresh identifier.
#[derive(Clone)]
pub struct Request {
	id: RequestId,
	url: Url,
	method: Method,
	headers: Headers,
	payload: Option<Payload>,
	timeout: Duration,
	cache_policy: CachePolicy,
	auth: AuthRequirement,
	model_parser: Option<Arc<dyn ModelParser>>,
	error_parser: Option<Arc<dyn ErrorParser>>,
}
impl Request {
	/// Starts building a request for the provided method and target URL.
	pub fn builder(method: Method, url: Url) -> RequestBuilder {
		RequestBuilder {
			id: None,
			url,
			method,
			headers: Headers::new(),
			payload: None,
			timeout: DEFAULT_TIMEOUT,
			cache_policy: CachePolicy::default(),
			auth: AuthRequirement::default(),
			model_parser: None,
			error_parser: None,
		}
	}

	/// Returns the request identifier.
	pub fn id(&self) -> &RequestId {
		&self.id
	}

	/// Returns the target URL including query parameters.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Returns the HTTP method.
	pub fn method(&self) -> Method {
		self.method
	}

	/// Returns the caller-supplied headers.
	pub fn headers(&self) -> &Headers {
		&self.headers
	}

	/// Returns the payload, if any.
	pub fn payload(&self) -> Option<&Payload> {
		self.payload.as_ref()
	}

	/// Returns the per-request timeout enforced by the transport.
	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Returns the cache directive.
	pub fn cache_policy(&self) -> CachePolicy {
		self.cache_policy
	}

	/// Returns the auth requirement.
	pub fn auth(&self) -> AuthRequirement {
		self.auth
	}

	/// Returns the model parser attached for 2xx bodies, if any.
	pub fn model_parser(&self) -> Option<&Arc<dyn ModelParser>> {
		self.model_parser.as_ref()
	}

	/// Returns the error parser attached for 4xx/5xx bodies, if any.
	pub fn error_parser(&self) -> Option<&Arc<dyn ErrorParser>> {
		self.error_parser.as_ref()
	}

	/// Clones the descriptor under a freshly generated identifier.
	///
	/// The coordinator rejects resubmission of an identifier it has already
	/// seen and not yet forgotten, so retries go through this instead of
	/// resubmitting the original.
	pub fn with_new_identifier(&self) -> Self {
		let mut copy = self.clone();

		copy.id = RequestId::generate();

		copy
	}
}
impl Debug for Request {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Request")
			.field("id", &self.id)
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("auth", &self.auth)
			.finish()
	}
}

/// Fluent builder for [`Request`].
pub struct RequestBuilder {
	id: Option<RequestId>,
	url: Url,
	method: Method,
	headers: Headers,
	payload: Option<Payload>,
	timeout: Duration,
	cache_policy: CachePolicy,
	auth: AuthRequirement,
	model_parser: Option<Arc<dyn ModelParser>>,
	error_parser: Option<Arc<dyn ErrorParser>>,
}
impl RequestBuilder {
	/// Overrides the generated identifier with a caller-chosen one.
	pub fn id(mut self, id: RequestId) -> Self {
		self.id = Some(id);

		self
	}

	/// Adds or replaces a header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Appends a query parameter to the target URL.
	pub fn query(mut self, name: &str, value: &str) -> Self {
		self.url.query_pairs_mut().append_pair(name, value);

		self
	}

	/// Attaches a payload.
	pub fn payload(mut self, payload: Payload) -> Self {
		self.payload = Some(payload);

		self
	}

	/// Overrides the default timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the default cache directive.
	pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
		self.cache_policy = policy;

		self
	}

	/// Marks the request as requiring a session credential.
	pub fn credentialed(mut self) -> Self {
		self.auth = AuthRequirement::Credentialed;

		self
	}

	/// Attaches a parser for 2xx response bodies.
	pub fn model_parser(mut self, parser: Arc<dyn ModelParser>) -> Self {
		self.model_parser = Some(parser);

		self
	}

	/// Attaches a parser for 4xx/5xx response bodies.
	pub fn error_parser(mut self, parser: Arc<dyn ErrorParser>) -> Self {
		self.error_parser = Some(parser);

		self
	}

	/// Finalizes the descriptor, generating an identifier when none was set.
	pub fn build(self) -> Request {
		Request {
			id: self.id.unwrap_or_else(RequestId::generate),
			url: self.url,
			method: self.method,
			headers: self.headers,
			payload: self.payload,
			timeout: self.timeout,
			cache_policy: self.cache_policy,
			auth: self.auth,
			model_parser: self.model_parser,
			error_parser: self.error_parser,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn target() -> Url {
		Url::parse("https://api.example.com/v1/users").expect("Test URL should parse.")
	}

	#[test]
	fn identifiers_validate_and_generate() {
		assert_eq!(RequestId::new(""), Err(RequestIdError::Empty));
		assert_eq!(RequestId::new("id with space"), Err(RequestIdError::ContainsWhitespace));
		assert!(RequestId::new("a".repeat(129)).is_err());

		let generated = RequestId::generate();

		assert_eq!(generated.as_ref().len(), 32);
		assert_ne!(generated, RequestId::generate());
	}

	#[test]
	fn builder_applies_defaults() {
		let request = Request::builder(Method::Get, target()).build();

		assert_eq!(request.timeout(), DEFAULT_TIMEOUT);
		assert_eq!(request.cache_policy(), CachePolicy::IgnoreCache);
		assert_eq!(request.auth(), AuthRequirement::None);
		assert!(request.payload().is_none());
	}

	#[test]
	fn query_parameters_land_in_url() {
		let request =
			Request::builder(Method::Get, target()).query("page", "2").query("q", "a b").build();

		assert_eq!(request.url().query(), Some("page=2&q=a+b"));
	}

	#[test]
	fn retry_copies_everything_but_the_identifier() {
		let request = Request::builder(Method::Post, target())
			.header("X-Trace", "abc")
			.credentialed()
			.build();
		let retry = request.with_new_identifier();

		assert_ne!(retry.id(), request.id());
		assert_eq!(retry.url(), request.url());
		assert_eq!(retry.headers(), request.headers());
		assert_eq!(retry.auth(), request.auth());
	}
}
