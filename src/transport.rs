//! Transport primitives for outbound HTTP exchanges.
//!
//! The session coordinator owns none of the socket machinery: it hands a
//! [`TransportRequest`] to an injected [`Transport`] and receives body bytes
//! plus [`ResponseMetadata`] back. Timeout enforcement belongs to the
//! transport; the coordinator runs no deadline timers of its own. Each request
//! carries the session's [`TrustEvaluator`] so transports that terminate TLS
//! themselves can put every challenge to the pinning policy.

pub mod task;

pub use task::*;

// self
use crate::{
	_prelude::*,
	error::TransportError,
	pinning::TrustEvaluator,
	request::{CachePolicy, Headers, Method},
};

/// Boxed future returned by [`Transport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ExchangeOutput, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing one exchange.
///
/// Implementations must be `Send + Sync + 'static` so the coordinator can run
/// them from detached tasks, and the returned future must be `Send` for the
/// lifetime of the in-flight exchange.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Executes the exchange, resolving with body and metadata or a
	/// transport-level error.
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// Fully prepared outbound exchange handed to a [`Transport`].
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// Target URL including query parameters.
	pub url: Url,
	/// HTTP method.
	pub method: Method,
	/// Merged session and request headers.
	pub headers: Headers,
	/// Encoded body bytes, if the request carries a payload.
	pub body: Option<Vec<u8>>,
	/// Timeout the transport must enforce.
	pub timeout: Duration,
	/// Local cache directive; transports without a cache layer ignore it.
	pub cache_policy: CachePolicy,
	/// Pinning evaluator to consult on TLS challenges.
	pub trust: TrustEvaluator,
}

/// Metadata captured from the most recent HTTP response.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code, if the exchange produced one.
	pub status: Option<u16>,
	/// Response headers.
	pub headers: Headers,
}

/// Successful outcome of one exchange.
#[derive(Clone, Debug)]
pub struct ExchangeOutput {
	/// Response body bytes, absent for empty bodies.
	pub body: Option<Vec<u8>>,
	/// Captured response metadata.
	pub metadata: ResponseMetadata,
}

/// Thin wrapper around [`ReqwestClient`] implementing [`Transport`].
///
/// reqwest terminates TLS inside its connector and exposes no per-challenge
/// hook, so deployments that pin certificates must bake the policy into the
/// client they inject here (e.g. a rustls config with a pinning verifier);
/// the [`TrustEvaluator`] carried by each request is for transports that
/// surface challenges directly.
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
impl std::ops::Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = client.request(reqwest_method(request.method), request.url.clone());

			for header in &request.headers {
				builder = builder.header(header.name.as_str(), header.value.as_str());
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}
			if let Ok(timeout) = std::time::Duration::try_from(request.timeout) {
				builder = builder.timeout(timeout);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let mut headers = Headers::new();

			for (name, value) in response.headers() {
				if let Ok(value) = value.to_str() {
					headers.insert(name.as_str(), value);
				}
			}

			let bytes = response.bytes().await.map_err(TransportError::from)?;
			let body = (!bytes.is_empty()).then(|| bytes.to_vec());

			Ok(ExchangeOutput {
				body,
				metadata: ResponseMetadata { status: Some(status), headers },
			})
		})
	}
}

#[cfg(feature = "reqwest")]
fn reqwest_method(method: Method) -> reqwest::Method {
	match method {
		Method::Get => reqwest::Method::GET,
		Method::Post => reqwest::Method::POST,
		Method::Put => reqwest::Method::PUT,
		Method::Patch => reqwest::Method::PATCH,
		Method::Delete => reqwest::Method::DELETE,
		Method::Head => reqwest::Method::HEAD,
	}
}
