//! Session-level error types shared across the coordinator, auth broker, and transports.
//!
//! Every error in this tree is [`Clone`]: a single refresh outcome fans out to every
//! parked waiter, so sources are retained behind [`Arc`] instead of plain boxes.
//! Callers match variants structurally; there are no sentinel codes to compare.

// self
use crate::{_prelude::*, codec::ParsedModel, request::RequestId};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Shared error source kept cloneable for waiter fan-out.
pub type SharedSource = Arc<dyn StdError + Send + Sync>;

/// Canonical session error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Transport failure (DNS, TCP, TLS, cancelled handshake).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Payload encode or model/error decode failure.
	#[error(transparent)]
	Serialization(#[from] SerializationError),
	/// Backend rejected the request with a non-401 4xx/5xx status.
	#[error(transparent)]
	Backend(#[from] BackendError),

	/// The identifier is already queued, active, or awaiting refresh.
	#[error("Request `{id}` is already queued, active, or awaiting refresh.")]
	DuplicateRequest {
		/// Identifier that collided at submission.
		id: RequestId,
	},
	/// The request was cancelled, explicitly or by a failed refresh.
	#[error("Request was cancelled.")]
	Cancelled,
	/// A 401 arrived for a request that carries no credential; permanent.
	#[error("Request was rejected as unauthorized.")]
	Unauthorized,
	/// The refresh pipeline is exhausted or blocked by the failure counter.
	#[error("Authentication is required before further credentialed operations.")]
	AuthenticationRequired,
}

/// Transport-level failures (network, IO, pinning).
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while executing the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: SharedSource,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while executing the request.")]
	Io {
		/// Originating IO error.
		#[source]
		source: Arc<std::io::Error>,
	},
	/// The exchange completed without yielding an HTTP status.
	#[error("Transport completed without an HTTP status.")]
	NoHttpStatus,
	/// The pinning policy rejected the presented trust chain.
	#[error("TLS challenge for `{host}` was rejected by the pinning policy.")]
	PinningRejected {
		/// Host that presented the rejected chain.
		host: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Arc::new(src) }
	}
}
impl From<std::io::Error> for TransportError {
	fn from(e: std::io::Error) -> Self {
		Self::Io { source: Arc::new(e) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Payload encode and model/error decode failures.
#[derive(Clone, Debug, ThisError)]
pub enum SerializationError {
	/// Request payload could not be encoded into body bytes.
	#[error("Request payload could not be encoded.")]
	PayloadEncode {
		/// Originating serializer failure.
		#[source]
		source: Arc<serde_json::Error>,
	},
	/// Response body could not be decoded into the expected model.
	#[error("Response model could not be decoded at `{path}`.")]
	ModelDecode {
		/// JSON path at which decoding failed.
		path: String,
		/// Originating deserializer failure.
		#[source]
		source: Arc<serde_json::Error>,
	},
	/// Error body could not be decoded into the expected error model.
	#[error("Error payload could not be decoded at `{path}`.")]
	ErrorDecode {
		/// JSON path at which decoding failed.
		path: String,
		/// Originating deserializer failure.
		#[source]
		source: Arc<serde_json::Error>,
	},
}
impl SerializationError {
	/// Wraps a payload encode failure.
	pub fn payload_encode(src: serde_json::Error) -> Self {
		Self::PayloadEncode { source: Arc::new(src) }
	}

	/// Wraps a model decode failure, preserving the failing JSON path.
	pub fn model_decode(src: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::ModelDecode { path: src.path().to_string(), source: Arc::new(src.into_inner()) }
	}

	/// Wraps an error-payload decode failure, preserving the failing JSON path.
	pub fn error_decode(src: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::ErrorDecode { path: src.path().to_string(), source: Arc::new(src.into_inner()) }
	}
}

/// Classified 4xx/5xx response (other than 401) carrying the parsed error payload.
#[derive(Clone, ThisError)]
#[error("Backend responded with HTTP {status}.")]
pub struct BackendError {
	/// HTTP status returned by the backend.
	pub status: u16,
	/// Parsed error payload, when an error parser was attached and a body arrived.
	pub model: Option<ParsedModel>,
}
impl BackendError {
	/// Returns the parsed error payload downcast to `T`, if present and matching.
	pub fn model_as<T>(&self) -> Option<&T>
	where
		T: 'static,
	{
		self.model.as_ref()?.downcast_ref::<T>()
	}
}
impl Debug for BackendError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BackendError")
			.field("status", &self.status)
			.field("model_present", &self.model.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn errors_clone_for_waiter_fanout() {
		let error = Error::from(TransportError::network(std::io::Error::other("socket closed")));
		let copy = error.clone();

		assert!(matches!(copy, Error::Transport(TransportError::Network { .. })));

		let source = StdError::source(&copy).expect("Transport errors should expose a source.");

		assert_eq!(
			source.to_string(),
			StdError::source(&error).map(ToString::to_string).unwrap_or_default(),
		);
	}

	#[test]
	fn backend_error_downcasts_model() {
		let error = BackendError { status: 500, model: Some(Arc::new("boom".to_string())) };

		assert_eq!(error.model_as::<String>().map(String::as_str), Some("boom"));
		assert!(error.model_as::<u32>().is_none());
		assert_eq!(error.to_string(), "Backend responded with HTTP 500.");
	}
}
