//! Wire-level logging boundary for outgoing and incoming traffic.

// self
use crate::{_prelude::*, request::Headers};
#[cfg(feature = "tracing")]
use crate::obs::{HeaderObfuscator, JsonPayloadObfuscator};

/// Collaborator notified of every outgoing request and incoming response.
///
/// Implementations own redaction: the session hands over the real headers and
/// body bytes, so anything printed must go through an obfuscation step (see
/// [`obfuscate`](crate::obs::obfuscate)) before leaving the process.
pub trait WireLogging
where
	Self: Send + Sync,
{
	/// Called after a request is handed to its transport task.
	fn log_outgoing(&self, url: &Url, headers: &Headers, payload: Option<&[u8]>);

	/// Called when a raw response (with or without a status) has arrived.
	fn log_incoming(&self, url: &Url, status: Option<u16>, headers: &Headers, payload: Option<&[u8]>);
}

/// [`WireLogging`] implementation emitting `tracing` events with obfuscated
/// headers and payloads.
#[cfg(feature = "tracing")]
#[derive(Clone, Debug, Default)]
pub struct TracingWireLogger {
	headers: HeaderObfuscator,
	payload: JsonPayloadObfuscator,
}
#[cfg(feature = "tracing")]
impl TracingWireLogger {
	/// Creates a logger redacting the provided header names and top-level
	/// payload fields.
	pub fn new<H, P, S, T>(sensitive_headers: H, sensitive_fields: P) -> Self
	where
		H: IntoIterator<Item = S>,
		P: IntoIterator<Item = T>,
		S: Into<String>,
		T: Into<String>,
	{
		Self {
			headers: HeaderObfuscator::new(sensitive_headers),
			payload: JsonPayloadObfuscator::new(sensitive_fields),
		}
	}
}
#[cfg(feature = "tracing")]
impl WireLogging for TracingWireLogger {
	fn log_outgoing(&self, url: &Url, headers: &Headers, payload: Option<&[u8]>) {
		tracing::info!(
			target: "session_broker.wire",
			url = %url,
			headers = %self.headers.describe(headers),
			payload = %self.payload.describe(payload),
			"OUT",
		);
	}

	fn log_incoming(&self, url: &Url, status: Option<u16>, headers: &Headers, payload: Option<&[u8]>) {
		tracing::info!(
			target: "session_broker.wire",
			url = %url,
			status = status.map_or(-1, i32::from),
			headers = %self.headers.describe(headers),
			payload = %self.payload.describe(payload),
			"IN",
		);
	}
}
