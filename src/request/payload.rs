//! Request payload kinds and their wire encodings.

// self
use crate::{_prelude::*, error::SerializationError};

/// Outgoing request payload.
///
/// Encoding is deferred until dispatch so a queued request never holds body
/// bytes; a payload that fails to encode surfaces as
/// [`SerializationError::PayloadEncode`] without reaching the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
	/// JSON document sent as `application/json`.
	Json(serde_json::Value),
	/// Name/value pairs sent as `application/x-www-form-urlencoded`.
	Form(Vec<(String, String)>),
}
impl Payload {
	/// Builds a JSON payload from any serializable value.
	pub fn json<T>(value: &T) -> Result<Self, SerializationError>
	where
		T: Serialize,
	{
		serde_json::to_value(value).map(Self::Json).map_err(SerializationError::payload_encode)
	}

	/// Builds a form payload from name/value pairs.
	pub fn form<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Self
	where
		N: Into<String>,
		V: Into<String>,
	{
		Self::Form(pairs.into_iter().map(|(name, value)| (name.into(), value.into())).collect())
	}

	/// Returns the MIME type matching this payload's encoding.
	pub const fn content_type(&self) -> &'static str {
		match self {
			Self::Json(_) => "application/json",
			Self::Form(_) => "application/x-www-form-urlencoded",
		}
	}

	/// Encodes the payload into body bytes.
	pub fn encode(&self) -> Result<Vec<u8>, SerializationError> {
		match self {
			Self::Json(value) =>
				serde_json::to_vec(value).map_err(SerializationError::payload_encode),
			Self::Form(pairs) => {
				let mut serializer = url::form_urlencoded::Serializer::new(String::new());

				for (name, value) in pairs {
					serializer.append_pair(name, value);
				}

				Ok(serializer.finish().into_bytes())
			},
		}
	}
}
