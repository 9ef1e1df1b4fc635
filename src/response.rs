//! Raw and classified responses delivered back to callers.

// self
use crate::{_prelude::*, codec::ParsedModel, request::Headers};

/// Transport-level response before classification.
#[derive(Clone, Debug, Default)]
pub struct RawResponse {
	/// HTTP status code, absent when the transport produced none.
	pub status: Option<u16>,
	/// Response headers.
	pub headers: Headers,
	/// Response body bytes, if any arrived.
	pub body: Option<Vec<u8>>,
}

/// Classified successful response.
pub struct Response {
	/// The raw transport response.
	pub raw: RawResponse,
	/// Parsed domain model, when a model parser was attached and a 2xx body
	/// arrived; pass-through statuses carry none.
	pub model: Option<ParsedModel>,
}
impl Response {
	/// Returns the parsed model downcast to `T`, if present and matching.
	pub fn model_as<T>(&self) -> Option<&T>
	where
		T: 'static,
	{
		self.model.as_ref()?.downcast_ref::<T>()
	}
}
impl Debug for Response {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Response")
			.field("status", &self.raw.status)
			.field("body_len", &self.raw.body.as_ref().map(Vec::len))
			.field("model_present", &self.model.is_some())
			.finish()
	}
}

/// HTTP status bucket driving response classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusGroup {
	/// 200–299.
	Success,
	/// 300–399.
	Redirect,
	/// 400–499.
	ClientError,
	/// 500–599.
	ServerError,
	/// Absent or out-of-range status.
	Unknown,
}
impl StatusGroup {
	/// Buckets an optional status code.
	pub const fn from_status(status: Option<u16>) -> Self {
		match status {
			Some(200..=299) => Self::Success,
			Some(300..=399) => Self::Redirect,
			Some(400..=499) => Self::ClientError,
			Some(500..=599) => Self::ServerError,
			_ => Self::Unknown,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_groups_cover_every_bucket() {
		assert_eq!(StatusGroup::from_status(Some(200)), StatusGroup::Success);
		assert_eq!(StatusGroup::from_status(Some(299)), StatusGroup::Success);
		assert_eq!(StatusGroup::from_status(Some(302)), StatusGroup::Redirect);
		assert_eq!(StatusGroup::from_status(Some(404)), StatusGroup::ClientError);
		assert_eq!(StatusGroup::from_status(Some(503)), StatusGroup::ServerError);
		assert_eq!(StatusGroup::from_status(Some(600)), StatusGroup::Unknown);
		assert_eq!(StatusGroup::from_status(Some(199)), StatusGroup::Unknown);
		assert_eq!(StatusGroup::from_status(None), StatusGroup::Unknown);
	}

	#[test]
	fn response_model_downcast() {
		let response = Response {
			raw: RawResponse { status: Some(201), headers: Headers::new(), body: None },
			model: Some(Arc::new(42_u32)),
		};

		assert_eq!(response.model_as::<u32>(), Some(&42));
		assert!(response.model_as::<String>().is_none());
	}
}
