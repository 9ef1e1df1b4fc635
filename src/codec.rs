//! Model and error-payload parsing collaborators.
//!
//! Parsers are attached per request and run during response classification:
//! the model parser on 2xx bodies, the error parser on non-401 4xx/5xx
//! bodies. Both produce a type-erased model the caller downcasts back with
//! [`Response::model_as`](crate::response::Response::model_as) or
//! [`BackendError::model_as`](crate::error::BackendError::model_as).

// std
use std::marker::PhantomData;
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::SerializationError};

/// Type-erased parsed model shared between responses and backend errors.
pub type ParsedModel = Arc<dyn Any + Send + Sync>;

/// Decodes 2xx response bodies into a domain model.
pub trait ModelParser
where
	Self: Send + Sync,
{
	/// Decodes the body bytes, or reports a [`SerializationError`].
	fn decode(&self, data: &[u8]) -> Result<ParsedModel, SerializationError>;
}

/// Decodes non-401 4xx/5xx response bodies into an error model.
pub trait ErrorParser
where
	Self: Send + Sync,
{
	/// Decodes the body bytes, or reports a [`SerializationError`].
	fn decode(&self, data: &[u8]) -> Result<ParsedModel, SerializationError>;
}

/// JSON model parser for any deserializable `T`.
pub struct JsonModelParser<T>(PhantomData<fn() -> T>);
impl<T> JsonModelParser<T> {
	/// Creates the parser.
	pub const fn new() -> Self {
		Self(PhantomData)
	}
}
impl<T> Default for JsonModelParser<T> {
	fn default() -> Self {
		Self::new()
	}
}
impl<T> ModelParser for JsonModelParser<T>
where
	T: 'static + DeserializeOwned + Send + Sync,
{
	fn decode(&self, data: &[u8]) -> Result<ParsedModel, SerializationError> {
		decode_json::<T>(data)
			.map(|model| Arc::new(model) as ParsedModel)
			.map_err(SerializationError::model_decode)
	}
}

/// JSON error parser for any deserializable `T`.
pub struct JsonErrorParser<T>(PhantomData<fn() -> T>);
impl<T> JsonErrorParser<T> {
	/// Creates the parser.
	pub const fn new() -> Self {
		Self(PhantomData)
	}
}
impl<T> Default for JsonErrorParser<T> {
	fn default() -> Self {
		Self::new()
	}
}
impl<T> ErrorParser for JsonErrorParser<T>
where
	T: 'static + DeserializeOwned + Send + Sync,
{
	fn decode(&self, data: &[u8]) -> Result<ParsedModel, SerializationError> {
		decode_json::<T>(data)
			.map(|model| Arc::new(model) as ParsedModel)
			.map_err(SerializationError::error_decode)
	}
}

fn decode_json<T>(data: &[u8]) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(data);

	serde_path_to_error::deserialize(&mut deserializer)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, PartialEq, Deserialize)]
	struct User {
		name: String,
		admin: bool,
	}

	#[test]
	fn json_model_parser_decodes_and_erases() {
		let parser = JsonModelParser::<User>::new();
		let model = parser
			.decode(br#"{"name":"ada","admin":true}"#)
			.expect("Valid JSON body should decode.");

		assert_eq!(
			model.downcast_ref::<User>(),
			Some(&User { name: "ada".into(), admin: true }),
		);
	}

	#[test]
	fn decode_failure_reports_json_path() {
		let parser = JsonModelParser::<User>::new();
		let err = parser
			.decode(br#"{"name":"ada","admin":"yes"}"#)
			.expect_err("Mistyped field should fail to decode.");

		match err {
			SerializationError::ModelDecode { path, .. } => assert_eq!(path, "admin"),
			other => panic!("Expected a model decode failure, got {other:?}."),
		}
	}

	#[test]
	fn error_parser_wraps_failures_distinctly() {
		let parser = JsonErrorParser::<User>::new();
		let err = parser.decode(b"not json").expect_err("Garbage body should fail to decode.");

		assert!(matches!(err, SerializationError::ErrorDecode { .. }));
	}
}
