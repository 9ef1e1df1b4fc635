//! Sensitive-field redaction for wire-log descriptions.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
// self
use crate::request::Headers;

const SUBSTITUTE: &str = "*";
const MAX_DESCRIPTION_LEN: usize = 400;
const EMPTY_PLACEHOLDER: &str = "--";

/// Renders header sets with configured names replaced by a substitute.
#[derive(Clone, Debug, Default)]
pub struct HeaderObfuscator {
	sensitive: Vec<String>,
}
impl HeaderObfuscator {
	/// Creates an obfuscator redacting the provided header names
	/// (case-insensitive).
	pub fn new<I, S>(sensitive_keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { sensitive: sensitive_keys.into_iter().map(Into::into).collect() }
	}

	/// Renders the headers as `name: value; ...` with sensitive values
	/// substituted.
	pub fn describe(&self, headers: &Headers) -> String {
		if headers.is_empty() {
			return EMPTY_PLACEHOLDER.into();
		}

		headers
			.iter()
			.map(|header| {
				if self.is_sensitive(&header.name) {
					format!("{}: {SUBSTITUTE}", header.name)
				} else {
					header.to_string()
				}
			})
			.collect::<Vec<_>>()
			.join("; ")
	}

	fn is_sensitive(&self, name: &str) -> bool {
		self.sensitive.iter().any(|key| key.eq_ignore_ascii_case(name))
	}
}

/// Renders JSON payloads with configured top-level fields replaced by a
/// substitute.
///
/// Non-JSON payloads fall back to a UTF-8 rendering, or a base64 marker for
/// binary bodies; long descriptions are truncated with a total-byte note.
#[derive(Clone, Debug, Default)]
pub struct JsonPayloadObfuscator {
	sensitive: Vec<String>,
}
impl JsonPayloadObfuscator {
	/// Creates an obfuscator redacting the provided top-level field names.
	pub fn new<I, S>(sensitive_keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { sensitive: sensitive_keys.into_iter().map(Into::into).collect() }
	}

	/// Renders the payload bytes for logging, `--` when absent.
	pub fn describe(&self, payload: Option<&[u8]>) -> String {
		let Some(data) = payload else {
			return EMPTY_PLACEHOLDER.into();
		};

		match serde_json::from_slice::<serde_json::Value>(data) {
			Ok(mut json) => {
				if let Some(object) = json.as_object_mut() {
					for key in &self.sensitive {
						if object.contains_key(key) {
							object.insert(
								key.clone(),
								serde_json::Value::String(SUBSTITUTE.into()),
							);
						}
					}
				}

				let pretty =
					serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string());

				truncate_description(pretty, data.len())
			},
			Err(_) => match std::str::from_utf8(data) {
				Ok(text) => truncate_description(text.to_owned(), data.len()),
				Err(_) => format!("base64:{}", BASE64.encode(data)),
			},
		}
	}
}

fn truncate_description(mut text: String, total_bytes: usize) -> String {
	if text.len() <= MAX_DESCRIPTION_LEN {
		return text;
	}

	let mut end = MAX_DESCRIPTION_LEN;

	while !text.is_char_boundary(end) {
		end -= 1;
	}

	text.truncate(end);
	text.push_str(&format!("... (total bytes: {total_bytes})"));

	text
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn header_obfuscator_substitutes_case_insensitively() {
		let headers =
			Headers::from_iter([("Authorization", "Bearer secret"), ("Accept", "application/json")]);
		let rendered = HeaderObfuscator::new(["authorization"]).describe(&headers);

		assert_eq!(rendered, "Authorization: *; Accept: application/json");
	}

	#[test]
	fn payload_obfuscator_redacts_configured_fields() {
		let body = br#"{"password":"hunter2","username":"ada"}"#;
		let rendered = JsonPayloadObfuscator::new(["password"]).describe(Some(body));

		assert!(!rendered.contains("hunter2"));
		assert!(rendered.contains("\"password\": \"*\""));
		assert!(rendered.contains("ada"));
	}

	#[test]
	fn payload_obfuscator_falls_back_for_non_json() {
		let obfuscator = JsonPayloadObfuscator::default();

		assert_eq!(obfuscator.describe(None), "--");
		assert_eq!(obfuscator.describe(Some(b"plain text")), "plain text");
		assert_eq!(obfuscator.describe(Some(&[0xFF, 0xFE])), "base64://4=");
	}

	#[test]
	fn long_descriptions_are_truncated_with_a_byte_note() {
		let body = format!("x{}", "y".repeat(600));
		let rendered = JsonPayloadObfuscator::default().describe(Some(body.as_bytes()));

		assert!(rendered.starts_with('x'));
		assert!(rendered.ends_with("... (total bytes: 601)"));
		assert!(rendered.len() < body.len());
	}
}
