//! Case-insensitive, insertion-ordered HTTP header collection.

// self
use crate::_prelude::*;

/// Single HTTP header name/value pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Header {
	/// Header name as supplied by the caller; matching is case-insensitive.
	pub name: String,
	/// Header value.
	pub value: String,
}
impl Header {
	/// Creates a new header pair.
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self { name: name.into(), value: value.into() }
	}
}
impl Display for Header {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}: {}", self.name, self.value)
	}
}

/// Ordered header set with case-insensitive name lookup.
///
/// Insertion order is preserved so transports emit headers the way callers wrote
/// them; inserting an existing name replaces the value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers(Vec<Header>);
impl Headers {
	/// Creates an empty header set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces a header, matching the name case-insensitively.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let header = Header::new(name, value);

		match self.position(&header.name) {
			Some(index) => self.0[index] = header,
			None => self.0.push(header),
		}
	}

	/// Removes a header by name, if present.
	pub fn remove(&mut self, name: &str) {
		if let Some(index) = self.position(name) {
			self.0.remove(index);
		}
	}

	/// Returns the value for the provided name, if present.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.position(name).map(|index| self.0[index].value.as_str())
	}

	/// Returns `true` when a header with the provided name exists.
	pub fn contains(&self, name: &str) -> bool {
		self.position(name).is_some()
	}

	/// Returns the number of headers.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no headers are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates headers in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &Header> {
		self.0.iter()
	}

	fn position(&self, name: &str) -> Option<usize> {
		self.0.iter().position(|header| header.name.eq_ignore_ascii_case(name))
	}
}
impl<N, V> FromIterator<(N, V)> for Headers
where
	N: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
		let mut headers = Self::new();

		for (name, value) in iter {
			headers.insert(name, value);
		}

		headers
	}
}
impl<'a> IntoIterator for &'a Headers {
	type IntoIter = std::slice::Iter<'a, Header>;
	type Item = &'a Header;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
