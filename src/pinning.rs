//! TLS certificate-pinning decisions at the transport boundary.
//!
//! The evaluator is consulted once per TLS challenge with the full
//! leaf-to-root chain as raw DER bytes. Pinning is opt-in: a session built
//! without a policy always answers [`TrustDecision::UseDefault`]. A chain with
//! zero certificates is still put to the policy rather than skipped, so a
//! policy can reject hosts that present nothing to evaluate.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Predicate deciding whether a host's presented chain is acceptable.
pub trait PinningPolicy
where
	Self: Send + Sync,
{
	/// Returns `true` to proceed with default TLS handling, `false` to cancel
	/// the handshake.
	fn evaluate(&self, host: &str, chain: &CertificateChain) -> bool;
}

/// Ordered leaf-to-root certificate chain in raw DER bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertificateChain(Vec<Vec<u8>>);
impl CertificateChain {
	/// Wraps the provided DER certificates, leaf first.
	pub fn new(certificates: Vec<Vec<u8>>) -> Self {
		Self(certificates)
	}

	/// Returns the number of certificates in the chain.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when the handshake presented no certificates.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates certificates leaf to root.
	pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
		self.0.iter().map(Vec::as_slice)
	}
}
impl From<Vec<Vec<u8>>> for CertificateChain {
	fn from(certificates: Vec<Vec<u8>>) -> Self {
		Self::new(certificates)
	}
}

/// One TLS challenge as observed by a transport.
#[derive(Clone, Debug)]
pub struct TlsChallenge {
	/// Host that presented the chain.
	pub host: String,
	/// Presented certificate chain, possibly empty.
	pub chain: CertificateChain,
}
impl TlsChallenge {
	/// Creates a challenge for the provided host and chain.
	pub fn new(host: impl Into<String>, chain: impl Into<CertificateChain>) -> Self {
		Self { host: host.into(), chain: chain.into() }
	}
}

/// Outcome of evaluating one TLS challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrustDecision {
	/// Proceed with the transport's default TLS handling.
	UseDefault,
	/// Cancel the handshake; the request fails with
	/// [`TransportError::PinningRejected`](crate::error::TransportError::PinningRejected).
	CancelHandshake,
}

/// Per-session evaluator wrapping an optional [`PinningPolicy`].
#[derive(Clone, Default)]
pub struct TrustEvaluator {
	policy: Option<Arc<dyn PinningPolicy>>,
}
impl TrustEvaluator {
	/// Creates an evaluator that always uses default handling.
	pub fn disabled() -> Self {
		Self::default()
	}

	/// Creates an evaluator backed by the provided policy.
	pub fn new(policy: Arc<dyn PinningPolicy>) -> Self {
		Self { policy: Some(policy) }
	}

	/// Returns `true` when a policy is configured.
	pub fn is_enabled(&self) -> bool {
		self.policy.is_some()
	}

	/// Decides one TLS challenge.
	pub fn decide(&self, challenge: &TlsChallenge) -> TrustDecision {
		match &self.policy {
			None => TrustDecision::UseDefault,
			Some(policy) =>
				if policy.evaluate(&challenge.host, &challenge.chain) {
					TrustDecision::UseDefault
				} else {
					TrustDecision::CancelHandshake
				},
		}
	}
}
impl Debug for TrustEvaluator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TrustEvaluator").field("enabled", &self.is_enabled()).finish()
	}
}

/// Error returned when a pin string cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PinParseError {
	/// The pin does not start with the `sha256/` scheme.
	#[error("Pin must use the `sha256/<BASE64>` form.")]
	MissingScheme,
	/// The digest part is not valid base64 or has the wrong length.
	#[error("Pin digest must be 32 base64-encoded bytes.")]
	InvalidDigest,
}

/// Built-in policy matching SHA-256 fingerprints of presented certificates.
///
/// Hosts without registered pins pass through to default handling; a pinned
/// host is accepted only when at least one certificate anywhere in its chain
/// digests to one of the registered pins.
#[derive(Clone, Debug, Default)]
pub struct FingerprintPinning {
	pins: HashMap<String, Vec<[u8; 32]>>,
}
impl FingerprintPinning {
	/// Creates a policy with no pins registered.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a `sha256/<BASE64>` pin for the provided host.
	pub fn pin(mut self, host: impl Into<String>, pin: &str) -> Result<Self, PinParseError> {
		let digest = Self::parse_pin(pin)?;

		self.pins.entry(host.into()).or_default().push(digest);

		Ok(self)
	}

	/// Computes the pin string for a DER certificate, for building
	/// configurations from known certificates.
	pub fn pin_for_certificate(certificate: &[u8]) -> String {
		format!("sha256/{}", BASE64.encode(Sha256::digest(certificate)))
	}

	fn parse_pin(pin: &str) -> Result<[u8; 32], PinParseError> {
		let encoded = pin.strip_prefix("sha256/").ok_or(PinParseError::MissingScheme)?;
		let bytes = BASE64.decode(encoded).map_err(|_| PinParseError::InvalidDigest)?;

		bytes.try_into().map_err(|_| PinParseError::InvalidDigest)
	}
}
impl PinningPolicy for FingerprintPinning {
	fn evaluate(&self, host: &str, chain: &CertificateChain) -> bool {
		let Some(pins) = self.pins.get(host) else {
			return true;
		};

		chain.iter().any(|certificate| {
			let digest: [u8; 32] = Sha256::digest(certificate).into();

			pins.contains(&digest)
		})
	}
}
