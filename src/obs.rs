//! Observability helpers and the wire-logging boundary.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `session_broker.flow`
//!   with the `flow` (operation) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `session_broker_flow_total` counter for
//!   every attempt/success/failure, labeled by `flow` + `outcome`.
//!
//! Wire-level request/response logging is an injected collaborator
//! ([`WireLogging`]); the obfuscators in [`obfuscate`] own sensitive-field
//! redaction for implementations that print headers or payloads.

pub mod obfuscate;
pub mod wire;

mod metrics;
mod tracing;

pub use metrics::*;
pub use obfuscate::*;
pub use tracing::*;
pub use wire::*;

// self
use crate::_prelude::*;

/// Coordinated flows observed by the session layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// One submitted request moving through dispatch and classification.
	Request,
	/// Single-flight credential refresh.
	Refresh,
	/// External authentication with raw sign-in material.
	Authenticate,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Request => "request",
			FlowKind::Refresh => "refresh",
			FlowKind::Authenticate => "authenticate",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a coordinated flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
