//! Coordinated client-side HTTP session layer: deduplicated request queues,
//! single-flight token refresh, and certificate-pinning decisions behind one
//! transport boundary.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod codec;
pub mod error;
pub mod ext;
pub mod obs;
pub mod pinning;
pub mod request;
pub mod response;
pub mod session;
pub mod store;
pub mod transport;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Scripted collaborator doubles and helpers for integration tests;
	//! enabled via `cfg(test)` or the `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicU64, Ordering},
	};
	// self
	use crate::{
		auth::{AuthCredential, Credential, TokenActionFuture, TokenActions},
		error::TransportError,
		pinning::{TlsChallenge, TrustDecision},
		request::Headers,
		transport::{
			ExchangeOutput, ResponseMetadata, Transport, TransportFuture, TransportRequest,
		},
	};

	/// Scripted outcome of one exchange.
	pub enum ScriptedOutcome {
		/// Respond with a status, optional body, and response headers.
		Respond {
			/// HTTP status to report.
			status: u16,
			/// Body bytes, if any.
			body: Option<Vec<u8>>,
			/// Response headers.
			headers: Headers,
		},
		/// Complete without an HTTP status, as a non-HTTP transport would.
		NoStatus,
		/// Fail with a transport error.
		Error(TransportError),
		/// Never complete; the exchange only ends through cancellation.
		Stall,
	}

	/// One scripted exchange, optionally preceded by a simulated TLS
	/// challenge put to the request's trust evaluator.
	pub struct ScriptedExchange {
		challenge: Option<(String, Vec<Vec<u8>>)>,
		outcome: ScriptedOutcome,
	}
	impl ScriptedExchange {
		/// Responds with a bare status.
		pub fn status(status: u16) -> Self {
			Self {
				challenge: None,
				outcome: ScriptedOutcome::Respond { status, body: None, headers: Headers::new() },
			}
		}

		/// Responds with a status and body.
		pub fn status_with_body(status: u16, body: impl Into<Vec<u8>>) -> Self {
			Self {
				challenge: None,
				outcome: ScriptedOutcome::Respond {
					status,
					body: Some(body.into()),
					headers: Headers::new(),
				},
			}
		}

		/// Completes without an HTTP status.
		pub fn no_status() -> Self {
			Self { challenge: None, outcome: ScriptedOutcome::NoStatus }
		}

		/// Fails with the provided transport error.
		pub fn error(error: TransportError) -> Self {
			Self { challenge: None, outcome: ScriptedOutcome::Error(error) }
		}

		/// Never completes until cancelled.
		pub fn stall() -> Self {
			Self { challenge: None, outcome: ScriptedOutcome::Stall }
		}

		/// Precedes the outcome with a TLS challenge for the provided host and
		/// chain.
		pub fn with_challenge(mut self, host: impl Into<String>, chain: Vec<Vec<u8>>) -> Self {
			self.challenge = Some((host.into(), chain));

			self
		}

		/// Adds a response header to a [`ScriptedOutcome::Respond`] outcome.
		pub fn with_header(mut self, name: &str, value: &str) -> Self {
			if let ScriptedOutcome::Respond { headers, .. } = &mut self.outcome {
				headers.insert(name, value);
			}

			self
		}
	}

	/// Transport double replaying a script of exchanges in order.
	///
	/// Every executed request is recorded for later inspection; running past
	/// the end of the script fails the exchange with a network error so a
	/// miscounted test surfaces loudly.
	#[derive(Default)]
	pub struct ScriptedTransport {
		script: Mutex<VecDeque<ScriptedExchange>>,
		requests: Mutex<Vec<TransportRequest>>,
		calls: AtomicU64,
	}
	impl ScriptedTransport {
		/// Creates a transport over the provided script.
		pub fn new(script: impl IntoIterator<Item = ScriptedExchange>) -> Arc<Self> {
			Arc::new(Self {
				script: Mutex::new(script.into_iter().collect()),
				requests: Mutex::new(Vec::new()),
				calls: AtomicU64::new(0),
			})
		}

		/// Appends an exchange to the script.
		pub fn push(&self, exchange: ScriptedExchange) {
			self.script.lock().push_back(exchange);
		}

		/// Returns the number of executed exchanges.
		pub fn calls(&self) -> u64 {
			self.calls.load(Ordering::SeqCst)
		}

		/// Returns clones of every executed request, in execution order.
		pub fn requests(&self) -> Vec<TransportRequest> {
			self.requests.lock().clone()
		}

		/// Returns the Authorization header of the n-th executed request.
		pub fn authorization_of_call(&self, index: usize) -> Option<String> {
			self.requests
				.lock()
				.get(index)
				.and_then(|request| request.headers.get("Authorization").map(ToOwned::to_owned))
		}
	}
	impl Transport for ScriptedTransport {
		fn execute(&self, request: TransportRequest) -> TransportFuture<'_> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.requests.lock().push(request.clone());

			let next = self.script.lock().pop_front();

			Box::pin(async move {
				let Some(exchange) = next else {
					return Err(TransportError::network(std::io::Error::other(
						"transport script exhausted",
					)));
				};

				if let Some((host, chain)) = exchange.challenge {
					let challenge = TlsChallenge::new(host.clone(), chain);

					if request.trust.decide(&challenge) == TrustDecision::CancelHandshake {
						return Err(TransportError::PinningRejected { host });
					}
				}

				match exchange.outcome {
					ScriptedOutcome::Respond { status, body, headers } => Ok(ExchangeOutput {
						body,
						metadata: ResponseMetadata { status: Some(status), headers },
					}),
					ScriptedOutcome::NoStatus =>
						Ok(ExchangeOutput { body: None, metadata: ResponseMetadata::default() }),
					ScriptedOutcome::Error(error) => Err(error),
					ScriptedOutcome::Stall => std::future::pending().await,
				}
			})
		}
	}

	/// Token-action double with call counters, a scriptable refresh outcome
	/// queue, and an optional gate that holds the refresh pipeline open until
	/// the test releases it.
	#[derive(Default)]
	pub struct ScriptedTokenActions {
		refresh_outcomes: Mutex<VecDeque<Result<Credential>>>,
		invalid_access_tokens: Mutex<Vec<String>>,
		gate: Mutex<Option<oneshot::Receiver<()>>>,
		authenticate_calls: AtomicU64,
		validate_calls: AtomicU64,
		refresh_calls: AtomicU64,
	}
	impl ScriptedTokenActions {
		/// Creates a double whose refresh rotates to
		/// `access-rotated`/`refresh-rotated`.
		pub fn new() -> Arc<Self> {
			Arc::new(Self::default())
		}

		/// Creates a double replaying the provided refresh outcomes before
		/// falling back to the default rotation.
		pub fn with_refresh_outcomes(
			outcomes: impl IntoIterator<Item = Result<Credential>>,
		) -> Arc<Self> {
			let actions = Self::default();

			*actions.refresh_outcomes.lock() = outcomes.into_iter().collect();

			Arc::new(actions)
		}

		/// Holds the next refresh pipeline open until the returned sender
		/// fires (or is dropped).
		pub fn gate_refresh(&self) -> oneshot::Sender<()> {
			let (sender, receiver) = oneshot::channel();

			*self.gate.lock() = Some(receiver);

			sender
		}

		/// Makes the next `validate` of this access token fail; the marker is
		/// consumed, so a later validation of the same token passes.
		pub fn fail_validation_once(&self, access: &str) {
			self.invalid_access_tokens.lock().push(access.to_owned());
		}

		/// Returns the number of `authenticate` calls.
		pub fn authenticate_calls(&self) -> u64 {
			self.authenticate_calls.load(Ordering::SeqCst)
		}

		/// Returns the number of `validate` calls.
		pub fn validate_calls(&self) -> u64 {
			self.validate_calls.load(Ordering::SeqCst)
		}

		/// Returns the number of `refresh` calls.
		pub fn refresh_calls(&self) -> u64 {
			self.refresh_calls.load(Ordering::SeqCst)
		}
	}
	impl TokenActions for ScriptedTokenActions {
		fn authenticate<'a>(&'a self, credential: &'a AuthCredential) -> TokenActionFuture<'a> {
			self.authenticate_calls.fetch_add(1, Ordering::SeqCst);

			let access = format!("signed-in-{}", credential.username);

			Box::pin(async move { Ok(Credential::new(access, "refresh-fresh")) })
		}

		fn validate<'a>(&'a self, credential: &'a Credential) -> TokenActionFuture<'a> {
			self.validate_calls.fetch_add(1, Ordering::SeqCst);

			let invalid = {
				let mut markers = self.invalid_access_tokens.lock();
				let index = markers
					.iter()
					.position(|token| token.as_str() == credential.access_token().expose());

				index.map(|index| markers.remove(index)).is_some()
			};

			Box::pin(async move {
				if invalid {
					Err(Error::AuthenticationRequired)
				} else {
					Ok(credential.clone())
				}
			})
		}

		fn refresh<'a>(&'a self, _: &'a Credential) -> TokenActionFuture<'a> {
			self.refresh_calls.fetch_add(1, Ordering::SeqCst);

			let gate = self.gate.lock().take();
			let outcome = self
				.refresh_outcomes
				.lock()
				.pop_front()
				.unwrap_or_else(|| Ok(Credential::new("access-rotated", "refresh-rotated")));

			Box::pin(async move {
				if let Some(receiver) = gate {
					let _ = receiver.await;
				}

				outcome
			})
		}
	}
}

mod _prelude {
	pub use std::{
		any::Any,
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::Duration;
	pub use tokio::sync::oneshot;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {httpmock as _, session_broker as _};
