//! The request coordinator: session-level lifecycle for outgoing requests.

mod classify;
mod dispatch;
mod metrics;
mod state;

pub use metrics::SessionMetrics;

use state::{QueuedRequest, SessionState};

// std
use std::task::{Context, Poll};
// self
use crate::{
	_prelude::*,
	auth::AuthBroker,
	obs::{self, FlowKind, FlowOutcome, WireLogging},
	pinning::{PinningPolicy, TrustEvaluator},
	request::{Request, RequestId},
	response::Response,
	transport::Transport,
};

type AuthRequiredHook = Box<dyn Fn(&Error) + Send + Sync>;

/// Coordinates submitted requests: dedup, queuing, dispatch, classification,
/// and 401-driven re-routing through the auth broker.
///
/// The session is a cheap cloneable handle; every clone shares the same three
/// request sets. All set mutation happens under one mutex that is never held
/// across an await, with async work running as detached, re-entrant tasks, so
/// [`execute`](Self::execute) and [`cancel`](Self::cancel) must be called from
/// within a Tokio runtime.
#[derive(Clone)]
pub struct Session {
	inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
	pub(crate) transport: Arc<dyn Transport>,
	pub(crate) auth: Option<Arc<AuthBroker>>,
	pub(crate) trust: TrustEvaluator,
	pub(crate) wire_log: Option<Arc<dyn WireLogging>>,
	pub(crate) on_authentication_required: Option<AuthRequiredHook>,
	pub(crate) state: Mutex<SessionState>,
	pub(crate) metrics: SessionMetrics,
}

impl Session {
	/// Starts building a session over the provided transport.
	pub fn builder(transport: Arc<dyn Transport>) -> SessionBuilder {
		SessionBuilder {
			transport,
			auth: None,
			trust: TrustEvaluator::disabled(),
			wire_log: None,
			on_authentication_required: None,
		}
	}

	/// Submits a request and returns a future resolving with its terminal
	/// outcome.
	///
	/// The dedup check and the enqueue happen synchronously inside this call:
	/// an identifier already present in the queued, active, or auth-waiting
	/// set resolves the returned future with [`Error::DuplicateRequest`]
	/// without mutating any state, and the first submission proceeds
	/// unaffected.
	pub fn execute(&self, request: Request) -> ResponseFuture {
		let (sender, receiver) = oneshot::channel();
		let mut state = self.inner.state.lock();

		if state.contains(request.id()) {
			let id = request.id().clone();

			drop(state);
			self.inner.metrics.record_duplicate();

			let _ = sender.send(Err(Error::DuplicateRequest { id }));
		} else {
			state.queued.push(QueuedRequest { request, callback: sender });

			drop(state);
			self.inner.metrics.record_submitted();
			obs::record_flow_outcome(FlowKind::Request, FlowOutcome::Attempt);
			self.sweep();
		}

		ResponseFuture { receiver }
	}

	/// Cancels a request by identifier; unknown identifiers are a silent
	/// no-op.
	///
	/// Queued and auth-waiting requests resolve immediately with
	/// [`Error::Cancelled`] and never reach the network; cancelling an
	/// auth-waiting request does not abort the shared refresh. Active requests
	/// are cancelled best-effort through their transport task: when the
	/// response has already arrived, the completion wins the race.
	pub fn cancel(&self, id: &RequestId) {
		enum Found {
			Queued(QueuedRequest),
			Active(Arc<crate::transport::TransportTask>),
			Waiting(QueuedRequest),
		}

		let found = {
			let mut state = self.inner.state.lock();

			if let Some(queued) = state.remove_queued(id) {
				Some(Found::Queued(queued))
			} else if let Some(task) = state.active_task(id) {
				Some(Found::Active(task))
			} else {
				state.remove_auth_waiting(id).map(Found::Waiting)
			}
		};

		match found {
			Some(Found::Queued(parked) | Found::Waiting(parked)) => {
				self.inner.metrics.record_cancelled();
				obs::record_flow_outcome(FlowKind::Request, FlowOutcome::Failure);

				let _ = parked.callback.send(Err(Error::Cancelled));
			},
			Some(Found::Active(task)) => task.cancel(),
			None => {},
		}
	}

	/// Returns the session's request lifecycle counters.
	pub fn metrics(&self) -> &SessionMetrics {
		&self.inner.metrics
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.inner.state.lock();

		f.debug_struct("Session")
			.field("queued", &state.queued.len())
			.field("active", &state.active.len())
			.field("auth_waiting", &state.auth_waiting.len())
			.field("refresh_pending", &state.refresh_pending)
			.finish()
	}
}

/// Future resolving with a submitted request's terminal outcome.
///
/// Dropping the future does not cancel the request; use
/// [`Session::cancel`] for that.
#[derive(Debug)]
pub struct ResponseFuture {
	receiver: oneshot::Receiver<Result<Response>>,
}
impl Future for ResponseFuture {
	type Output = Result<Response>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.receiver).poll(cx).map(|received| match received {
			Ok(outcome) => outcome,
			// The session dropped mid-flight; nothing will resolve this.
			Err(_) => Err(Error::Cancelled),
		})
	}
}

/// Fluent builder for [`Session`].
pub struct SessionBuilder {
	transport: Arc<dyn Transport>,
	auth: Option<Arc<AuthBroker>>,
	trust: TrustEvaluator,
	wire_log: Option<Arc<dyn WireLogging>>,
	on_authentication_required: Option<AuthRequiredHook>,
}
impl SessionBuilder {
	/// Attaches the auth broker consulted for credentialed requests.
	pub fn auth(mut self, broker: Arc<AuthBroker>) -> Self {
		self.auth = Some(broker);

		self
	}

	/// Enables certificate pinning with the provided policy.
	pub fn pinning(mut self, policy: Arc<dyn PinningPolicy>) -> Self {
		self.trust = TrustEvaluator::new(policy);

		self
	}

	/// Attaches the wire-logging collaborator.
	pub fn wire_logging(mut self, logger: Arc<dyn WireLogging>) -> Self {
		self.wire_log = Some(logger);

		self
	}

	/// Registers an observer fired when the shared refresh fails and parked
	/// requests are cancelled; receives the underlying refresh error.
	pub fn on_authentication_required(
		mut self,
		hook: impl Fn(&Error) + Send + Sync + 'static,
	) -> Self {
		self.on_authentication_required = Some(Box::new(hook));

		self
	}

	/// Finalizes the session.
	pub fn build(self) -> Session {
		Session {
			inner: Arc::new(SessionInner {
				transport: self.transport,
				auth: self.auth,
				trust: self.trust,
				wire_log: self.wire_log,
				on_authentication_required: self.on_authentication_required,
				state: Mutex::new(SessionState::default()),
				metrics: SessionMetrics::default(),
			}),
		}
	}
}
#[cfg(feature = "reqwest")]
impl SessionBuilder {
	/// Starts building a session over the crate's default reqwest transport.
	pub fn reqwest() -> Self {
		Session::builder(Arc::new(crate::transport::ReqwestTransport::default()))
	}
}
