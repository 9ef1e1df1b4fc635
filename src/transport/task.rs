//! One outbound exchange with resume/cancel semantics.

// self
use crate::{
	_prelude::*,
	transport::{ExchangeOutput, Transport, TransportRequest},
};

/// Single-fire continuation invoked with the exchange outcome.
pub type TaskCompletion = Box<dyn FnOnce(Result<ExchangeOutput>) + Send>;

#[derive(Default)]
struct TaskState {
	request: Option<TransportRequest>,
	completion: Option<TaskCompletion>,
	abort: Option<tokio::task::AbortHandle>,
	cancelled: bool,
}

/// Wraps exactly one outbound exchange.
///
/// [`resume`](Self::resume) starts the exchange on a detached task and
/// registers the continuation; [`cancel`](Self::cancel) is idempotent and
/// best-effort once a response is already in flight. The continuation fires
/// exactly once, with either the exchange output or an error, never both.
pub struct TransportTask {
	transport: Arc<dyn Transport>,
	state: Mutex<TaskState>,
}
impl TransportTask {
	/// Creates a task for one prepared exchange.
	pub fn new(transport: Arc<dyn Transport>, request: TransportRequest) -> Arc<Self> {
		Arc::new(Self {
			transport,
			state: Mutex::new(TaskState { request: Some(request), ..Default::default() }),
		})
	}

	/// Starts the exchange and registers the completion continuation.
	///
	/// Must be called from within a Tokio runtime. A second call is a no-op; a
	/// call after [`cancel`](Self::cancel) resolves the continuation with
	/// [`Error::Cancelled`] without touching the network.
	pub fn resume(self: &Arc<Self>, complete: impl FnOnce(Result<ExchangeOutput>) + Send + 'static) {
		let mut state = self.state.lock();

		if state.cancelled {
			drop(state);
			complete(Err(Error::Cancelled));

			return;
		}

		let Some(request) = state.request.take() else {
			return;
		};

		state.completion = Some(Box::new(complete));

		let task = Arc::clone(self);
		let handle = tokio::spawn(async move {
			let outcome = task.transport.execute(request).await.map_err(Error::from);

			task.finish(outcome);
		});

		state.abort = Some(handle.abort_handle());
	}

	/// Cancels the exchange; repeated calls are no-ops.
	///
	/// If the continuation has already fired, the completion wins the race and
	/// cancellation does nothing. Otherwise the in-flight exchange is aborted
	/// and the continuation resolves with [`Error::Cancelled`].
	pub fn cancel(&self) {
		let (completion, abort) = {
			let mut state = self.state.lock();

			if state.cancelled {
				return;
			}

			state.cancelled = true;

			(state.completion.take(), state.abort.take())
		};

		if let Some(abort) = abort {
			abort.abort();
		}
		if let Some(complete) = completion {
			complete(Err(Error::Cancelled));
		}
	}

	// The continuation is taken under the lock but invoked outside it;
	// completions are free to re-enter coordinator state.
	fn finish(&self, outcome: Result<ExchangeOutput>) {
		let completion = self.state.lock().completion.take();

		if let Some(complete) = completion {
			complete(outcome);
		}
	}
}
impl Debug for TransportTask {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("TransportTask")
			.field("resumed", &state.request.is_none())
			.field("cancelled", &state.cancelled)
			.field("pending", &state.completion.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicU64, Ordering};
	// self
	use super::*;
	use crate::{
		pinning::TrustEvaluator,
		request::{CachePolicy, Headers, Method},
		transport::{ResponseMetadata, TransportFuture},
	};

	#[derive(Default)]
	struct CountingTransport {
		calls: AtomicU64,
	}
	impl Transport for CountingTransport {
		fn execute(&self, _: TransportRequest) -> TransportFuture<'_> {
			self.calls.fetch_add(1, Ordering::Relaxed);

			Box::pin(async move {
				Ok(ExchangeOutput {
					body: Some(b"pong".to_vec()),
					metadata: ResponseMetadata { status: Some(200), headers: Headers::new() },
				})
			})
		}
	}

	fn request() -> TransportRequest {
		TransportRequest {
			url: Url::parse("https://api.example.com/ping").expect("Test URL should parse."),
			method: Method::Get,
			headers: Headers::new(),
			body: None,
			timeout: Duration::seconds(5),
			cache_policy: CachePolicy::IgnoreCache,
			trust: TrustEvaluator::disabled(),
		}
	}

	#[tokio::test]
	async fn resume_fires_completion_once() {
		let transport = Arc::new(CountingTransport::default());
		let task = TransportTask::new(transport.clone(), request());
		let (sender, receiver) = oneshot::channel();

		task.resume(move |outcome| {
			let _ = sender.send(outcome);
		});

		let outcome = receiver.await.expect("Completion should fire.");

		assert_eq!(
			outcome.expect("Exchange should succeed.").body.as_deref(),
			Some(b"pong".as_slice()),
		);
		assert_eq!(transport.calls.load(Ordering::Relaxed), 1);

		// A second resume is ignored.
		task.resume(|_| panic!("Second resume must not fire a continuation."));
	}

	#[tokio::test]
	async fn cancel_before_resume_skips_the_network() {
		let transport = Arc::new(CountingTransport::default());
		let task = TransportTask::new(transport.clone(), request());

		task.cancel();
		task.cancel();

		let (sender, receiver) = oneshot::channel();

		task.resume(move |outcome| {
			let _ = sender.send(outcome);
		});

		let outcome = receiver.await.expect("Completion should fire.");

		assert!(matches!(outcome, Err(Error::Cancelled)));
		assert_eq!(transport.calls.load(Ordering::Relaxed), 0);
	}

	#[tokio::test]
	async fn cancel_after_completion_is_a_no_op() {
		let transport = Arc::new(CountingTransport::default());
		let task = TransportTask::new(transport, request());
		let (sender, receiver) = oneshot::channel();

		task.resume(move |outcome| {
			let _ = sender.send(outcome);
		});

		receiver.await.expect("Completion should fire.").expect("Exchange should succeed.");

		// The response already won the race; cancelling changes nothing.
		task.cancel();
	}
}
