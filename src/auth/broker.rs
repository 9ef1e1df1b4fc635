//! Single-flight refresh coordination with waiter fan-out.
//!
//! Exactly one refresh pipeline may be in flight at a time. Callers that need
//! a credential while one is running park as waiters and receive the shared
//! outcome; fan-out happens only after the pipeline fully resolves, atomically
//! with clearing the waiter list, so no waiter can be added after fan-out
//! begins and silently dropped. A nonzero failed-attempt counter short-circuits
//! new refresh attempts without touching the network until an external
//! authentication succeeds.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{AuthCredential, Credential, TokenActions},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::CredentialStore,
};

type AuthWaiter = oneshot::Sender<Result<Credential>>;

#[derive(Default)]
struct RefreshState {
	refreshing: bool,
	failed_attempts: u32,
	waiters: Vec<AuthWaiter>,
}

enum RefreshEntry {
	Begin,
	Join(oneshot::Receiver<Result<Credential>>),
	Blocked,
}

/// Owns the token lifecycle: load, validate, refresh, validate, persist.
///
/// All waiter-list mutation and the single-flight guard live behind one mutex
/// that is never held across an await, which is what makes the fan-out atomic
/// with respect to new joiners.
pub struct AuthBroker {
	actions: Arc<dyn TokenActions>,
	store: Arc<dyn CredentialStore>,
	state: Mutex<RefreshState>,
	metrics: RefreshMetrics,
}
impl AuthBroker {
	/// Creates a broker over the provided token actions and credential store.
	pub fn new(actions: Arc<dyn TokenActions>, store: Arc<dyn CredentialStore>) -> Self {
		Self {
			actions,
			store,
			state: Mutex::new(RefreshState::default()),
			metrics: RefreshMetrics::default(),
		}
	}

	/// Returns the refresh counters.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Returns the current failed-attempt count.
	pub fn failed_attempts(&self) -> u32 {
		self.state.lock().failed_attempts
	}

	/// Returns a usable credential, joining the in-flight refresh when one is
	/// running.
	///
	/// Fast path otherwise: load the stored credential and validate it via the
	/// token actions. Any validation failure (or an empty store) falls through
	/// to a full [`refresh`](Self::refresh).
	pub async fn get_current_token(&self) -> Result<Credential> {
		if let Some(receiver) = self.join_if_refreshing() {
			self.metrics.record_coalesced();

			return Self::await_waiter(receiver).await;
		}

		if let Some(current) = self.store.load().await?
			&& let Ok(valid) = self.actions.validate(&current).await
		{
			return Ok(valid);
		}

		self.refresh().await
	}

	/// Refreshes the stored credential, coalescing concurrent callers into one
	/// pipeline run.
	pub async fn refresh(&self) -> Result<Credential> {
		const KIND: FlowKind = FlowKind::Refresh;

		let entry = {
			let mut state = self.state.lock();

			if state.refreshing {
				let (sender, receiver) = oneshot::channel();

				state.waiters.push(sender);

				RefreshEntry::Join(receiver)
			} else if state.failed_attempts > 0 {
				RefreshEntry::Blocked
			} else {
				state.refreshing = true;

				RefreshEntry::Begin
			}
		};

		match entry {
			RefreshEntry::Join(receiver) => {
				self.metrics.record_coalesced();

				Self::await_waiter(receiver).await
			},
			RefreshEntry::Blocked => {
				self.metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				Err(Error::AuthenticationRequired)
			},
			RefreshEntry::Begin => {
				let span = FlowSpan::new(KIND, "refresh");

				obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
				self.metrics.record_attempt();

				let result = span.instrument(self.run_refresh_pipeline()).await;
				let waiters = {
					let mut state = self.state.lock();

					state.refreshing = false;

					match &result {
						Ok(_) => state.failed_attempts = 0,
						Err(_) => state.failed_attempts += 1,
					}

					std::mem::take(&mut state.waiters)
				};

				for waiter in waiters {
					let _ = waiter.send(result.clone());
				}

				match &result {
					Ok(_) => {
						self.metrics.record_success();
						obs::record_flow_outcome(KIND, FlowOutcome::Success);
					},
					Err(_) => {
						self.metrics.record_failure();
						obs::record_flow_outcome(KIND, FlowOutcome::Failure);
					},
				}

				result
			},
		}
	}

	/// Performs a full authentication with raw sign-in material.
	///
	/// Success persists the fresh credential and resets the failed-attempt
	/// counter; this is the only path that unblocks a broker whose refresh
	/// pipeline has tripped the circuit breaker.
	pub async fn authenticate(&self, credential: &AuthCredential) -> Result<Credential> {
		const KIND: FlowKind = FlowKind::Authenticate;

		let span = FlowSpan::new(KIND, "authenticate");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let fresh = self.actions.authenticate(credential).await?;
				let fresh = self.actions.validate(&fresh).await?;

				self.store.store(fresh.clone()).await?;

				Ok(fresh)
			})
			.await;

		match &result {
			Ok(_) => {
				self.state.lock().failed_attempts = 0;

				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Discards the stored credential.
	pub async fn invalidate(&self) -> Result<()> {
		Ok(self.store.invalidate().await?)
	}

	fn join_if_refreshing(&self) -> Option<oneshot::Receiver<Result<Credential>>> {
		let mut state = self.state.lock();

		state.refreshing.then(|| {
			let (sender, receiver) = oneshot::channel();

			state.waiters.push(sender);

			receiver
		})
	}

	async fn await_waiter(receiver: oneshot::Receiver<Result<Credential>>) -> Result<Credential> {
		match receiver.await {
			Ok(outcome) => outcome,
			// The broker dropped mid-refresh; nothing will resolve the waiter.
			Err(_) => Err(Error::Cancelled),
		}
	}

	async fn run_refresh_pipeline(&self) -> Result<Credential> {
		let current = self.store.load().await?.ok_or(Error::AuthenticationRequired)?;
		let current = self.actions.validate(&current).await?;
		let renewed = self.actions.refresh(&current).await?;
		let renewed = self.actions.validate(&renewed).await?;

		self.store.store(renewed.clone()).await?;

		Ok(renewed)
	}
}
impl Debug for AuthBroker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("AuthBroker")
			.field("refreshing", &state.refreshing)
			.field("failed_attempts", &state.failed_attempts)
			.field("waiters", &state.waiters.len())
			.finish()
	}
}
