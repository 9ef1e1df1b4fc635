//! The three request sets owned by the session's serialized context.
//!
//! A request identifier lives in at most one set at a time: `queued` before
//! dispatch, `active` while an exchange is outstanding, `auth_waiting` while
//! parked behind the shared refresh. Everything here is mutated only under the
//! session's mutex, which is never held across an await.

// self
use crate::{
	_prelude::*,
	request::{AuthRequirement, Request, RequestId},
	response::Response,
	transport::TransportTask,
};

/// Completion continuation paired with a submitted request.
pub(crate) type RequestCallback = oneshot::Sender<Result<Response>>;

/// A request waiting for dispatch (or for the shared refresh outcome).
pub(crate) struct QueuedRequest {
	pub request: Request,
	pub callback: RequestCallback,
}
impl QueuedRequest {
	pub fn id(&self) -> &RequestId {
		self.request.id()
	}
}

/// A request with an outstanding transport exchange.
pub(crate) struct ActiveRequest {
	pub id: RequestId,
	pub task: Arc<TransportTask>,
}

#[derive(Default)]
pub(crate) struct SessionState {
	pub queued: Vec<QueuedRequest>,
	pub active: Vec<ActiveRequest>,
	pub auth_waiting: Vec<QueuedRequest>,
	pub refresh_pending: bool,
}
impl SessionState {
	/// Checks all three sets for the identifier; drives submission dedup.
	pub fn contains(&self, id: &RequestId) -> bool {
		self.queued.iter().any(|queued| queued.id() == id)
			|| self.active.iter().any(|active| &active.id == id)
			|| self.auth_waiting.iter().any(|waiting| waiting.id() == id)
	}

	pub fn remove_queued(&mut self, id: &RequestId) -> Option<QueuedRequest> {
		let index = self.queued.iter().position(|queued| queued.id() == id)?;

		Some(self.queued.remove(index))
	}

	pub fn remove_active(&mut self, id: &RequestId) -> Option<ActiveRequest> {
		let index = self.active.iter().position(|active| &active.id == id)?;

		Some(self.active.remove(index))
	}

	pub fn remove_auth_waiting(&mut self, id: &RequestId) -> Option<QueuedRequest> {
		let index = self.auth_waiting.iter().position(|waiting| waiting.id() == id)?;

		Some(self.auth_waiting.remove(index))
	}

	pub fn active_task(&self, id: &RequestId) -> Option<Arc<TransportTask>> {
		self.active.iter().find(|active| &active.id == id).map(|active| active.task.clone())
	}

	/// Idempotent removal from whichever set currently holds the identifier.
	pub fn forget(&mut self, id: &RequestId) {
		self.queued.retain(|queued| queued.id() != id);
		self.active.retain(|active| &active.id != id);
		self.auth_waiting.retain(|waiting| waiting.id() != id);
	}

	/// Drains every queued request eligible for dispatch right now, in
	/// submission order.
	///
	/// Auth-free requests are always eligible; credentialed requests only
	/// while no refresh is pending.
	pub fn drain_dispatchable(&mut self) -> Vec<QueuedRequest> {
		let refresh_pending = self.refresh_pending;
		let mut dispatchable = Vec::new();
		let mut index = 0;

		while index < self.queued.len() {
			let eligible = match self.queued[index].request.auth() {
				AuthRequirement::None => true,
				AuthRequirement::Credentialed => !refresh_pending,
			};

			if eligible {
				dispatchable.push(self.queued.remove(index));
			} else {
				index += 1;
			}
		}

		dispatchable
	}
}
