//! Dispatch sweep: queued requests become transport tasks.

// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowSpan},
	request::{AuthRequirement, Headers, Request},
	session::{Session, state::{ActiveRequest, QueuedRequest}},
	transport::{TransportRequest, TransportTask},
};

const CONTENT_TYPE: &str = "Content-Type";

impl Session {
	/// Drains every currently dispatchable queued request and launches a
	/// detached dispatch task per request.
	///
	/// Ordering: the drain preserves submission order, and each request's
	/// dispatch task is spawned in that order. Requests within the same
	/// auth-requirement partition therefore reach their transport in
	/// submission order; no ordering holds across partitions.
	pub(crate) fn sweep(&self) {
		let dispatchable = self.inner.state.lock().drain_dispatchable();

		for queued in dispatchable {
			let session = self.clone();

			tokio::spawn(async move {
				session.dispatch_one(queued).await;
			});
		}
	}

	async fn dispatch_one(self, queued: QueuedRequest) {
		let span = FlowSpan::new(FlowKind::Request, "dispatch");
		let session_headers =
			match span.instrument(self.session_headers(&queued.request)).await {
				Ok(headers) => headers,
				Err(error) => {
					self.fail_request(queued, error);

					return;
				},
			};
		let transport_request =
			match self.build_transport_request(&queued.request, session_headers) {
				Ok(request) => request,
				Err(error) => {
					self.fail_request(queued, error);

					return;
				},
			};

		if let Some(log) = &self.inner.wire_log {
			log.log_outgoing(
				&transport_request.url,
				&transport_request.headers,
				transport_request.body.as_deref(),
			);
		}

		let task = TransportTask::new(self.inner.transport.clone(), transport_request);

		self.inner
			.state
			.lock()
			.active
			.push(ActiveRequest { id: queued.id().clone(), task: task.clone() });

		let session = self.clone();

		task.resume(move |outcome| session.handle_completion(queued, outcome));
	}

	/// Resolves the session-level headers for a request, consulting the auth
	/// broker when the request is credentialed.
	async fn session_headers(&self, request: &Request) -> Result<Headers> {
		match request.auth() {
			AuthRequirement::None => Ok(Headers::new()),
			AuthRequirement::Credentialed => {
				let auth = self.inner.auth.as_ref().ok_or(Error::Unauthorized)?;
				let credential = auth.get_current_token().await?;
				let mut headers = Headers::new();

				headers.insert(
					"Authorization",
					format!("Bearer {}", credential.access_token().expose()),
				);

				Ok(headers)
			},
		}
	}

	/// Builds the transport request: session headers under request headers,
	/// encoded payload, Content-Type inserted only when the caller set none.
	fn build_transport_request(
		&self,
		request: &Request,
		session_headers: Headers,
	) -> Result<TransportRequest> {
		let mut headers = session_headers;

		for header in request.headers() {
			headers.insert(header.name.clone(), header.value.clone());
		}

		let body = match request.payload() {
			Some(payload) => {
				let bytes = payload.encode()?;

				if !headers.contains(CONTENT_TYPE) {
					headers.insert(CONTENT_TYPE, payload.content_type());
				}

				Some(bytes)
			},
			None => None,
		};

		Ok(TransportRequest {
			url: request.url().clone(),
			method: request.method(),
			headers,
			body,
			timeout: request.timeout(),
			cache_policy: request.cache_policy(),
			trust: self.inner.trust.clone(),
		})
	}
}
