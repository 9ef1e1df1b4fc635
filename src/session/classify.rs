//! Response classification and 401-driven refresh re-routing.

// self
use crate::{
	_prelude::*,
	codec::ParsedModel,
	error::{BackendError, SerializationError, TransportError},
	obs::{self, FlowKind, FlowOutcome},
	request::{AuthRequirement, Request},
	response::{RawResponse, Response, StatusGroup},
	session::{Session, state::QueuedRequest},
	transport::ExchangeOutput,
};

impl Session {
	/// Entry point for transport-task continuations.
	pub(crate) fn handle_completion(
		&self,
		queued: QueuedRequest,
		outcome: Result<ExchangeOutput>,
	) {
		match outcome {
			// Transport errors (including cancellation) propagate unchanged.
			Err(error) => self.fail_request(queued, error),
			Ok(output) => {
				let raw = RawResponse {
					status: output.metadata.status,
					headers: output.metadata.headers,
					body: output.body,
				};

				if let Some(log) = &self.inner.wire_log {
					log.log_incoming(
						queued.request.url(),
						raw.status,
						&raw.headers,
						raw.body.as_deref(),
					);
				}

				self.classify(queued, raw);
			},
		}
	}

	fn classify(&self, queued: QueuedRequest, raw: RawResponse) {
		let Some(status) = raw.status else {
			self.fail_request(queued, TransportError::NoHttpStatus.into());

			return;
		};

		// 401 is the only intercepted status: a credentialed request parks
		// behind the shared refresh instead of reaching its caller.
		if status == 401 {
			match queued.request.auth() {
				AuthRequirement::None => self.fail_request(queued, Error::Unauthorized),
				AuthRequirement::Credentialed => self.reroute_through_refresh(queued),
			}

			return;
		}

		match StatusGroup::from_status(Some(status)) {
			StatusGroup::Success => match parse_model(&queued.request, raw.body.as_deref()) {
				Ok(model) => self.finish_request(queued, Response { raw, model }),
				Err(error) => self.fail_request(queued, error.into()),
			},
			// 3xx and out-of-range statuses pass through without a model.
			StatusGroup::Redirect | StatusGroup::Unknown =>
				self.finish_request(queued, Response { raw, model: None }),
			StatusGroup::ClientError | StatusGroup::ServerError =>
				match parse_error_model(&queued.request, raw.body.as_deref()) {
					Ok(model) => self.fail_request(queued, BackendError { status, model }.into()),
					Err(error) => self.fail_request(queued, error.into()),
				},
		}
	}

	fn reroute_through_refresh(&self, queued: QueuedRequest) {
		let start_refresh = {
			let mut state = self.inner.state.lock();

			state.remove_active(queued.id());
			state.auth_waiting.push(queued);

			if state.refresh_pending {
				false
			} else {
				state.refresh_pending = true;

				true
			}
		};

		if start_refresh {
			let session = self.clone();

			tokio::spawn(async move {
				session.run_refresh().await;
			});
		}
	}

	/// Drives the single shared refresh and settles every parked request.
	async fn run_refresh(self) {
		let result = match &self.inner.auth {
			Some(auth) => auth.refresh().await,
			// Credentialed dispatch already requires a broker; a 401 cannot
			// park a request here without one.
			None => Err(Error::Unauthorized),
		};

		match result {
			Ok(_) => {
				{
					let mut state = self.inner.state.lock();
					let waiting = std::mem::take(&mut state.auth_waiting);

					state.refresh_pending = false;
					state.queued.extend(waiting);
				}

				self.sweep();
			},
			Err(error) => {
				let waiting = {
					let mut state = self.inner.state.lock();

					state.refresh_pending = false;

					std::mem::take(&mut state.auth_waiting)
				};

				for parked in waiting {
					self.inner.metrics.record_cancelled();
					obs::record_flow_outcome(FlowKind::Request, FlowOutcome::Failure);

					let _ = parked.callback.send(Err(Error::Cancelled));
				}

				if let Some(hook) = &self.inner.on_authentication_required {
					hook(&error);
				}

				self.sweep();
			},
		}
	}

	fn finish_request(&self, queued: QueuedRequest, response: Response) {
		self.inner.state.lock().forget(queued.id());
		self.inner.metrics.record_completed();
		obs::record_flow_outcome(FlowKind::Request, FlowOutcome::Success);

		let _ = queued.callback.send(Ok(response));
	}

	pub(crate) fn fail_request(&self, queued: QueuedRequest, error: Error) {
		self.inner.state.lock().forget(queued.id());

		if matches!(error, Error::Cancelled) {
			self.inner.metrics.record_cancelled();
		} else {
			self.inner.metrics.record_failed();
		}

		obs::record_flow_outcome(FlowKind::Request, FlowOutcome::Failure);

		let _ = queued.callback.send(Err(error));
	}
}

fn parse_model(
	request: &Request,
	body: Option<&[u8]>,
) -> Result<Option<ParsedModel>, SerializationError> {
	match (request.model_parser(), body) {
		(Some(parser), Some(data)) => parser.decode(data).map(Some),
		_ => Ok(None),
	}
}

fn parse_error_model(
	request: &Request,
	body: Option<&[u8]>,
) -> Result<Option<ParsedModel>, SerializationError> {
	match (request.error_parser(), body) {
		(Some(parser), Some(data)) => parser.decode(data).map(Some),
		_ => Ok(None),
	}
}
