// self
use session_broker::{
	_preludet::*,
	auth::{AuthBroker, Credential},
	error::TransportError,
	request::{Method, Request, RequestId},
	session::Session,
	store::MemoryStore,
};

fn url(path: &str) -> Url {
	Url::parse(&format!("https://api.example.com{path}")).expect("Test URL should parse.")
}

fn credentialed(label: &str, path: &str) -> Request {
	Request::builder(Method::Get, url(path))
		.id(RequestId::new(label).expect("Test identifier should be valid."))
		.credentialed()
		.build()
}

fn stale_store() -> Arc<MemoryStore> {
	Arc::new(MemoryStore::seeded(Credential::new("access-stale", "refresh-stale")))
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
	for _ in 0..200 {
		if condition() {
			return;
		}

		tokio::time::sleep(std::time::Duration::from_millis(5)).await;
	}

	panic!("Condition was not met within the polling window.");
}

fn network_error() -> Error {
	TransportError::network(std::io::Error::other("token endpoint unreachable")).into()
}

#[tokio::test]
async fn expired_credential_triggers_exactly_one_refresh_for_all_waiters() {
	let transport = ScriptedTransport::new([ScriptedExchange::status(401), ScriptedExchange::status(401)]);
	let actions = ScriptedTokenActions::new();
	let broker = Arc::new(AuthBroker::new(actions.clone(), stale_store()));
	let session = Session::builder(transport.clone()).auth(broker.clone()).build();
	let release = actions.gate_refresh();

	// Both dispatch with the stale token before any 401 is classified, so both
	// park behind the one shared refresh.
	let first = session.execute(credentialed("cred-1", "/one"));
	let second = session.execute(credentialed("cred-2", "/two"));

	wait_until(|| actions.refresh_calls() == 1).await;

	assert_eq!(transport.calls(), 2);
	assert_eq!(transport.authorization_of_call(0), Some("Bearer access-stale".into()));

	transport.push(ScriptedExchange::status(200));
	transport.push(ScriptedExchange::status(200));

	let _ = release.send(());
	let (first, second) = tokio::join!(first, second);

	assert_eq!(first.expect("First request should succeed after refresh.").raw.status, Some(200));
	assert_eq!(second.expect("Second request should succeed after refresh.").raw.status, Some(200));

	// One network-facing refresh, regardless of the number of waiters.
	assert_eq!(actions.refresh_calls(), 1);
	assert_eq!(transport.calls(), 4);

	// Both re-dispatches carry the rotated credential, in submission order.
	let requests = transport.requests();

	assert_eq!(requests[2].url.path(), "/one");
	assert_eq!(requests[3].url.path(), "/two");
	assert_eq!(transport.authorization_of_call(2), Some("Bearer access-rotated".into()));
	assert_eq!(transport.authorization_of_call(3), Some("Bearer access-rotated".into()));
}

#[tokio::test]
async fn requests_submitted_during_a_refresh_stay_queued() {
	let transport = ScriptedTransport::new([ScriptedExchange::status(401)]);
	let actions = ScriptedTokenActions::new();
	let broker = Arc::new(AuthBroker::new(actions.clone(), stale_store()));
	let session = Session::builder(transport.clone()).auth(broker).build();
	let release = actions.gate_refresh();
	let first = session.execute(credentialed("cred-1", "/one"));

	wait_until(|| actions.refresh_calls() == 1).await;

	// Submitted mid-refresh: parked in the queue, no exchange happens.
	let second = session.execute(credentialed("cred-2", "/two"));

	assert_eq!(transport.calls(), 1);

	transport.push(ScriptedExchange::status(200));
	transport.push(ScriptedExchange::status(200));

	let _ = release.send(());
	let (first, second) = tokio::join!(first, second);

	assert!(first.is_ok());
	assert!(second.is_ok());
	assert_eq!(actions.refresh_calls(), 1);
}

#[tokio::test]
async fn cancelling_a_queued_request_never_reaches_the_network() {
	let transport = ScriptedTransport::new([ScriptedExchange::status(401)]);
	let actions = ScriptedTokenActions::new();
	let broker = Arc::new(AuthBroker::new(actions.clone(), stale_store()));
	let session = Session::builder(transport.clone()).auth(broker).build();
	let release = actions.gate_refresh();
	let first = session.execute(credentialed("cred-1", "/one"));

	wait_until(|| actions.refresh_calls() == 1).await;

	let parked = credentialed("cred-parked", "/parked");
	let parked_future = session.execute(parked.clone());

	session.cancel(parked.id());

	assert!(matches!(parked_future.await, Err(Error::Cancelled)));
	assert_eq!(transport.calls(), 1);

	transport.push(ScriptedExchange::status(200));

	let _ = release.send(());

	first.await.expect("The parked 401 request should still succeed.");

	// The cancelled request never produced an exchange.
	assert_eq!(transport.calls(), 2);
	assert!(transport.requests().iter().all(|request| request.url.path() != "/parked"));
}

#[tokio::test]
async fn refresh_failure_fans_out_to_every_waiter_and_trips_the_breaker() {
	let transport = ScriptedTransport::new([ScriptedExchange::status(401), ScriptedExchange::status(401)]);
	let actions = ScriptedTokenActions::with_refresh_outcomes([Err(network_error())]);
	let broker = Arc::new(AuthBroker::new(actions.clone(), stale_store()));
	let observed = Arc::new(Mutex::new(None));
	let session = {
		let observed = observed.clone();

		Session::builder(transport.clone())
			.auth(broker.clone())
			.on_authentication_required(move |error| {
				*observed.lock() = Some(error.clone());
			})
			.build()
	};
	let release = actions.gate_refresh();
	let first = session.execute(credentialed("cred-1", "/one"));
	let second = session.execute(credentialed("cred-2", "/two"));

	wait_until(|| actions.refresh_calls() == 1).await;

	// A direct caller joins the same refresh as a waiter and must receive the
	// shared error.
	let direct_waiter = tokio::spawn({
		let broker = broker.clone();

		async move { broker.refresh().await }
	});

	wait_until(|| broker.metrics().coalesced() == 1).await;

	let _ = release.send(());
	let (first, second) = tokio::join!(first, second);

	assert!(matches!(first, Err(Error::Cancelled)));
	assert!(matches!(second, Err(Error::Cancelled)));
	assert!(matches!(
		direct_waiter.await.expect("Waiter task should not panic."),
		Err(Error::Transport(TransportError::Network { .. })),
	));

	// The observer received the underlying refresh error.
	assert!(matches!(
		observed.lock().as_ref(),
		Some(Error::Transport(TransportError::Network { .. })),
	));
	assert_eq!(broker.failed_attempts(), 1);
	assert_eq!(session.metrics().cancelled(), 2);

	// The breaker now fails fast without another network call.
	assert!(matches!(broker.refresh().await, Err(Error::AuthenticationRequired)));
	assert_eq!(actions.refresh_calls(), 1);
}

#[tokio::test]
async fn cancelling_an_auth_waiting_request_leaves_the_refresh_running() {
	let transport = ScriptedTransport::new([ScriptedExchange::status(401), ScriptedExchange::status(401)]);
	let actions = ScriptedTokenActions::new();
	let broker = Arc::new(AuthBroker::new(actions.clone(), stale_store()));
	let session = Session::builder(transport.clone()).auth(broker).build();
	let release = actions.gate_refresh();
	let first = session.execute(credentialed("cred-1", "/one"));
	let second = session.execute(credentialed("cred-2", "/two"));

	wait_until(|| actions.refresh_calls() == 1).await;

	// A parked identifier still counts for dedup.
	let duplicate = session
		.execute(credentialed("cred-2", "/two"))
		.await
		.expect_err("An auth-waiting identifier must reject resubmission.");

	assert!(matches!(duplicate, Error::DuplicateRequest { .. }));

	// Both are parked; cancelling one settles it immediately without touching
	// the shared refresh.
	session.cancel(&RequestId::new("cred-2").expect("Test identifier should be valid."));

	assert!(matches!(second.await, Err(Error::Cancelled)));

	transport.push(ScriptedExchange::status(200));

	let _ = release.send(());

	first.await.expect("The remaining waiter should complete after the refresh.");

	assert_eq!(actions.refresh_calls(), 1);
	assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn unauthorized_on_a_plain_request_is_permanent() {
	let transport = ScriptedTransport::new([ScriptedExchange::status(401)]);
	let actions = ScriptedTokenActions::new();
	let broker = Arc::new(AuthBroker::new(actions.clone(), stale_store()));
	let session = Session::builder(transport).auth(broker).build();
	let plain = Request::builder(Method::Get, url("/v1/public")).build();
	let error = session
		.execute(plain)
		.await
		.expect_err("A 401 on an auth-free request is permanent.");

	assert!(matches!(error, Error::Unauthorized));
	assert_eq!(actions.refresh_calls(), 0);
}

#[tokio::test]
async fn credentialed_request_without_a_broker_fails_unauthorized() {
	let transport = ScriptedTransport::new([]);
	let session = Session::builder(transport.clone()).build();
	let error = session
		.execute(credentialed("cred-orphan", "/one"))
		.await
		.expect_err("A credentialed request needs an auth broker.");

	assert!(matches!(error, Error::Unauthorized));
	assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn invalid_stored_credential_falls_through_to_refresh_on_dispatch() {
	let transport = ScriptedTransport::new([ScriptedExchange::status(200)]);
	let actions = ScriptedTokenActions::new();

	// The stored token fails its next validation, so the dispatch-time
	// `get_current_token` falls through to a full refresh.
	actions.fail_validation_once("access-stale");

	let broker = Arc::new(AuthBroker::new(actions.clone(), stale_store()));
	let session = Session::builder(transport.clone()).auth(broker).build();

	session
		.execute(credentialed("cred-1", "/one"))
		.await
		.expect("Dispatch should refresh the invalid credential and proceed.");

	assert_eq!(actions.refresh_calls(), 1);
	assert_eq!(transport.authorization_of_call(0), Some("Bearer access-rotated".into()));
}
