//! Tests for Dispatcher initialization and delivery callbacks

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use parking_lot::Mutex;
use rumqttc::QoS;
use tokio::sync::{Notify, mpsc};

use super::{Dispatcher, MuxState, RouteConfig, RouteRegistry, SubscriptionError};
use crate::config::DispatcherSettings;
use crate::error::MuxError;
use crate::message::IncomingMessage;
use crate::topic::TopicParams;
use crate::transport::{DeliveryCallback, Transport, TransportError};

#[derive(Default)]
struct StubTransport {
	calls: Mutex<Vec<String>>,
	callbacks: Mutex<HashMap<String, DeliveryCallback>>,
	never_ack: HashSet<String>,
}

impl StubTransport {
	fn never_acking(filters: &[&str]) -> Self {
		Self {
			never_ack: filters.iter().map(|f| f.to_string()).collect(),
			..Default::default()
		}
	}

	fn call_count(&self) -> usize {
		self.calls.lock().len()
	}

	fn deliver(&self, filter: &str, message: IncomingMessage) {
		let callback = self
			.callbacks
			.lock()
			.get(filter)
			.cloned()
			.expect("filter should be subscribed");
		callback(message);
	}
}

impl Transport for StubTransport {
	type Token = BoxFuture<'static, Result<(), TransportError>>;

	fn subscribe(
		&self,
		filter: &str,
		_qos: QoS,
		callback: DeliveryCallback,
	) -> Self::Token {
		self.calls.lock().push(filter.to_string());
		self.callbacks.lock().insert(filter.to_string(), callback);
		if self.never_ack.contains(filter) {
			future::pending().boxed()
		} else {
			future::ready(Ok(())).boxed()
		}
	}
}

fn dispatcher(
	transport: Arc<StubTransport>,
	settings: DispatcherSettings,
) -> (Arc<RouteRegistry>, Dispatcher<Arc<StubTransport>>) {
	let registry = Arc::new(RouteRegistry::new());
	let dispatcher =
		Dispatcher::with_settings(registry.clone(), transport, settings)
			.expect("dispatcher should be created inside a runtime");
	(registry, dispatcher)
}

async fn noop(_msg: IncomingMessage, _params: TopicParams) {}

#[test]
fn test_requires_runtime() {
	let registry = Arc::new(RouteRegistry::new());
	let result = Dispatcher::new(registry, StubTransport::default());
	assert!(matches!(result, Err(MuxError::NoRuntime)));
}

#[tokio::test]
async fn test_rejects_invalid_settings() {
	let registry = Arc::new(RouteRegistry::new());
	let settings = DispatcherSettings {
		max_concurrent_handlers: Some(0),
		..Default::default()
	};
	let result =
		Dispatcher::with_settings(registry, StubTransport::default(), settings);
	assert!(matches!(result, Err(MuxError::ConfigurationValue(_))));
}

#[tokio::test]
async fn test_state_transitions_and_reinitialization() {
	let transport = Arc::new(StubTransport::default());
	let (registry, dispatcher) =
		dispatcher(transport.clone(), DispatcherSettings::default());
	assert_eq!(dispatcher.state(), MuxState::Unconfigured);

	registry
		.register("a/:x", RouteConfig::default(), noop)
		.unwrap();
	let init = dispatcher.initialize();
	assert_eq!(init.len(), 1);
	assert_eq!(dispatcher.state(), MuxState::Active);
	assert!(init.wait().await.is_complete());

	// Late registration has no effect until the next initialize
	registry
		.register("b/:y", RouteConfig::default(), noop)
		.unwrap();
	assert_eq!(transport.call_count(), 1);

	let init = dispatcher.initialize();
	assert_eq!(init.len(), 2);
	assert_eq!(transport.call_count(), 3);
	assert_eq!(dispatcher.state(), MuxState::Active);
}

#[tokio::test]
async fn test_empty_registry_initializes() {
	let transport = Arc::new(StubTransport::default());
	let (_registry, dispatcher) =
		dispatcher(transport.clone(), DispatcherSettings::default());

	let init = dispatcher.initialize();
	assert!(init.is_empty());
	assert_eq!(dispatcher.state(), MuxState::Active);
	assert!(init.wait().await.is_complete());
}

#[tokio::test]
async fn test_unacknowledged_subscription_times_out() {
	let transport = Arc::new(StubTransport::never_acking(&["slow/+"]));
	let settings = DispatcherSettings {
		subscribe_timeout_millis: 50,
		..Default::default()
	};
	let (registry, dispatcher) = dispatcher(transport.clone(), settings);
	for pattern in ["fast/:a", "slow/:b", "other/:c"] {
		registry
			.register(pattern, RouteConfig::default(), noop)
			.unwrap();
	}

	let report = dispatcher.initialize().wait().await;

	assert_eq!(transport.call_count(), 3);
	assert_eq!(report.subscribed, vec!["fast/+", "other/+"]);
	assert_eq!(report.failed.len(), 1);
	assert!(matches!(
		&report.failed[0],
		SubscriptionError::Timeout { filter, timeout_millis: 50 } if filter == "slow/+"
	));
}

#[tokio::test]
async fn test_extraction_failure_drops_message() {
	let transport = Arc::new(StubTransport::default());
	let (registry, dispatcher) =
		dispatcher(transport.clone(), DispatcherSettings::default());
	let calls = Arc::new(AtomicUsize::new(0));
	let calls_clone = calls.clone();
	registry
		.register(
			"devices/:device_id/cmd/:command",
			RouteConfig::default(),
			move |_msg: IncomingMessage, _params: TopicParams| {
				let calls = calls_clone.clone();
				async move {
					calls.fetch_add(1, Ordering::SeqCst);
				}
			},
		)
		.unwrap();
	dispatcher.initialize();

	// Callback invoked directly with a topic the filter would never match
	transport.deliver("devices/+/cmd/+", IncomingMessage::new("devices/1", "x"));
	transport.deliver(
		"devices/+/cmd/+",
		IncomingMessage::new("devices/1/cmd/reboot", "x"),
	);

	tokio::time::sleep(Duration::from_millis(50)).await;
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_handler_limit_serializes_without_blocking_delivery() {
	let transport = Arc::new(StubTransport::default());
	let settings = DispatcherSettings {
		max_concurrent_handlers: Some(1),
		..Default::default()
	};
	let (registry, dispatcher) = dispatcher(transport.clone(), settings);

	let release = Arc::new(Notify::new());
	let (started_tx, mut started_rx) = mpsc::unbounded_channel();
	let handler_release = release.clone();
	registry
		.register(
			"jobs/:job",
			RouteConfig::default(),
			move |_msg: IncomingMessage, params: TopicParams| {
				let release = handler_release.clone();
				let started_tx = started_tx.clone();
				async move {
					let job = params.get("job").unwrap_or_default().to_string();
					let _ = started_tx.send(job.clone());
					if job == "first" {
						release.notified().await;
					}
				}
			},
		)
		.unwrap();
	dispatcher.initialize();

	transport.deliver("jobs/+", IncomingMessage::new("jobs/first", ""));
	let first = tokio::time::timeout(Duration::from_secs(2), started_rx.recv())
		.await
		.unwrap();
	assert_eq!(first.as_deref(), Some("first"));

	// Delivery returns at once; the handler waits for the only permit
	transport.deliver("jobs/+", IncomingMessage::new("jobs/second", ""));
	let early =
		tokio::time::timeout(Duration::from_millis(100), started_rx.recv())
			.await;
	assert!(early.is_err(), "second handler ran despite the limit");

	release.notify_one();
	let second = tokio::time::timeout(Duration::from_secs(2), started_rx.recv())
		.await
		.unwrap();
	assert_eq!(second.as_deref(), Some("second"));
}
