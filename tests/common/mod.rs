//! Recording transport shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use mqtt_mux::errors::TransportError;
use mqtt_mux::{DeliveryCallback, IncomingMessage, QoS, Transport};
use parking_lot::Mutex;

/// One subscribe call seen by [`RecordingTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeCall {
	pub filter: String,
	pub qos: QoS,
}

/// Transport that records subscribe calls, keeps the installed callbacks
/// and rejects the filters it was told to reject.
#[derive(Default)]
pub struct RecordingTransport {
	calls: Mutex<Vec<SubscribeCall>>,
	callbacks: Mutex<HashMap<String, DeliveryCallback>>,
	rejected: HashSet<String>,
}

impl RecordingTransport {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn rejecting(filters: &[&str]) -> Arc<Self> {
		Arc::new(Self {
			rejected: filters.iter().map(|f| f.to_string()).collect(),
			..Default::default()
		})
	}

	pub fn calls(&self) -> Vec<SubscribeCall> {
		self.calls.lock().clone()
	}

	pub fn filters(&self) -> Vec<String> {
		let mut filters: Vec<String> =
			self.calls.lock().iter().map(|c| c.filter.clone()).collect();
		filters.sort();
		filters
	}

	/// Hands `message` to the callback installed for `filter`, the way a
	/// broker delivery would.
	pub fn deliver(&self, filter: &str, message: IncomingMessage) {
		let callback = self
			.callbacks
			.lock()
			.get(filter)
			.cloned()
			.unwrap_or_else(|| panic!("no callback installed for {filter}"));
		callback(message);
	}

	pub fn has_callback(&self, filter: &str) -> bool {
		self.callbacks.lock().contains_key(filter)
	}
}

impl Transport for RecordingTransport {
	type Token = BoxFuture<'static, Result<(), TransportError>>;

	fn subscribe(
		&self,
		filter: &str,
		qos: QoS,
		callback: DeliveryCallback,
	) -> Self::Token {
		self.calls.lock().push(SubscribeCall {
			filter: filter.to_string(),
			qos,
		});
		self.callbacks.lock().insert(filter.to_string(), callback);
		if self.rejected.contains(filter) {
			future::ready(Err(TransportError::SubscribeRejected)).boxed()
		} else {
			future::ready(Ok(())).boxed()
		}
	}
}

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "mqtt_mux=debug".into()),
		)
		.with_test_writer()
		.try_init();
}
