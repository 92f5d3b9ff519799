//! MQTT connection lifecycle
//!
//! Kept apart from [`MqttTransport`] so the transport can be cloned and
//! handed to a dispatcher while one owner controls shutdown.

use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::error::MuxError;
use crate::transport::MqttTransport;

/// MQTT connection handle for lifecycle management
///
/// Keep it alive for the duration of the MQTT session and call
/// [`shutdown`](Self::shutdown) when done.
pub struct MqttConnection {
	transport: Option<MqttTransport>,
	event_loop_handle: Option<JoinHandle<()>>,
}

impl MqttConnection {
	pub(crate) fn new(
		transport: MqttTransport,
		event_loop_handle: JoinHandle<()>,
	) -> Self {
		Self {
			transport: Some(transport),
			event_loop_handle: Some(event_loop_handle),
		}
	}

	/// Gracefully shutdown the MQTT connection by:
	/// 1. Unsubscribing every filter and dropping delivery callbacks
	/// 2. Sending MQTT Disconnect packet (terminates the event loop)
	/// 3. Waiting for the event loop to finish processing
	///
	/// Handler tasks already spawned keep running to completion. A client
	/// that can no longer take the Disconnect request is reported as
	/// [`MuxError::ClientOperation`] after the event loop task is joined.
	pub async fn shutdown(mut self) -> Result<(), MuxError> {
		let mut disconnect_result = Ok(());
		if let Some(transport) = self.transport.take() {
			transport.unsubscribe_all().await;
			if let Err(e) = transport.client().disconnect().await {
				warn!(error = %e, "Failed to disconnect MQTT client");
				disconnect_result = Err(MuxError::ClientOperation(e));
			}
		}

		if let Some(handle) = self.event_loop_handle.take() {
			if let Err(e) = handle.await {
				warn!(error = %e, "Event loop task failed");
			}
		}

		disconnect_result
	}

	/// True while the event loop task is running
	pub fn is_running(&self) -> bool {
		self.event_loop_handle
			.as_ref()
			.is_some_and(|handle| !handle.is_finished())
	}
}

impl Drop for MqttConnection {
	fn drop(&mut self) {
		if self.transport.is_some() || self.event_loop_handle.is_some() {
			error!(
				"MqttConnection dropped without calling shutdown(). Please \
				 call shutdown() and await its completion before dropping."
			);
		}
	}
}
