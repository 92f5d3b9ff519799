use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arcstr::ArcStr;
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use rumqttc::Packet::{self, Disconnect, Publish, SubAck};
use rumqttc::{AsyncClient, ConnAck, ConnectReturnCode, Event, EventLoop, QoS};
use rumqttc::{Event::Incoming, Event::Outgoing};
use smallvec::SmallVec;
use tokio::time;
use tracing::{debug, error, info, warn};

use super::ack_tracker::{AckReceiver, AckTracker};
use super::{DeliveryCallback, Transport, TransportError};
use crate::config::{MqttTransportConfig, TransportSettings};
use crate::connection::MqttConnection;
use crate::error::{ConnectionEstablishmentError, MuxError};
use crate::message::IncomingMessage;
use crate::topic::filter_matches;

struct FilterEntry {
	qos: QoS,
	callback: DeliveryCallback,
}

struct Shared {
	filters: RwLock<HashMap<ArcStr, FilterEntry>>,
	acks: AckTracker,
	/// Held from queueing an ack until the request reaches the client
	send_lock: tokio::sync::Mutex<()>,
}

/// [`Transport`] backed by a `rumqttc` client.
///
/// Delivered PUBLISH packets are passed to the callback of every subscribed
/// filter matching the topic. Subscribing a filter again replaces its
/// callback. Tokens resolve on SUBACK.
#[derive(Clone)]
pub struct MqttTransport {
	client: AsyncClient,
	shared: Arc<Shared>,
}

impl MqttTransport {
	/// Connects to the broker and starts the event loop.
	///
	/// Returns the transport and the connection handle; keep the handle
	/// alive for the session and call
	/// [`MqttConnection::shutdown`] when done.
	pub async fn connect(
		config: MqttTransportConfig,
	) -> Result<(Self, MqttConnection), MuxError> {
		config.settings.validate()?;
		let settings = config.settings;
		let (client, new_event_loop) =
			AsyncClient::new(config.connection, settings.event_loop_capacity);

		let timeout_millis = settings.connection_timeout_millis;
		let connected_event_loop = time::timeout(
			Duration::from_millis(timeout_millis),
			establish_connection(new_event_loop),
		)
		.await
		.map_err(|_| ConnectionEstablishmentError::Timeout { timeout_millis })??;

		let transport = Self::from_client(client);

		// The event loop terminates when it sees a Disconnect packet
		let loop_transport = transport.clone();
		let event_loop_handle = tokio::spawn(async move {
			loop_transport.run(connected_event_loop, settings).await;
		});
		let connection =
			MqttConnection::new(transport.clone(), event_loop_handle);
		Ok((transport, connection))
	}

	pub(crate) fn from_client(client: AsyncClient) -> Self {
		Self {
			client,
			shared: Arc::new(Shared {
				filters: RwLock::new(HashMap::new()),
				acks: AckTracker::new(),
				send_lock: tokio::sync::Mutex::new(()),
			}),
		}
	}

	/// Underlying rumqttc client
	pub fn client(&self) -> &AsyncClient {
		&self.client
	}

	/// Filters with an installed callback, sorted
	pub fn filters(&self) -> Vec<ArcStr> {
		let mut filters: Vec<ArcStr> =
			self.shared.filters.read().keys().cloned().collect();
		filters.sort_unstable();
		filters
	}

	/// Processes broker events until a Disconnect packet or too many
	/// consecutive errors.
	async fn run(self, mut event_loop: EventLoop, settings: TransportSettings) {
		let mut error_count = 0;
		let retry_delay = Duration::from_millis(settings.reconnect_delay_millis);

		loop {
			match event_loop.poll().await {
				| Ok(event) => {
					error_count = 0;
					if !self.handle_event(event) {
						break;
					}
				}
				| Err(err) => {
					error_count += 1;
					self.on_connection_error();
					error!(error_count = error_count, error = %err, "MQTT event loop error");

					if error_count >= settings.max_consecutive_errors {
						error!(
							error_count = error_count,
							max_errors = settings.max_consecutive_errors,
							"Too many consecutive errors, terminating event \
							 loop"
						);
						break;
					}

					warn!(delay = ?retry_delay, error_count = error_count, "Retrying MQTT connection");
					time::sleep(retry_delay).await;
				}
			}
		}
		self.shared.acks.fail_all();
		info!("MQTT event loop terminated");
	}

	/// Reacts to one event loop notification. Returns false once the loop
	/// should stop.
	fn handle_event(&self, event: Event) -> bool {
		match event {
			| Incoming(Packet::ConnAck(ConnAck {
				session_present: false,
				code: ConnectReturnCode::Success,
			})) => {
				info!(
					"MQTT reconnected without session, resubscribing to all \
					 filters"
				);
				self.resubscribe_all();
			}
			| Incoming(Packet::ConnAck(ConnAck {
				session_present: true,
				code: ConnectReturnCode::Success,
			})) => {
				info!(
					"MQTT reconnected with session preserved, subscriptions \
					 maintained by broker"
				);
			}
			| Incoming(Publish(p)) => {
				debug!(topic = %p.topic, payload_size = p.payload.len(), "Received MQTT message");
				self.deliver(IncomingMessage::from(p));
			}
			| Incoming(SubAck(ack)) => {
				self.shared.acks.on_suback(ack.pkid, &ack.return_codes);
			}
			| Outgoing(rumqttc::Outgoing::Subscribe(pkid)) => {
				self.shared.acks.on_outgoing(pkid);
			}
			| Incoming(Disconnect) => {
				info!("Received MQTT Disconnect packet from server");
				return false;
			}
			| Outgoing(rumqttc::Outgoing::Disconnect) => {
				info!("Sent MQTT Disconnect packet to server");
				return false;
			}
			| notification => {
				debug!(notification = ?notification, "Received other MQTT notification");
			}
		}
		true
	}

	/// Requests written before the connection dropped will never see their
	/// SUBACK.
	fn on_connection_error(&self) {
		self.shared.acks.fail_inflight();
	}

	fn deliver(&self, message: IncomingMessage) {
		let callbacks: SmallVec<[DeliveryCallback; 2]> = self
			.shared
			.filters
			.read()
			.iter()
			.filter(|(filter, _)| filter_matches(filter, message.topic()))
			.map(|(_, entry)| entry.callback.clone())
			.collect();

		if callbacks.is_empty() {
			debug!(topic = %message.topic(), "No subscribed filter matches topic");
			return;
		}
		for callback in callbacks {
			callback(message.clone());
		}
	}

	fn resubscribe_all(&self) {
		let filters: Vec<(ArcStr, QoS)> = self
			.shared
			.filters
			.read()
			.iter()
			.map(|(filter, entry)| (filter.clone(), entry.qos))
			.collect();

		for (filter, qos) in filters {
			let transport = self.clone();
			tokio::spawn(async move {
				if let Err(err) = transport.request_subscribe(filter.clone(), qos).await {
					error!(filter = %filter, error = %err, "Failed to resubscribe");
				}
			});
		}
	}

	async fn request_subscribe(
		self,
		filter: ArcStr,
		qos: QoS,
	) -> Result<(), TransportError> {
		// Detached so a dropped token never leaves its ack queued unsent
		let ack = tokio::spawn(self.send_subscribe(filter, qos))
			.await
			.map_err(|err| TransportError::Other(err.to_string()))??;
		ack.await.unwrap_or(Err(TransportError::ConnectionLost))
	}

	async fn send_subscribe(
		self,
		filter: ArcStr,
		qos: QoS,
	) -> Result<AckReceiver, TransportError> {
		let _send_guard = self.shared.send_lock.lock().await;
		let ack = self.shared.acks.enqueue();
		if let Err(err) = self.client.subscribe(filter.as_str(), qos).await {
			self.shared.acks.cancel_last();
			return Err(err.into());
		}
		Ok(ack)
	}

	/// Sends UNSUBSCRIBE for every filter and drops all callbacks.
	pub(crate) async fn unsubscribe_all(&self) {
		let filters: Vec<ArcStr> =
			self.shared.filters.write().drain().map(|(f, _)| f).collect();
		for filter in filters {
			if let Err(err) = self.client.unsubscribe(filter.as_str()).await {
				error!(filter = %filter, error = ?err, "Failed to unsubscribe from filter");
			}
		}
	}
}

impl Transport for MqttTransport {
	type Token = BoxFuture<'static, Result<(), TransportError>>;

	/// Installs the callback immediately; the SUBSCRIBE request is queued
	/// when the token is first polled.
	fn subscribe(
		&self,
		filter: &str,
		qos: QoS,
		callback: DeliveryCallback,
	) -> Self::Token {
		let filter = ArcStr::from(filter);
		let replaced = self
			.shared
			.filters
			.write()
			.insert(filter.clone(), FilterEntry { qos, callback })
			.is_some();
		if replaced {
			debug!(filter = %filter, "Replaced delivery callback for filter");
		}
		self.clone().request_subscribe(filter, qos).boxed()
	}
}

async fn establish_connection(
	mut event_loop: EventLoop,
) -> Result<EventLoop, ConnectionEstablishmentError> {
	loop {
		match event_loop.poll().await {
			| Ok(Incoming(Packet::ConnAck(ConnAck { code, .. }))) => {
				if code == ConnectReturnCode::Success {
					debug!("MQTT connection established successfully");
					return Ok(event_loop);
				} else {
					debug!(code = ?code, "MQTT connection rejected by broker");
					return Err(ConnectionEstablishmentError::BrokerRejected {
						code,
					});
				}
			}
			| Ok(notification) => {
				debug!(notification = ?notification, "Bootstrap phase notification");
			}
			| Err(connection_err) => {
				debug!(error = %connection_err, "MQTT connection error during bootstrap phase");
				return Err(ConnectionEstablishmentError::Network(
					connection_err,
				));
			}
		}
	}
}

#[cfg(test)]
#[path = "mqtt_transport_tests.rs"]
mod tests;
