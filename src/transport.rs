//! Transport seam
//!
//! The router never talks to the network itself. It subscribes filters
//! through a [`Transport`] and receives messages through the delivery
//! callback it installs. [`MqttTransport`] binds the seam to `rumqttc`.

pub(crate) mod ack_tracker;
/// `rumqttc` binding of the transport seam
pub mod mqtt_transport;

use std::future::Future;
use std::sync::Arc;

use rumqttc::QoS;
use thiserror::Error;

use crate::message::IncomingMessage;

pub use mqtt_transport::MqttTransport;

/// Callback invoked by the transport once per delivered message that
/// matches the subscribed filter. May be called from any task,
/// concurrently; implementations must return promptly.
pub type DeliveryCallback = Arc<dyn Fn(IncomingMessage) + Send + Sync>;

/// Errors reported by a transport for a subscribe request
#[derive(Debug, Error)]
pub enum TransportError {
	/// Broker answered the subscribe request with a failure code
	#[error("Broker rejected the subscription")]
	SubscribeRejected,

	/// Connection dropped before the request was acknowledged
	#[error("Connection lost before the subscription was acknowledged")]
	ConnectionLost,

	/// Client refused to queue the request
	#[error("Client operation failed: {0}")]
	Client(#[from] rumqttc::ClientError),

	/// Any other transport-specific failure
	#[error("Transport error: {0}")]
	Other(String),
}

/// Publish/subscribe client the router subscribes through.
pub trait Transport: Send + Sync + 'static {
	/// Completion of one subscribe request. Resolves once the transport
	/// knows whether the subscription was accepted.
	type Token: Future<Output = Result<(), TransportError>> + Send + 'static;

	/// Requests a subscription for `filter` and installs `callback` for the
	/// messages it delivers. Must not block; the outcome is reported through
	/// the returned token.
	fn subscribe(
		&self,
		filter: &str,
		qos: QoS,
		callback: DeliveryCallback,
	) -> Self::Token;
}

impl<T: Transport> Transport for Arc<T> {
	type Token = T::Token;

	fn subscribe(
		&self,
		filter: &str,
		qos: QoS,
		callback: DeliveryCallback,
	) -> Self::Token {
		(**self).subscribe(filter, qos, callback)
	}
}
