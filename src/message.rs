//! Messages delivered by the transport

use arcstr::ArcStr;
use bytes::Bytes;
use rumqttc::QoS;

/// Message delivered by the transport for a subscribed filter.
///
/// Cloning is cheap: topic and payload are reference counted.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
	topic: ArcStr,
	payload: Bytes,
	qos: QoS,
	retain: bool,
}

impl IncomingMessage {
	/// Creates a message with QoS 0 and no retain flag.
	pub fn new(topic: impl Into<ArcStr>, payload: impl Into<Bytes>) -> Self {
		Self {
			topic: topic.into(),
			payload: payload.into(),
			qos: QoS::AtMostOnce,
			retain: false,
		}
	}

	/// Sets the delivery QoS.
	pub fn with_qos(mut self, qos: QoS) -> Self {
		self.qos = qos;
		self
	}

	/// Sets the retain flag.
	pub fn with_retain(mut self, retain: bool) -> Self {
		self.retain = retain;
		self
	}

	/// Concrete topic the message was published on.
	pub fn topic(&self) -> &str {
		&self.topic
	}

	/// Raw payload bytes.
	pub fn payload(&self) -> &Bytes {
		&self.payload
	}

	/// QoS the message was delivered with.
	pub fn qos(&self) -> QoS {
		self.qos
	}

	/// True if the broker delivered a retained message.
	pub fn retain(&self) -> bool {
		self.retain
	}
}

impl From<rumqttc::Publish> for IncomingMessage {
	fn from(publish: rumqttc::Publish) -> Self {
		Self {
			topic: ArcStr::from(publish.topic),
			payload: publish.payload,
			qos: publish.qos,
			retain: publish.retain,
		}
	}
}
