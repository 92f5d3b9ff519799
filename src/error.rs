use rumqttc::{ClientError, OptionError};

use crate::topic::TopicPatternError;

/// Errors raised while establishing the MQTT connection
#[derive(Debug, thiserror::Error)]
pub enum ConnectionEstablishmentError {
	/// Network or protocol failure before CONNACK
	#[error("Network connection failed: {0}")]
	Network(#[from] rumqttc::ConnectionError),

	/// Broker answered CONNACK with a failure code
	#[error("Broker rejected connection: {code:?}")]
	BrokerRejected {
		/// Return code sent by the broker
		code: rumqttc::ConnectReturnCode,
	},

	/// No CONNACK within the configured timeout
	#[error("Connection establishment timed out after {timeout_millis}ms")]
	Timeout {
		/// Configured timeout
		timeout_millis: u64,
	},
}

/// Errors returned by router configuration and setup
#[derive(Debug, thiserror::Error)]
pub enum MuxError {
	/// Pattern rejected at registration
	#[error("Topic pattern error: {0}")]
	TopicPattern(#[from] TopicPatternError),

	/// Configuration errors when parsing MQTT options
	#[error("Configuration error: {0}")]
	Configuration(#[from] OptionError),

	/// Invalid configuration parameter values
	#[error("Invalid configuration value: {0}")]
	ConfigurationValue(String),

	/// Client request failed, e.g. DISCONNECT on a closed request channel
	#[error("Client operation failed: {0}")]
	ClientOperation(#[from] ClientError),

	/// Connection establishment failed
	#[error("Failed to establish connection: {0}")]
	ConnectionEstablishment(#[from] ConnectionEstablishmentError),

	/// Dispatcher was created outside a tokio runtime
	#[error("No tokio runtime available to spawn handler tasks")]
	NoRuntime,
}

impl From<std::convert::Infallible> for MuxError {
	fn from(never: std::convert::Infallible) -> Self {
		match never {}
	}
}
