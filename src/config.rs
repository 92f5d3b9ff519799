//! Configuration for the dispatcher and the MQTT transport

use rumqttc::{MqttOptions, OptionError};

use crate::error::MuxError;

/// Dispatcher behavior settings
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
	/// How long a subscribe request may stay unacknowledged before it is
	/// reported as failed (must be > 0)
	pub subscribe_timeout_millis: u64,
	/// Upper bound on concurrently running handlers; `None` is unbounded.
	/// Messages over the limit wait in their own task, never on the
	/// transport's delivery path.
	pub max_concurrent_handlers: Option<usize>,
}

impl Default for DispatcherSettings {
	fn default() -> Self {
		Self {
			subscribe_timeout_millis: 5_000,
			max_concurrent_handlers: None,
		}
	}
}

impl DispatcherSettings {
	pub(crate) fn validate(&self) -> Result<(), MuxError> {
		if self.subscribe_timeout_millis == 0 {
			return Err(MuxError::ConfigurationValue(
				"subscribe_timeout_millis must be greater than 0".to_string(),
			));
		}
		if self.max_concurrent_handlers == Some(0) {
			return Err(MuxError::ConfigurationValue(
				"max_concurrent_handlers must be greater than 0".to_string(),
			));
		}
		Ok(())
	}
}

/// MQTT transport performance and behavior settings
#[derive(Debug, Clone)]
pub struct TransportSettings {
	/// Capacity of the rumqttc request channel (must be > 0)
	pub event_loop_capacity: usize,
	/// Time allowed for the initial CONNACK
	pub connection_timeout_millis: u64,
	/// Pause between event loop polls after a connection error
	pub reconnect_delay_millis: u64,
	/// Consecutive event loop errors after which the loop stops
	pub max_consecutive_errors: u32,
}

impl Default for TransportSettings {
	fn default() -> Self {
		Self {
			event_loop_capacity: 10,
			connection_timeout_millis: 5_000,
			reconnect_delay_millis: 1_000,
			max_consecutive_errors: 10,
		}
	}
}

impl TransportSettings {
	pub(crate) fn validate(&self) -> Result<(), MuxError> {
		if self.event_loop_capacity == 0 {
			return Err(MuxError::ConfigurationValue(
				"event_loop_capacity must be greater than 0".to_string(),
			));
		}
		if self.connection_timeout_millis == 0 {
			return Err(MuxError::ConfigurationValue(
				"connection_timeout_millis must be greater than 0".to_string(),
			));
		}
		if self.max_consecutive_errors == 0 {
			return Err(MuxError::ConfigurationValue(
				"max_consecutive_errors must be greater than 0".to_string(),
			));
		}
		Ok(())
	}
}

/// Configuration for [`MqttTransport`](crate::transport::MqttTransport)
#[derive(Debug, Clone)]
pub struct MqttTransportConfig {
	/// Underlying MQTT connection options (from rumqttc)
	pub connection: MqttOptions,
	/// Transport-level settings
	pub settings: TransportSettings,
}

impl MqttTransportConfig {
	/// Create config with default settings
	pub fn new(client_id: &str, host: &str, port: u16) -> Self {
		Self {
			connection: MqttOptions::new(client_id, host, port),
			settings: TransportSettings::default(),
		}
	}

	/// Parse configuration from MQTT URL
	///
	/// Supports: tcp://, mqtt://, ssl://, mqtts://, ws://, wss://.
	/// The URL must carry a `client_id` query parameter.
	pub fn from_url(url: &str) -> Result<Self, OptionError> {
		Ok(Self {
			connection: MqttOptions::parse_url(url)?,
			settings: TransportSettings::default(),
		})
	}

	/// Create config for localhost:1883
	pub fn localhost(client_id: &str) -> Self {
		Self::new(client_id, "localhost", 1883)
	}
}
