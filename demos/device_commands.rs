//! Routes device commands and sensor readings to async handlers.
//!
//! ```bash
//! MQTT_BROKER=mqtt://localhost:1883 cargo run --example device_commands
//! mosquitto_pub -t devices/pump-1/cmd -m reboot
//! mosquitto_pub -t buildings/hq/rooms/101/temperature -m 21.5
//! ```

mod shared;

use std::time::Duration;

use mqtt_mux::prelude::*;
use tracing::{info, warn};

async fn on_command(msg: IncomingMessage, params: TopicParams) {
	let device_id = params.get("device_id").unwrap_or_default();
	let command = String::from_utf8_lossy(msg.payload());
	info!(device_id, command = %command, "Executing device command");
	// Stand-in for real work; other messages keep flowing meanwhile
	tokio::time::sleep(Duration::from_millis(500)).await;
	info!(device_id, "Command done");
}

async fn on_temperature(msg: IncomingMessage, params: TopicParams) {
	let reading = std::str::from_utf8(msg.payload())
		.ok()
		.and_then(|s| s.trim().parse::<f32>().ok());
	match reading {
		| Some(celsius) => info!(
			building = params.get("building_id").unwrap_or_default(),
			room = params.get("room_id").unwrap_or_default(),
			celsius,
			"Temperature reading"
		),
		| None => warn!(topic = %msg.topic(), "Unreadable temperature payload"),
	}
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
	shared::tracing::setup("info,mqtt_mux=debug");

	let config = MqttTransportConfig::from_url(&shared::config::build_url(
		"device_commands",
	))?;
	info!(broker = ?config.connection.broker_address(), "Connecting");
	let (transport, connection) = MqttTransport::connect(config).await?;

	let settings = DispatcherSettings {
		max_concurrent_handlers: Some(64),
		..Default::default()
	};
	let mux = TopicMux::with_settings(transport, settings)?;
	mux.register("devices/:device_id/cmd", QoS::AtLeastOnce, on_command)?;
	mux.register_with_config(
		"buildings/:building_id/rooms/:room_id/temperature",
		RouteConfig::with_qos(QoS::AtMostOnce).label("temperature"),
		on_temperature,
	)?;

	let report = mux.init().wait().await;
	for failure in &report.failed {
		warn!(filter = failure.filter(), error = %failure, "Route not subscribed");
	}
	info!(subscribed = report.subscribed.len(), "Routing, press Ctrl+C to stop");

	tokio::signal::ctrl_c().await?;
	connection.shutdown().await?;
	Ok(())
}
