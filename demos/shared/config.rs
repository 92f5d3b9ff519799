use uuid::Uuid;

/// Broker URL from `MQTT_BROKER`, falling back to a local plain-text broker
pub fn broker_url() -> String {
	dotenv::dotenv().ok();
	std::env::var("MQTT_BROKER")
		.unwrap_or_else(|_| "mqtt://localhost:1883".to_string())
}

/// Broker URL with a unique `client_id` such as `device_commands_a1b2c3d4`
pub fn build_url(client_id_prefix: &str) -> String {
	let base_url = broker_url();
	let suffix = Uuid::new_v4().simple().to_string();
	let client_id = format!("{client_id_prefix}_{}", &suffix[.. 8]);
	let separator = if base_url.contains('?') { '&' } else { '?' };
	format!("{base_url}{separator}client_id={client_id}")
}
