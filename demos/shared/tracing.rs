use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a compact subscriber.
///
/// `RUST_LOG` wins over `default_level`; `RUST_LOG_DISABLE` turns tracing
/// off entirely.
///
/// ```bash
/// RUST_LOG=mqtt_mux=debug cargo run --example device_commands
/// ```
pub fn setup(default_level: &str) {
	dotenv::dotenv().ok();
	if std::env::var("RUST_LOG_DISABLE").is_ok() {
		return;
	}

	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

	tracing_subscriber::registry()
		.with(filter)
		.with(
			tracing_subscriber::fmt::layer()
				.with_target(true)
				.with_thread_ids(false)
				.compact(),
		)
		.init();
}
