//! Router facade combining a route registry and a dispatcher

use std::sync::Arc;

use rumqttc::QoS;

use crate::config::DispatcherSettings;
use crate::error::MuxError;
use crate::routing::{
	Dispatcher, InitHandle, MessageHandler, MuxState, Route, RouteConfig,
	RouteRegistry,
};
use crate::topic::{TopicPatternError, TopicPatternPath};
use crate::transport::Transport;

/// Topic router: register pattern handlers, then [`init`](Self::init) to
/// subscribe them all.
///
/// ```rust,no_run
/// use mqtt_mux::prelude::*;
///
/// # async fn run() -> mqtt_mux::Result<()> {
/// let config = MqttTransportConfig::from_url(
///     "mqtt://localhost:1883?client_id=mux-example",
/// )?;
/// let (transport, connection) = MqttTransport::connect(config).await?;
///
/// let mux = TopicMux::new(transport)?;
/// mux.register(
///     "devices/:device_id/cmd",
///     QoS::AtLeastOnce,
///     |msg: IncomingMessage, params: TopicParams| async move {
///         let device_id = params.get("device_id").unwrap_or_default();
///         println!("command for {device_id}: {:?}", msg.payload());
///     },
/// )?;
/// mux.init();
///
/// // ... later
/// connection.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct TopicMux<T> {
	registry: Arc<RouteRegistry>,
	dispatcher: Dispatcher<T>,
}

impl<T: Transport> TopicMux<T> {
	/// Creates a router on the current tokio runtime
	pub fn new(transport: T) -> Result<Self, MuxError> {
		Self::with_settings(transport, DispatcherSettings::default())
	}

	/// Creates a router with custom dispatcher settings
	pub fn with_settings(
		transport: T,
		settings: DispatcherSettings,
	) -> Result<Self, MuxError> {
		let registry = Arc::new(RouteRegistry::new());
		let dispatcher =
			Dispatcher::with_settings(registry.clone(), transport, settings)?;
		Ok(Self {
			registry,
			dispatcher,
		})
	}

	/// Registers `handler` for `pattern`; the pattern doubles as the label.
	pub fn register<H>(
		&self,
		pattern: impl TryInto<TopicPatternPath, Error: Into<TopicPatternError>>,
		qos: QoS,
		handler: H,
	) -> Result<Arc<Route>, MuxError>
	where
		H: MessageHandler,
	{
		self.register_with_config(pattern, RouteConfig::with_qos(qos), handler)
	}

	/// Registers `handler` for `pattern` with explicit QoS and label
	pub fn register_with_config<H>(
		&self,
		pattern: impl TryInto<TopicPatternPath, Error: Into<TopicPatternError>>,
		config: RouteConfig,
		handler: H,
	) -> Result<Arc<Route>, MuxError>
	where
		H: MessageHandler,
	{
		Ok(self.registry.register(pattern, config, handler)?)
	}

	/// Subscribes every registered route. See [`Dispatcher::initialize`].
	pub fn init(&self) -> InitHandle {
		self.dispatcher.initialize()
	}

	/// Current lifecycle state
	pub fn state(&self) -> MuxState {
		self.dispatcher.state()
	}

	/// Shared route registry
	pub fn registry(&self) -> &Arc<RouteRegistry> {
		&self.registry
	}

	/// Underlying dispatcher
	pub fn dispatcher(&self) -> &Dispatcher<T> {
		&self.dispatcher
	}
}
