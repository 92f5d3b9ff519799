//! # MQTT Mux
//!
//! A topic router for MQTT: register handlers for topic patterns with named
//! parameters and let the router subscribe, match and dispatch.
//!
//! ## Features
//!
//! - **Named parameters**: `devices/:device_id/cmd` subscribes to
//!   `devices/+/cmd` and hands `device_id` to the handler
//! - **Route registry**: concurrent registration, last registration wins
//! - **Detached dispatch**: every handler call runs in its own tokio task,
//!   optionally capped by a semaphore
//! - **Partial-failure tolerant setup**: one rejected subscription never
//!   blocks the others
//! - **Pluggable transport**: anything implementing [`Transport`]; a
//!   `rumqttc` binding is included
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mqtt_mux::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let config = MqttTransportConfig::localhost("mux_quickstart");
//!     let (transport, connection) = MqttTransport::connect(config).await?;
//!
//!     let mux = TopicMux::new(transport)?;
//!     mux.register(
//!         "buildings/:building/rooms/:room/temperature",
//!         QoS::AtLeastOnce,
//!         |msg: IncomingMessage, params: TopicParams| async move {
//!             println!(
//!                 "{} / {}: {} bytes",
//!                 params.get("building").unwrap_or("?"),
//!                 params.get("room").unwrap_or("?"),
//!                 msg.payload().len()
//!             );
//!         },
//!     )?;
//!
//!     // Non-blocking: subscriptions are acknowledged in the background
//!     mux.init();
//!
//!     tokio::signal::ctrl_c().await?;
//!     connection.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Pattern Syntax
//!
//! - Segments are separated by `/`
//! - `:name` captures one topic level under `name`
//! - Everything else, including `+`, `#` and empty levels, is copied to the
//!   subscription filter verbatim
//!
//! Empty patterns, unnamed parameters (`:`) and duplicate parameter names
//! are rejected at registration.

#![warn(missing_docs)]

pub mod config;
pub mod connection;
/// Crate-level error types
pub mod error;
pub mod message;
pub mod mux;
pub mod routing;
pub mod topic;
pub mod transport;

// === Core Public API ===
pub use config::{DispatcherSettings, MqttTransportConfig, TransportSettings};
pub use connection::MqttConnection;
pub use error::{ConnectionEstablishmentError, MuxError};
pub use message::IncomingMessage;
pub use mux::TopicMux;
pub use routing::{
	Dispatcher, InitHandle, InitReport, MessageHandler, MuxState, Route,
	RouteConfig, RouteRegistry,
};
// Essential external types
pub use rumqttc::{MqttOptions, QoS};
pub use topic::{TopicParams, TopicPatternPath};
pub use transport::{DeliveryCallback, MqttTransport, Transport};

/// Result type alias for operations that may fail with MuxError
pub type Result<T> = std::result::Result<T, MuxError>;

/// Prelude module for convenient imports
///
/// ```rust
/// use mqtt_mux::prelude::*;
/// ```
pub mod prelude {
	pub use crate::{
		DispatcherSettings, IncomingMessage, MqttConnection, MqttTransport,
		MqttTransportConfig, MuxError, QoS, Result, RouteConfig, TopicMux,
		TopicParams,
	};
}

/// Error types used throughout the library
///
/// ```rust
/// use mqtt_mux::errors::*;
/// ```
pub mod errors {
	pub use crate::routing::SubscriptionError;
	pub use crate::topic::{TopicParamsError, TopicPatternError};
	pub use crate::transport::TransportError;
	pub use crate::{ConnectionEstablishmentError, MuxError};
}
