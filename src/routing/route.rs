use std::fmt;
use std::sync::Arc;

use arcstr::ArcStr;
use rumqttc::QoS;

use super::handler::MessageHandler;
use crate::topic::{TopicParams, TopicParamsError, TopicPatternPath};

/// Per-route registration options
#[derive(Debug, Clone)]
pub struct RouteConfig {
	/// QoS requested for the route's subscription
	pub qos: QoS,
	/// Diagnostic label used in log records; defaults to the pattern
	pub label: Option<ArcStr>,
}

impl Default for RouteConfig {
	fn default() -> Self {
		Self {
			qos: QoS::AtLeastOnce,
			label: None,
		}
	}
}

impl RouteConfig {
	/// Config with the given QoS and no label
	pub fn with_qos(qos: QoS) -> Self {
		Self { qos, label: None }
	}

	/// Sets the diagnostic label
	pub fn label(mut self, label: impl Into<ArcStr>) -> Self {
		self.label = Some(label.into());
		self
	}
}

/// Compiled association of a pattern, its filter, QoS and handler.
///
/// Immutable once built; shared as `Arc<Route>` between the registry and
/// the delivery callbacks installed on the transport.
pub struct Route {
	pattern: TopicPatternPath,
	qos: QoS,
	label: ArcStr,
	handler: Arc<dyn MessageHandler>,
}

impl Route {
	/// Builds a route from an already compiled pattern
	pub fn new(
		pattern: TopicPatternPath,
		config: RouteConfig,
		handler: Arc<dyn MessageHandler>,
	) -> Self {
		let label = config.label.unwrap_or_else(|| pattern.topic_pattern());
		Self {
			pattern,
			qos: config.qos,
			label,
			handler,
		}
	}

	/// Original pattern string, the registry key
	pub fn pattern(&self) -> ArcStr {
		self.pattern.topic_pattern()
	}

	/// Compiled subscription filter
	pub fn filter(&self) -> ArcStr {
		self.pattern.mqtt_filter()
	}

	/// Compiled pattern
	pub fn topic_pattern(&self) -> &TopicPatternPath {
		&self.pattern
	}

	/// Subscription QoS
	pub fn qos(&self) -> QoS {
		self.qos
	}

	/// Diagnostic label
	pub fn label(&self) -> &str {
		&self.label
	}

	/// Handler invoked for every delivered message
	pub fn handler(&self) -> &Arc<dyn MessageHandler> {
		&self.handler
	}

	/// Extracts the route's parameters from a delivered topic
	pub fn extract_params(
		&self,
		topic: &str,
	) -> Result<TopicParams, TopicParamsError> {
		self.pattern.extract(topic)
	}
}

impl fmt::Debug for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("pattern", &self.pattern.topic_pattern())
			.field("filter", &self.pattern.mqtt_filter())
			.field("qos", &self.qos)
			.field("params", &self.pattern.params_by_index())
			.field("label", &self.label)
			.finish_non_exhaustive()
	}
}
