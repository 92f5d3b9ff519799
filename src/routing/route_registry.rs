use std::collections::HashMap;
use std::sync::Arc;

use arcstr::ArcStr;
use parking_lot::RwLock;
use tracing::debug;

use super::handler::MessageHandler;
use super::route::{Route, RouteConfig};
use crate::topic::{TopicPatternError, TopicPatternPath};

/// Table of compiled routes keyed by their original pattern string.
///
/// Registration takes the write lock; [`snapshot`](Self::snapshot) takes the
/// read lock, so neither ever observes a partially inserted route.
/// Share it as `Arc<RouteRegistry>` between the registering code and the
/// [`Dispatcher`](super::Dispatcher).
#[derive(Debug, Default)]
pub struct RouteRegistry {
	routes: RwLock<HashMap<ArcStr, Arc<Route>>>,
}

impl RouteRegistry {
	/// Creates an empty registry
	pub fn new() -> Self {
		Self::default()
	}

	/// Compiles `pattern` and stores a route for it.
	///
	/// Re-registering a pattern replaces the previous route. Already
	/// established transport subscriptions keep the previous route until the
	/// dispatcher is initialized again.
	pub fn register<H>(
		&self,
		pattern: impl TryInto<TopicPatternPath, Error: Into<TopicPatternError>>,
		config: RouteConfig,
		handler: H,
	) -> Result<Arc<Route>, TopicPatternError>
	where
		H: MessageHandler,
	{
		let pattern = pattern.try_into().map_err(Into::into)?;
		let route = Arc::new(Route::new(pattern, config, Arc::new(handler)));
		self.insert(route.clone());
		Ok(route)
	}

	/// Stores an already built route, returning the one it replaced.
	pub fn insert(&self, route: Arc<Route>) -> Option<Arc<Route>> {
		debug!(
			pattern = %route.pattern(),
			filter = %route.filter(),
			qos = ?route.qos(),
			label = %route.label(),
			"Registering route"
		);
		let previous = self.routes.write().insert(route.pattern(), route);
		if let Some(previous) = &previous {
			debug!(
				pattern = %previous.pattern(),
				label = %previous.label(),
				"Replaced existing route"
			);
		}
		previous
	}

	/// Returns the route registered for `pattern`
	pub fn get(&self, pattern: &str) -> Option<Arc<Route>> {
		self.routes.read().get(pattern).cloned()
	}

	/// Consistent copy of all routes, ordered by pattern.
	pub fn snapshot(&self) -> Vec<Arc<Route>> {
		let mut routes: Vec<Arc<Route>> =
			self.routes.read().values().cloned().collect();
		routes.sort_unstable_by_key(|route| route.pattern());
		routes
	}

	/// Registered pattern strings, sorted
	pub fn patterns(&self) -> Vec<ArcStr> {
		let mut patterns: Vec<ArcStr> =
			self.routes.read().keys().cloned().collect();
		patterns.sort_unstable();
		patterns
	}

	/// Number of registered routes
	pub fn len(&self) -> usize {
		self.routes.read().len()
	}

	/// Returns true if no route is registered
	pub fn is_empty(&self) -> bool {
		self.routes.read().is_empty()
	}
}

#[cfg(test)]
mod tests {
	use std::thread;

	use rumqttc::QoS;

	use super::*;
	use crate::message::IncomingMessage;
	use crate::topic::TopicParams;

	async fn noop(_msg: IncomingMessage, _params: TopicParams) {}

	#[test]
	fn test_register_compiles_pattern() {
		let registry = RouteRegistry::new();
		let route = registry
			.register(
				"devices/:device_id/cmd",
				RouteConfig::with_qos(QoS::ExactlyOnce),
				noop,
			)
			.unwrap();

		assert_eq!(route.filter(), "devices/+/cmd");
		assert_eq!(route.qos(), QoS::ExactlyOnce);
		assert_eq!(route.label(), "devices/:device_id/cmd");
		assert_eq!(registry.len(), 1);
		assert!(registry.get("devices/:device_id/cmd").is_some());
	}

	#[test]
	fn test_reregistration_replaces_route() {
		let registry = RouteRegistry::new();
		registry
			.register(
				"devices/:id",
				RouteConfig::with_qos(QoS::AtMostOnce).label("first"),
				noop,
			)
			.unwrap();
		registry
			.register(
				"devices/:id",
				RouteConfig::with_qos(QoS::AtLeastOnce).label("second"),
				noop,
			)
			.unwrap();

		assert_eq!(registry.len(), 1);
		let route = registry.get("devices/:id").unwrap();
		assert_eq!(route.label(), "second");
		assert_eq!(route.qos(), QoS::AtLeastOnce);
	}

	#[test]
	fn test_invalid_pattern_is_not_registered() {
		let registry = RouteRegistry::new();
		let result =
			registry.register("a/:x/:x", RouteConfig::default(), noop);

		assert!(matches!(
			result,
			Err(TopicPatternError::DuplicateParameter { .. })
		));
		assert!(registry.is_empty());
	}

	#[test]
	fn test_snapshot_is_sorted_and_detached() {
		let registry = RouteRegistry::new();
		for pattern in ["c/:x", "a/:x", "b/:x"] {
			registry
				.register(pattern, RouteConfig::default(), noop)
				.unwrap();
		}

		let snapshot = registry.snapshot();
		registry
			.register("d/:x", RouteConfig::default(), noop)
			.unwrap();

		let patterns: Vec<_> = snapshot.iter().map(|r| r.pattern()).collect();
		assert_eq!(patterns, vec!["a/:x", "b/:x", "c/:x"]);
		assert_eq!(registry.patterns(), vec!["a/:x", "b/:x", "c/:x", "d/:x"]);
	}

	#[test]
	fn test_concurrent_registration() {
		let registry = RouteRegistry::new();
		thread::scope(|scope| {
			for worker in 0 .. 8 {
				let registry = &registry;
				scope.spawn(move || {
					for i in 0 .. 50 {
						let pattern = format!("workers/{worker}/items/{i}/:id");
						registry
							.register(pattern, RouteConfig::default(), noop)
							.unwrap();
						// Overlapping key, last writer wins
						registry
							.register("shared/:id", RouteConfig::default(), noop)
							.unwrap();
						let _ = registry.snapshot();
					}
				});
			}
		});

		assert_eq!(registry.len(), 8 * 50 + 1);
	}
}
