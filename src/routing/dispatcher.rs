use std::sync::Arc;
use std::time::Duration;

use arcstr::ArcStr;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, warn};

use super::error::SubscriptionError;
use super::route::Route;
use super::route_registry::RouteRegistry;
use crate::config::DispatcherSettings;
use crate::error::MuxError;
use crate::message::IncomingMessage;
use crate::transport::{DeliveryCallback, Transport};

/// Lifecycle state of a dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxState {
	/// Routes may be registered, no subscription requested yet
	Unconfigured,
	/// Subscriptions requested at least once
	Active,
}

/// Subscribes every registered route on the transport and dispatches
/// delivered messages to route handlers.
///
/// Handlers run as detached tokio tasks. Without
/// [`DispatcherSettings::max_concurrent_handlers`] the number of running
/// handlers is unbounded, and nothing cancels a handler that never returns.
pub struct Dispatcher<T> {
	registry: Arc<RouteRegistry>,
	transport: T,
	runtime: Handle,
	settings: DispatcherSettings,
	handler_permits: Option<Arc<Semaphore>>,
	state: Mutex<MuxState>,
}

impl<T: Transport> Dispatcher<T> {
	/// Creates a dispatcher on the current tokio runtime with default
	/// settings.
	pub fn new(
		registry: Arc<RouteRegistry>,
		transport: T,
	) -> Result<Self, MuxError> {
		Self::with_settings(registry, transport, DispatcherSettings::default())
	}

	/// Creates a dispatcher on the current tokio runtime.
	///
	/// Fails with [`MuxError::NoRuntime`] outside a runtime context.
	pub fn with_settings(
		registry: Arc<RouteRegistry>,
		transport: T,
		settings: DispatcherSettings,
	) -> Result<Self, MuxError> {
		let runtime = Handle::try_current().map_err(|_| MuxError::NoRuntime)?;
		Self::with_runtime(registry, transport, settings, runtime)
	}

	/// Creates a dispatcher spawning its tasks on `runtime`.
	pub fn with_runtime(
		registry: Arc<RouteRegistry>,
		transport: T,
		settings: DispatcherSettings,
		runtime: Handle,
	) -> Result<Self, MuxError> {
		settings.validate()?;
		let handler_permits = settings
			.max_concurrent_handlers
			.map(|limit| Arc::new(Semaphore::new(limit)));
		Ok(Self {
			registry,
			transport,
			runtime,
			settings,
			handler_permits,
			state: Mutex::new(MuxState::Unconfigured),
		})
	}

	/// Current lifecycle state
	pub fn state(&self) -> MuxState {
		*self.state.lock()
	}

	/// Registry the dispatcher reads routes from
	pub fn registry(&self) -> &Arc<RouteRegistry> {
		&self.registry
	}

	/// Transport subscriptions are issued on
	pub fn transport(&self) -> &T {
		&self.transport
	}

	/// Issues one subscribe request per route currently registered.
	///
	/// Does not wait for acknowledgements: each request is awaited on its
	/// own task, and a failed or timed out request is logged without
	/// affecting the others. Calling it again re-subscribes every route,
	/// including routes registered since the previous call.
	pub fn initialize(&self) -> InitHandle {
		let routes = self.registry.snapshot();
		info!(routes = routes.len(), "Setting topic subscriptions");

		let pending = routes
			.into_iter()
			.map(|route| (route.filter(), self.subscribe_route(route)))
			.collect();

		let previous =
			std::mem::replace(&mut *self.state.lock(), MuxState::Active);
		if previous == MuxState::Active {
			debug!("Dispatcher re-initialized");
		}
		info!("Topic subscriptions requested");
		InitHandle { pending }
	}

	fn subscribe_route(
		&self,
		route: Arc<Route>,
	) -> JoinHandle<Result<(), SubscriptionError>> {
		let filter = route.filter();
		debug!(
			pattern = %route.pattern(),
			filter = %filter,
			qos = ?route.qos(),
			label = %route.label(),
			"Setting subscription"
		);

		let callback = delivery_callback(
			route.clone(),
			self.runtime.clone(),
			self.handler_permits.clone(),
		);
		let token = self.transport.subscribe(&filter, route.qos(), callback);

		let timeout_millis = self.settings.subscribe_timeout_millis;
		self.runtime.spawn(async move {
			let outcome =
				match time::timeout(Duration::from_millis(timeout_millis), token)
					.await
				{
					| Ok(Ok(())) => Ok(()),
					| Ok(Err(source)) => Err(SubscriptionError::SubscribeFailed {
						filter: filter.to_string(),
						source,
					}),
					| Err(_) => Err(SubscriptionError::Timeout {
						filter: filter.to_string(),
						timeout_millis,
					}),
				};
			match &outcome {
				| Ok(()) => {
					debug!(filter = %filter, label = %route.label(), "Subscription acknowledged");
				}
				| Err(err) => {
					error!(
						filter = %filter,
						label = %route.label(),
						error = %err,
						"Failed to subscribe route"
					);
				}
			}
			outcome
		})
	}
}

/// Builds the callback installed on the transport for one route.
///
/// Extraction happens on the delivering task; the handler itself is
/// spawned so the transport never waits for it.
fn delivery_callback(
	route: Arc<Route>,
	runtime: Handle,
	handler_permits: Option<Arc<Semaphore>>,
) -> DeliveryCallback {
	Arc::new(move |message: IncomingMessage| {
		let params = match route.extract_params(message.topic()) {
			| Ok(params) => params,
			| Err(err) => {
				warn!(
					label = %route.label(),
					topic = %message.topic(),
					error = %err,
					"Dropping message: parameter extraction failed"
				);
				return;
			}
		};
		debug!(
			label = %route.label(),
			topic = %message.topic(),
			payload_size = message.payload().len(),
			"Dispatching message to handler"
		);

		let handler = route.handler().clone();
		let permits = handler_permits.clone();
		runtime.spawn(async move {
			let _permit = match permits {
				| Some(permits) => match permits.acquire_owned().await {
					| Ok(permit) => Some(permit),
					| Err(_) => return,
				},
				| None => None,
			};
			handler.call(message, params).await;
		});
	})
}

/// Outcome of one [`Dispatcher::initialize`] pass.
///
/// Dropping it does not cancel anything; awaiting [`wait`](Self::wait)
/// is only needed by callers that want to know when every subscribe
/// request has been settled.
#[derive(Debug)]
pub struct InitHandle {
	pending: Vec<(ArcStr, JoinHandle<Result<(), SubscriptionError>>)>,
}

impl InitHandle {
	/// Number of subscribe requests issued
	pub fn len(&self) -> usize {
		self.pending.len()
	}

	/// Returns true if no route was registered
	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	/// Waits until every subscribe request is acknowledged, rejected or
	/// timed out.
	pub async fn wait(self) -> InitReport {
		let mut report = InitReport::default();
		for (filter, handle) in self.pending {
			match handle.await {
				| Ok(Ok(())) => report.subscribed.push(filter),
				| Ok(Err(err)) => report.failed.push(err),
				| Err(join_err) => {
					warn!(filter = %filter, error = %join_err, "Subscribe task did not complete");
					report.failed.push(SubscriptionError::Aborted {
						filter: filter.to_string(),
					});
				}
			}
		}
		report
	}
}

/// Settled subscribe requests of one initialization pass
#[derive(Debug, Default)]
pub struct InitReport {
	/// Filters the transport acknowledged
	pub subscribed: Vec<ArcStr>,
	/// Requests that failed, one per affected route
	pub failed: Vec<SubscriptionError>,
}

impl InitReport {
	/// Returns true if every request was acknowledged
	pub fn is_complete(&self) -> bool {
		self.failed.is_empty()
	}
}
