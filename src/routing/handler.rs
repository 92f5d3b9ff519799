//! Route handler contract

use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::message::IncomingMessage;
use crate::topic::TopicParams;

/// Callback invoked for every message delivered to a route.
///
/// The returned future runs as a detached task; its output is discarded.
/// Implemented for any `Fn(IncomingMessage, TopicParams) -> impl Future`,
/// so async closures and `async fn` items can be registered directly.
pub trait MessageHandler: Send + Sync + 'static {
	/// Handles one message with the parameters extracted from its topic.
	fn call(
		&self,
		message: IncomingMessage,
		params: TopicParams,
	) -> BoxFuture<'static, ()>;
}

impl<F, Fut> MessageHandler for F
where
	F: Fn(IncomingMessage, TopicParams) -> Fut + Send + Sync + 'static,
	Fut: Future + Send + 'static,
{
	fn call(
		&self,
		message: IncomingMessage,
		params: TopicParams,
	) -> BoxFuture<'static, ()> {
		(self)(message, params).map(drop).boxed()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	async fn count_handler(
		counter: Arc<AtomicUsize>,
		params: TopicParams,
	) -> Result<(), std::io::Error> {
		if params.get("id").is_some() {
			counter.fetch_add(1, Ordering::SeqCst);
		}
		Ok(())
	}

	#[tokio::test]
	async fn test_closure_handler_output_is_discarded() {
		let counter = Arc::new(AtomicUsize::new(0));
		let counter_clone = counter.clone();
		let handler = move |_msg: IncomingMessage, params: TopicParams| {
			count_handler(counter_clone.clone(), params)
		};

		let params: TopicParams = [("id", "1")].into_iter().collect();
		MessageHandler::call(&handler, IncomingMessage::new("a/1", "x"), params)
			.await;

		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_handler_as_trait_object() {
		let handler: Arc<dyn MessageHandler> =
			Arc::new(|msg: IncomingMessage, _params: TopicParams| async move {
				assert_eq!(msg.payload().as_ref(), b"on");
			});
		handler
			.call(IncomingMessage::new("lights/1", "on"), TopicParams::new())
			.await;
	}
}
