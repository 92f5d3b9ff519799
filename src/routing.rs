//! Route registration and message dispatch
//!
//! Routes are compiled and stored in a [`RouteRegistry`]. A [`Dispatcher`]
//! subscribes every route on the transport and hands delivered messages to
//! the route handlers.

/// Route subscription and message dispatch
pub mod dispatcher;
/// Routing and subscription error types
pub mod error;
pub mod handler;
/// Compiled routes and their options
pub mod route;
/// Concurrent route table
pub mod route_registry;

#[cfg(test)]
mod dispatcher_tests;

// Re-export commonly used types for convenience
pub use dispatcher::{Dispatcher, InitHandle, InitReport, MuxState};
pub use error::SubscriptionError;
pub use handler::MessageHandler;
pub use route::{Route, RouteConfig};
pub use route_registry::RouteRegistry;
