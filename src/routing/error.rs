use thiserror::Error;

use crate::transport::TransportError;

/// Errors during subscription operations
#[derive(Debug, Error)]
pub enum SubscriptionError {
	/// Transport reported a failure for the subscribe request
	#[error("Failed to subscribe to '{filter}': {source}")]
	SubscribeFailed {
		/// Filter that could not be subscribed
		filter: String,
		/// Underlying transport failure
		#[source]
		source: TransportError,
	},
	/// Subscribe request was not acknowledged in time
	#[error("Subscribe request for '{filter}' timed out after {timeout_millis}ms")]
	Timeout {
		/// Filter whose request timed out
		filter: String,
		/// Configured timeout
		timeout_millis: u64,
	},
	/// Task awaiting the request ended before settling it
	#[error("Subscribe request for '{filter}' was aborted")]
	Aborted {
		/// Filter whose request was aborted
		filter: String,
	},
}

impl SubscriptionError {
	/// Filter the failed request was issued for
	pub fn filter(&self) -> &str {
		match self {
			| SubscriptionError::SubscribeFailed { filter, .. }
			| SubscriptionError::Timeout { filter, .. }
			| SubscriptionError::Aborted { filter } => filter,
		}
	}
}
