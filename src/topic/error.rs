//! Limits and validation shared by the topic module
//!
//! Error types live next to the code that raises them.

use super::topic_pattern_item::TopicPatternError;

/// Topic processing limits and constants
pub mod limits {
	/// Maximum encoded length of an MQTT topic or filter
	pub const MAX_TOPIC_LENGTH: usize = 65_535;
}

/// Validation utilities for topic operations
pub mod validation {
	use super::TopicPatternError;
	use super::limits::MAX_TOPIC_LENGTH;

	/// Validates a pattern string before it is split into segments
	pub fn validate_pattern(pattern: &str) -> Result<(), TopicPatternError> {
		if pattern.is_empty() || pattern.trim().is_empty() {
			return Err(TopicPatternError::EmptyTopic);
		}

		if pattern.len() > MAX_TOPIC_LENGTH {
			return Err(TopicPatternError::invalid_pattern(
				pattern,
				format!(
					"pattern too long: {} > {MAX_TOPIC_LENGTH} bytes",
					pattern.len()
				),
			));
		}

		if pattern.contains('\0') {
			return Err(TopicPatternError::invalid_pattern(
				pattern,
				"null byte in pattern",
			));
		}

		Ok(())
	}
}
