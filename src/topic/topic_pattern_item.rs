//! Topic pattern segment types

use std::borrow::Cow;

use arcstr::Substr;
use thiserror::Error;

/// Error types for topic pattern compilation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopicPatternError {
	/// Empty topic pattern is not valid
	#[error("Topic pattern cannot be empty")]
	EmptyTopic,

	/// Parameter segment without a name (a bare `:`)
	#[error(
		"Invalid topic pattern '{pattern}': parameter at segment {position} \
		 has no name"
	)]
	EmptyParameterName {
		/// The invalid pattern
		pattern: String,
		/// Segment index of the unnamed parameter
		position: usize,
	},

	/// The same parameter name appears more than once
	#[error(
		"Invalid topic pattern '{pattern}': parameter ':{name}' is used more \
		 than once"
	)]
	DuplicateParameter {
		/// The invalid pattern
		pattern: String,
		/// Name of the repeated parameter
		name: String,
	},

	/// Pattern violates transport-level topic constraints
	#[error("Invalid topic pattern '{pattern}': {reason}")]
	InvalidPattern {
		/// The invalid pattern
		pattern: String,
		/// Description of the violated constraint
		reason: String,
	},
}

impl TopicPatternError {
	/// Creates a new EmptyParameterName error
	pub fn empty_parameter_name(
		pattern: impl Into<String>,
		position: usize,
	) -> Self {
		Self::EmptyParameterName {
			pattern: pattern.into(),
			position,
		}
	}

	/// Creates a new DuplicateParameter error
	pub fn duplicate_parameter(
		pattern: impl Into<String>,
		name: impl Into<String>,
	) -> Self {
		Self::DuplicateParameter {
			pattern: pattern.into(),
			name: name.into(),
		}
	}

	/// Creates a new InvalidPattern error
	pub fn invalid_pattern(
		pattern: impl Into<String>,
		reason: impl Into<String>,
	) -> Self {
		Self::InvalidPattern {
			pattern: pattern.into(),
			reason: reason.into(),
		}
	}
}

impl From<std::convert::Infallible> for TopicPatternError {
	fn from(never: std::convert::Infallible) -> Self {
		match never {}
	}
}

/// Topic pattern segment: literal string or named parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TopicPatternItem {
	/// Literal segment, copied to the filter unchanged (`+` and `#` included)
	Str(Substr),
	/// Named parameter `:name`, compiled to a single-level wildcard
	Param(Substr),
}

impl TopicPatternItem {
	/// Returns the segment as it appears in the subscription filter.
	pub fn as_filter(&self) -> &str {
		match self {
			| TopicPatternItem::Str(s) => s,
			| TopicPatternItem::Param(_) => "+",
		}
	}

	/// Returns the segment as it appears in the original pattern.
	pub fn as_pattern(&self) -> Cow<str> {
		match self {
			| TopicPatternItem::Str(s) => Cow::Borrowed(s),
			| TopicPatternItem::Param(name) => Cow::Owned(format!(":{name}")),
		}
	}

	/// Returns parameter name for parameter segments.
	pub fn param_name(&self) -> Option<&Substr> {
		match self {
			| TopicPatternItem::Param(name) => Some(name),
			| TopicPatternItem::Str(_) => None,
		}
	}

	/// Returns true if this item captures a topic segment.
	pub fn is_param(&self) -> bool {
		matches!(self, TopicPatternItem::Param(_))
	}
}

impl std::fmt::Display for TopicPatternItem {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_pattern())
	}
}

impl From<Substr> for TopicPatternItem {
	fn from(item: Substr) -> Self {
		match item.strip_prefix(':') {
			| Some(name) => TopicPatternItem::Param(item.substr_from(name)),
			| None => TopicPatternItem::Str(item),
		}
	}
}
