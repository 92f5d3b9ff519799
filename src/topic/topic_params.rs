//! Parameter values extracted from a concrete topic

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use arcstr::ArcStr;
use thiserror::Error;

/// Errors raised while extracting parameters from a delivered topic
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopicParamsError {
	/// Topic has fewer segments than the highest parameter position needs
	#[error(
		"Topic '{topic}' has {found} segments, pattern '{pattern}' needs at \
		 least {required}"
	)]
	TopicTooShort {
		/// The delivered topic
		topic: String,
		/// Pattern the route was compiled from
		pattern: String,
		/// Minimum number of segments required
		required: usize,
		/// Number of segments actually present
		found: usize,
	},
}

/// Named parameter values of one delivered message.
///
/// Values are the raw topic segments; no type coercion is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicParams {
	values: HashMap<ArcStr, String>,
}

impl TopicParams {
	/// Creates an empty parameter set.
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn with_capacity(capacity: usize) -> Self {
		Self {
			values: HashMap::with_capacity(capacity),
		}
	}

	/// Returns the value of parameter `name`, if present.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.values.get(name).map(String::as_str)
	}

	/// Parses the value of parameter `name`.
	///
	/// Returns `None` when the parameter is absent.
	pub fn get_parsed<T: FromStr>(
		&self,
		name: &str,
	) -> Option<Result<T, T::Err>> {
		self.get(name).map(str::parse)
	}

	/// Sets parameter `name` to `value`, replacing any previous value.
	pub fn set(&mut self, name: impl Into<ArcStr>, value: impl Into<String>) {
		self.values.insert(name.into(), value.into());
	}

	/// Returns true if parameter `name` is present.
	pub fn contains(&self, name: &str) -> bool {
		self.values.contains_key(name)
	}

	/// Number of parameters in the set.
	pub fn len(&self) -> usize {
		self.values.len()
	}

	/// Returns true if the set holds no parameters.
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Iterates over `(name, value)` pairs in unspecified order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

impl fmt::Display for TopicParams {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut pairs: Vec<_> = self.iter().collect();
		pairs.sort_unstable();
		write!(f, "{{")?;
		for (i, (name, value)) in pairs.into_iter().enumerate() {
			if i > 0 {
				write!(f, ", ")?;
			}
			write!(f, "{name}: {value}")?;
		}
		write!(f, "}}")
	}
}

impl<K, V> FromIterator<(K, V)> for TopicParams
where
	K: Into<ArcStr>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut params = Self::new();
		for (name, value) in iter {
			params.set(name, value);
		}
		params
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_get_and_set() {
		let mut params = TopicParams::new();
		assert!(params.is_empty());

		params.set("device_id", "42");
		assert_eq!(params.get("device_id"), Some("42"));
		assert_eq!(params.get("missing"), None);
		assert!(params.contains("device_id"));
		assert_eq!(params.len(), 1);

		params.set("device_id", "43");
		assert_eq!(params.get("device_id"), Some("43"));
		assert_eq!(params.len(), 1);
	}

	#[test]
	fn test_get_parsed() {
		let params: TopicParams =
			[("id", "17"), ("name", "kitchen")].into_iter().collect();

		assert_eq!(params.get_parsed::<u32>("id"), Some(Ok(17)));
		assert!(matches!(params.get_parsed::<u32>("name"), Some(Err(_))));
		assert!(params.get_parsed::<u32>("absent").is_none());
	}

	#[test]
	fn test_display_is_sorted() {
		let params: TopicParams =
			[("room", "kitchen"), ("floor", "2")].into_iter().collect();
		assert_eq!(params.to_string(), "{floor: 2, room: kitchen}");
	}
}
