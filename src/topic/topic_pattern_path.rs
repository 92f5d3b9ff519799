use std::collections::HashSet;
use std::convert::TryFrom;
use std::slice::Iter;

use arcstr::ArcStr;
use smallvec::SmallVec;

use super::error::validation;
use super::topic_params::{TopicParams, TopicParamsError};
use super::topic_pattern_item::{TopicPatternError, TopicPatternItem};

/// Positional parameter map: segment index -> parameter name.
pub type ParamsByIndex = SmallVec<[(usize, ArcStr); 4]>;

/// Compiled topic pattern with named parameters.
///
/// `devices/:device_id/cmd` compiles to the subscription filter
/// `devices/+/cmd` and the parameter map `{1: "device_id"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPatternPath {
	template_pattern: ArcStr, // original pattern "devices/:device_id/cmd"
	mqtt_filter: ArcStr,      // broker filter "devices/+/cmd"
	segments: Vec<TopicPatternItem>,
	params_by_index: ParamsByIndex,
}

impl TopicPatternPath {
	/// Compiles a topic pattern into a subscription filter and a positional
	/// parameter map.
	pub fn compile(
		topic_pattern: impl Into<ArcStr>,
	) -> Result<Self, TopicPatternError> {
		let topic_pattern = topic_pattern.into();
		validation::validate_pattern(&topic_pattern)?;

		let segments: Vec<TopicPatternItem> = topic_pattern
			.split('/')
			.map(|s| TopicPatternItem::from(topic_pattern.substr_from(s)))
			.collect();

		let mut seen_names = HashSet::new();
		let mut params_by_index = ParamsByIndex::new();
		for (index, segment) in segments.iter().enumerate() {
			let Some(name) = segment.param_name() else {
				continue;
			};
			if name.is_empty() {
				return Err(TopicPatternError::empty_parameter_name(
					topic_pattern.as_str(),
					index,
				));
			}
			if !seen_names.insert(name.as_str()) {
				return Err(TopicPatternError::duplicate_parameter(
					topic_pattern.as_str(),
					name.as_str(),
				));
			}
			params_by_index.push((index, ArcStr::from(name.as_str())));
		}

		let mqtt_filter = if params_by_index.is_empty() {
			topic_pattern.clone()
		} else {
			ArcStr::from(Self::to_mqtt_filter(&segments))
		};

		Ok(Self {
			template_pattern: topic_pattern,
			mqtt_filter,
			segments,
			params_by_index,
		})
	}

	/// Returns the original pattern with `:name` parameters.
	pub fn topic_pattern(&self) -> ArcStr {
		self.template_pattern.clone()
	}

	/// Returns the subscription filter with `+` in place of parameters.
	pub fn mqtt_filter(&self) -> ArcStr {
		self.mqtt_filter.clone()
	}

	/// Returns the segment index -> parameter name pairs, ordered by index.
	pub fn params_by_index(&self) -> &[(usize, ArcStr)] {
		&self.params_by_index
	}

	/// Returns parameter names in pattern order.
	pub fn param_names(&self) -> impl Iterator<Item = &str> {
		self.params_by_index.iter().map(|(_, name)| name.as_str())
	}

	/// Number of parameter segments.
	pub fn param_count(&self) -> usize {
		self.params_by_index.len()
	}

	/// Minimum number of segments a topic needs for extraction to succeed.
	pub fn required_segments(&self) -> usize {
		self.params_by_index
			.last()
			.map_or(0, |(index, _)| index + 1)
	}

	/// Returns iterator over pattern segments.
	pub fn iter(&self) -> Iter<TopicPatternItem> {
		self.segments.iter()
	}

	/// Returns number of segments in pattern.
	pub fn len(&self) -> usize {
		self.segments.len()
	}

	/// Returns true if pattern has no segments.
	pub fn is_empty(&self) -> bool {
		self.segments.is_empty()
	}

	/// Extracts parameter values from a concrete topic by segment position.
	///
	/// Literal segments are not compared; the transport has already matched
	/// the topic against the filter.
	pub fn extract(&self, topic: &str) -> Result<TopicParams, TopicParamsError> {
		let segments: SmallVec<[&str; 8]> = topic.split('/').collect();
		let mut params = TopicParams::with_capacity(self.params_by_index.len());
		for (index, name) in &self.params_by_index {
			let Some(value) = segments.get(*index) else {
				return Err(TopicParamsError::TopicTooShort {
					topic: topic.to_string(),
					pattern: self.template_pattern.to_string(),
					required: self.required_segments(),
					found: segments.len(),
				});
			};
			params.set(name.clone(), *value);
		}
		Ok(params)
	}

	fn to_mqtt_filter(segments: &[TopicPatternItem]) -> String {
		// A pattern ending in ":name/" leaves a dangling separator after the
		// wildcard; drop that one empty segment.
		let end = match segments {
			| [.., TopicPatternItem::Param(_), TopicPatternItem::Str(last)]
				if last.is_empty() =>
			{
				segments.len() - 1
			}
			| _ => segments.len(),
		};

		let mut filter = String::with_capacity(Self::str_len(&segments[.. end]));
		for (i, segment) in segments[.. end].iter().enumerate() {
			if i > 0 {
				filter.push('/');
			}
			filter.push_str(segment.as_filter());
		}
		filter
	}

	fn str_len(segments: &[TopicPatternItem]) -> usize {
		if segments.is_empty() {
			return 0;
		}
		(segments.len() - 1) + // slashes count
		segments.iter().map(|s| s.as_filter().len()).sum::<usize>()
	}
}

impl std::fmt::Display for TopicPatternPath {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.template_pattern)
	}
}

impl TryFrom<String> for TopicPatternPath {
	type Error = TopicPatternError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::compile(value)
	}
}

impl TryFrom<&str> for TopicPatternPath {
	type Error = TopicPatternError;

	fn try_from(value: &str) -> Result<Self, Self::Error> {
		Self::compile(value)
	}
}

impl TryFrom<&String> for TopicPatternPath {
	type Error = TopicPatternError;

	fn try_from(value: &String) -> Result<Self, Self::Error> {
		Self::compile(value.as_str())
	}
}

impl TryFrom<ArcStr> for TopicPatternPath {
	type Error = TopicPatternError;

	fn try_from(value: ArcStr) -> Result<Self, Self::Error> {
		Self::compile(value)
	}
}
