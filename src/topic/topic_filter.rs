//! MQTT subscription filter matching

/// Returns true if `topic` matches the subscription `filter`.
///
/// `+` matches exactly one level, a trailing `#` matches the parent level
/// and everything below it. Topics starting with `$` are never matched by
/// a wildcard in the first level.
pub fn filter_matches(filter: &str, topic: &str) -> bool {
	if topic.starts_with('$') && filter.starts_with(['+', '#']) {
		return false;
	}

	let mut filter_levels = filter.split('/');
	let mut topic_levels = topic.split('/');
	loop {
		match (filter_levels.next(), topic_levels.next()) {
			| (Some("#"), _) => return true,
			| (Some("+"), Some(_)) => {}
			| (Some(expected), Some(level)) if expected == level => {}
			| (None, None) => return true,
			| _ => return false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::filter_matches;

	#[test]
	fn test_exact_match() {
		assert!(filter_matches("devices/42/cmd", "devices/42/cmd"));
		assert!(!filter_matches("devices/42/cmd", "devices/43/cmd"));
		assert!(!filter_matches("devices/42", "devices/42/cmd"));
		assert!(!filter_matches("devices/42/cmd", "devices/42"));
	}

	#[test]
	fn test_single_level_wildcard() {
		assert!(filter_matches("devices/+/cmd", "devices/42/cmd"));
		assert!(filter_matches("devices/+/cmd", "devices//cmd"));
		assert!(!filter_matches("devices/+/cmd", "devices/42/43/cmd"));
		assert!(!filter_matches("devices/+", "devices"));
		assert!(filter_matches("+/+", "/finance"));
	}

	#[test]
	fn test_multi_level_wildcard() {
		assert!(filter_matches("sport/#", "sport"));
		assert!(filter_matches("sport/#", "sport/tennis/player1"));
		assert!(filter_matches("#", "anything/at/all"));
		assert!(!filter_matches("sport/#", "sports"));
		assert!(filter_matches("sport/+/#", "sport/tennis"));
	}

	#[test]
	fn test_system_topics_not_matched_by_leading_wildcard() {
		assert!(!filter_matches("#", "$SYS/broker/uptime"));
		assert!(!filter_matches("+/broker/uptime", "$SYS/broker/uptime"));
		assert!(filter_matches("$SYS/#", "$SYS/broker/uptime"));
		assert!(filter_matches("$SYS/+/uptime", "$SYS/broker/uptime"));
	}
}
