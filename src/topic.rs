//! Topic handling module
//!
//! Compiles parameterized topic patterns (`devices/:device_id/cmd`) into
//! MQTT subscription filters, extracts parameter values from delivered
//! topics and matches topics against filters.

// Submodules
pub mod error;
pub mod topic_filter;
pub mod topic_params;
pub mod topic_pattern_item;
/// Topic pattern compilation and parameter extraction
pub mod topic_pattern_path;


// Re-export commonly used types for convenience
// Re-export constants and validation utilities
pub use error::{limits, validation};
pub use topic_filter::filter_matches;
pub use topic_params::{TopicParams, TopicParamsError};
pub use topic_pattern_item::{TopicPatternError, TopicPatternItem};
pub use topic_pattern_path::{ParamsByIndex, TopicPatternPath};
