//! Survey structure logic that does not touch storage: answer validation,
//! builder edits on the ordered question list, and the paginated taker.

use std::collections::BTreeMap;

pub mod builder;
pub mod taker;
pub mod validate;

/// Inline field errors keyed by question id.
pub type FieldErrors = BTreeMap<String, String>;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
