//! Request envelopes for the six gateway operations
//!
//! Envelopes are per-request values; nothing in them is persisted as-is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Parameters handed to a single named filter
pub type FilterParams = HashMap<String, String>;

/// Named filter selection: filter name to its parameters
pub type Filters = HashMap<String, FilterParams>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Create {
	pub entity: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Read {
	pub id: String,
	#[serde(default, skip_serializing_if = "HashMap::is_empty")]
	pub filters: Filters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Update {
	pub id: String,
	pub entity: Value,
	#[serde(default, skip_serializing_if = "HashMap::is_empty")]
	pub filters: Filters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delete {
	pub id: String,
	#[serde(default, skip_serializing_if = "HashMap::is_empty")]
	pub filters: Filters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Search {
	#[serde(default)]
	pub skip: u64,
	/// Page size, `0` meaning no limit
	#[serde(default)]
	pub take: u64,
	/// Equality-only conditions, all of which must hold
	#[serde(default, rename = "where", skip_serializing_if = "HashMap::is_empty")]
	pub conditions: HashMap<String, String>,
	#[serde(default, skip_serializing_if = "HashMap::is_empty")]
	pub filters: Filters,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub sort: Vec<Sort>,
	/// Associations to eager-load. Accepted on the wire but rejected by the
	/// gateway: related data is reached through named filters.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub preload: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
	pub field: String,
	#[serde(default)]
	pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
	#[default]
	Asc,
	Desc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Patch {
	pub id: String,
	/// Columns to change and their new values
	pub data: Map<String, Value>,
	#[serde(default, skip_serializing_if = "HashMap::is_empty")]
	pub filters: Filters,
}
