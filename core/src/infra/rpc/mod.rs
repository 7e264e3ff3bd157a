//! RPC adapter - binds transport messages to gateway operations
//!
//! Each entity is reachable under six routing keys of the form
//! `<prefix>.<entity>.<operation>`. The adapter decodes the request envelope,
//! calls the gateway and always answers with a reply: the result on success
//! or the `{code, message}` descriptor on failure.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

pub mod router;
pub mod server;

pub use router::{Procedure, Router, RouterError};
pub use server::{serve_connection, RpcServer, ShutdownHandle, DEFAULT_MAX_FRAME_BYTES};

/// The six gateway operations, named as they appear in routing keys
#[derive(
	Debug,
	Clone,
	Copy,
	PartialEq,
	Eq,
	Hash,
	Serialize,
	Deserialize,
	Display,
	EnumString,
	EnumIter,
	AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
	Create,
	Read,
	Update,
	Delete,
	Search,
	Patch,
}

/// Routing key for one operation of one entity
pub fn subject(prefix: &str, entity: &str, operation: Operation) -> String {
	format!("{prefix}.{entity}.{operation}")
}

/// Newline-delimited request frame read by the socket server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestFrame {
	pub subject: String,
	#[serde(default)]
	pub payload: serde_json::Value,
}

/// Newline-delimited reply frame written by the socket server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyFrame {
	pub subject: String,
	pub reply: serde_json::Value,
}
