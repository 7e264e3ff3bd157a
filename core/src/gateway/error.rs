//! Error descriptor returned by every gateway operation

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Classification of a failed gateway operation
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ErrorCode {
	/// The payload could not be decoded into the entity shape
	Json,
	/// The decoded entity violated one or more declared constraints
	Validation,
	/// Any persistence failure, including a missing row
	Generic,
}

/// Serializable `{code, message}` error value
///
/// This is the only error shape that leaves the gateway, and it is also the
/// failure reply sent back over the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ErrorDescriptor {
	pub code: ErrorCode,
	pub message: String,
}

impl ErrorDescriptor {
	pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
		}
	}

	pub fn json(message: impl Into<String>) -> Self {
		Self::new(ErrorCode::Json, message)
	}

	pub fn validation(message: impl Into<String>) -> Self {
		Self::new(ErrorCode::Validation, message)
	}

	pub fn generic(message: impl Into<String>) -> Self {
		Self::new(ErrorCode::Generic, message)
	}

	/// Failure reply body, `{"code": ..., "message": ...}`
	pub fn to_value(&self) -> serde_json::Value {
		serde_json::json!({ "code": self.code, "message": self.message })
	}

	/// Classify an arbitrary error under `code`.
	///
	/// An error that already is a descriptor keeps its own code and message.
	pub fn classify(code: ErrorCode, error: impl Into<anyhow::Error>) -> Self {
		let error = error.into();

		match error.downcast::<Self>() {
			Ok(descriptor) => descriptor,
			Err(other) => Self::new(code, other.to_string()),
		}
	}
}

impl From<sea_orm::DbErr> for ErrorDescriptor {
	fn from(err: sea_orm::DbErr) -> Self {
		Self::generic(err.to_string())
	}
}

impl From<serde_json::Error> for ErrorDescriptor {
	fn from(err: serde_json::Error) -> Self {
		Self::json(err.to_string())
	}
}
