//! Generic persistence gateway
//!
//! Exposes create, read, update, delete, search and patch for any registered
//! sea-orm entity over a message-based RPC transport. Callers send JSON
//! envelopes and receive the stored entity or a `{code, message}` error
//! descriptor; they never see SQL.

pub mod config;
pub mod gateway;
pub mod infra;
pub mod logging;
pub mod service;

pub use config::ServiceConfig;
pub use gateway::{
	Constraint, ErrorCode, ErrorDescriptor, NamedFilter, QueryModifier, Scoped, StorageGateway,
	Storable,
};
pub use service::{Service, ServiceError};
