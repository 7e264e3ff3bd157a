//! Routing keys to type-erased gateways

use super::{subject, Operation};
use crate::gateway::{ErrorCode, ErrorDescriptor, StorageGateway, Storable};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RouterError {
	#[error("routes for entity {0} are already mounted")]
	AlreadyMounted(String),
}

/// A gateway seen through the transport: raw payload in, reply out
#[async_trait]
pub trait Procedure: Send + Sync {
	/// Entity name used in routing keys
	fn name(&self) -> &str;

	/// Run `operation` and produce the reply body, never failing
	async fn call(&self, operation: Operation, payload: &[u8]) -> Value;
}

#[async_trait]
impl<S: Storable> Procedure for StorageGateway<S> {
	fn name(&self) -> &str {
		StorageGateway::name(self)
	}

	async fn call(&self, operation: Operation, payload: &[u8]) -> Value {
		match invoke(self, operation, payload).await {
			Ok(reply) => reply,
			Err(descriptor) => {
				debug!(
					entity = StorageGateway::name(self),
					%operation,
					code = %descriptor.code,
					"Replying with error"
				);
				descriptor.to_value()
			}
		}
	}
}

async fn invoke<S: Storable>(
	gateway: &StorageGateway<S>,
	operation: Operation,
	payload: &[u8],
) -> Result<Value, ErrorDescriptor> {
	match operation {
		Operation::Create => encode(gateway.create(bind(gateway, payload)?).await?),
		Operation::Read => encode(gateway.read(bind(gateway, payload)?).await?),
		Operation::Update => encode(gateway.update(bind(gateway, payload)?).await?),
		Operation::Delete => {
			gateway.delete(bind(gateway, payload)?).await?;
			Ok(Value::Bool(true))
		}
		Operation::Search => encode(gateway.search(bind(gateway, payload)?).await?),
		Operation::Patch => encode(gateway.patch(bind(gateway, payload)?).await?),
	}
}

fn bind<S: Storable, T: DeserializeOwned>(
	gateway: &StorageGateway<S>,
	payload: &[u8],
) -> Result<T, ErrorDescriptor> {
	serde_json::from_slice(payload).map_err(|e| {
		warn!(entity = gateway.name(), error = %e, "Parsing request envelope failed");
		ErrorDescriptor::from(e)
	})
}

fn encode<T: Serialize>(value: T) -> Result<Value, ErrorDescriptor> {
	serde_json::to_value(value).map_err(|e| ErrorDescriptor::classify(ErrorCode::Generic, e))
}

struct Route {
	operation: Operation,
	procedure: Arc<dyn Procedure>,
}

/// Maps `<prefix>.<entity>.<operation>` keys to mounted gateways
pub struct Router {
	prefix: String,
	routes: HashMap<String, Route>,
}

impl Router {
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
			routes: HashMap::new(),
		}
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	/// Mount all six operations of a gateway, returning their routing keys
	pub fn mount<S: Storable>(
		&mut self,
		gateway: StorageGateway<S>,
	) -> Result<Vec<String>, RouterError> {
		self.mount_procedure(Arc::new(gateway))
	}

	pub fn mount_procedure(
		&mut self,
		procedure: Arc<dyn Procedure>,
	) -> Result<Vec<String>, RouterError> {
		let subjects = Operation::iter()
			.map(|operation| (subject(&self.prefix, procedure.name(), operation), operation))
			.collect::<Vec<_>>();

		if subjects.iter().any(|(key, _)| self.routes.contains_key(key)) {
			return Err(RouterError::AlreadyMounted(procedure.name().to_string()));
		}

		for (key, operation) in &subjects {
			debug!(subject = %key, "Mounted route");
			self.routes.insert(
				key.clone(),
				Route {
					operation: *operation,
					procedure: Arc::clone(&procedure),
				},
			);
		}

		Ok(subjects.into_iter().map(|(key, _)| key).collect())
	}

	/// All mounted routing keys, sorted
	pub fn subjects(&self) -> Vec<&str> {
		let mut subjects = self.routes.keys().map(String::as_str).collect::<Vec<_>>();
		subjects.sort_unstable();
		subjects
	}

	/// Answer a message, or `None` when nothing is mounted under `subject`
	pub async fn dispatch(&self, subject: &str, payload: &[u8]) -> Option<Value> {
		let route = self.routes.get(subject)?;

		debug!(subject, operation = %route.operation, "Dispatching request");

		Some(route.procedure.call(route.operation, payload).await)
	}

	/// [`Router::dispatch`] with the reply already serialized
	pub async fn dispatch_bytes(&self, subject: &str, payload: &[u8]) -> Option<Vec<u8>> {
		let reply = self.dispatch(subject, payload).await?;

		Some(serde_json::to_vec(&reply).unwrap_or_else(|e| {
			ErrorDescriptor::classify(ErrorCode::Generic, e)
				.to_value()
				.to_string()
				.into_bytes()
		}))
	}
}
