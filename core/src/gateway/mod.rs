//! Storage gateway - generic CRUD, search and patch over any storable entity
//!
//! A [`StorageGateway`] is built once per entity type and holds only immutable
//! configuration: the entity capability, its declared named filters, a
//! validator and an engine handle. Every operation returns either its value
//! or an [`ErrorDescriptor`]; no other error shape escapes.

use crate::{
	config::{PatchConfig, SearchConfig},
	infra::db::{Engine, Page},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub mod entity;
pub mod envelope;
pub mod error;
pub mod scope;
pub mod validate;

pub use entity::{EntityKind, Scoped, Storable};
pub use envelope::{
	Create, Delete, FilterParams, Filters, Patch, Read, Search, Sort, SortDirection, Update,
};
pub use error::{ErrorCode, ErrorDescriptor};
pub use scope::{NamedFilter, QueryModifier, Scope};
pub use validate::{Constraint, Rule, Validator};

/// Per-gateway settings taken from the service configuration
#[derive(Debug, Clone, Default)]
pub struct GatewayOptions {
	pub search: SearchConfig,
	pub patch: PatchConfig,
}

pub struct StorageGateway<S: Storable> {
	entity: Arc<S>,
	scopes: Vec<NamedFilter>,
	validator: Validator,
	engine: Engine,
	options: GatewayOptions,
}

impl<S: Storable> StorageGateway<S> {
	pub fn new(entity: S, engine: Engine) -> Self {
		Self::with_options(entity, engine, GatewayOptions::default())
	}

	pub fn with_options(entity: S, engine: Engine, options: GatewayOptions) -> Self {
		let scopes = entity
			.as_scoped()
			.map(|scoped| scoped.scopes())
			.unwrap_or_default();
		let validator = Validator::for_entity(&entity);

		Self {
			entity: Arc::new(entity),
			scopes,
			validator,
			engine,
			options,
		}
	}

	pub fn entity(&self) -> &S {
		&self.entity
	}

	pub fn name(&self) -> &str {
		self.entity.name()
	}

	/// Named filters the entity declared, in declaration order
	pub fn scopes(&self) -> &[NamedFilter] {
		&self.scopes
	}

	pub async fn create(&self, request: Create) -> Result<S::Model, ErrorDescriptor> {
		let entity = self.entity.name();
		debug!(entity, "Creating entity");

		let model = self.decode(request.entity)?;

		self.engine.insert::<S>(model).await.map_err(|e| {
			error!(entity, error = %e, "Creating entity failed");
			ErrorDescriptor::from(e)
		})
	}

	pub async fn read(&self, request: Read) -> Result<S::Model, ErrorDescriptor> {
		let entity = self.entity.name();
		debug!(entity, id = %request.id, "Reading entity");

		let scope = self.resolve(&request.filters);

		self.engine
			.fetch::<S>(&request.id, &scope)
			.await
			.map_err(|e| {
				error!(entity, id = %request.id, error = %e, "Reading entity failed");
				ErrorDescriptor::from(e)
			})
	}

	pub async fn update(&self, request: Update) -> Result<S::Model, ErrorDescriptor> {
		let entity = self.entity.name();
		debug!(entity, id = %request.id, "Updating entity");

		let model = self.decode(request.entity)?;
		let scope = self.resolve(&request.filters);

		self.engine
			.save::<S>(model, &request.id, &scope)
			.await
			.map_err(|e| {
				error!(entity, id = %request.id, error = %e, "Updating entity failed");
				ErrorDescriptor::from(e)
			})
	}

	pub async fn delete(&self, request: Delete) -> Result<(), ErrorDescriptor> {
		let entity = self.entity.name();
		debug!(entity, id = %request.id, "Deleting entity");

		let scope = self.resolve(&request.filters);

		let deleted = self
			.engine
			.delete::<S>(&request.id, &scope)
			.await
			.map_err(|e| {
				error!(entity, id = %request.id, error = %e, "Deleting entity failed");
				ErrorDescriptor::from(e)
			})?;

		debug!(entity, id = %request.id, deleted, "Deleted entity");

		Ok(())
	}

	pub async fn search(&self, request: Search) -> Result<Vec<S::Model>, ErrorDescriptor> {
		let entity = self.entity.name();
		debug!(
			entity,
			skip = request.skip,
			take = request.take,
			"Searching entities"
		);

		if !request.preload.is_empty() {
			warn!(entity, preload = ?request.preload, "Rejecting preload directives");
			return Err(ErrorDescriptor::json(format!(
				"preload is not supported (requested {}); use a named filter instead",
				request.preload.join(", ")
			)));
		}

		let page = Page {
			skip: request.skip,
			take: self.options.search.page_size(request.take),
		};
		let scope = self.resolve(&request.filters);

		let mut results = self.entity.create_array();
		let rows = self
			.engine
			.find::<S>(page, &request.conditions, &request.sort, &scope)
			.await
			.map_err(|e| {
				error!(entity, error = %e, "Searching entities failed");
				ErrorDescriptor::from(e)
			})?;
		results.extend(rows);

		Ok(results)
	}

	/// Partial update followed by a re-read of the row.
	///
	/// Unless `patch.scoped_update` is set, the request's filters narrow only
	/// the re-read, so a row outside the filters is still changed.
	pub async fn patch(&self, request: Patch) -> Result<S::Model, ErrorDescriptor> {
		let entity = self.entity.name();
		debug!(entity, id = %request.id, fields = request.data.len(), "Patching entity");

		let scope = self.resolve(&request.filters);
		let update_scope = if self.options.patch.scoped_update {
			scope.clone()
		} else {
			Scope::default()
		};

		let changed = self
			.engine
			.patch::<S>(&request.id, &request.data, &update_scope)
			.await
			.map_err(|e| {
				error!(entity, id = %request.id, error = %e, "Patching entity failed");
				ErrorDescriptor::from(e)
			})?;

		debug!(entity, id = %request.id, changed, "Patched entity");

		self.engine
			.fetch::<S>(&request.id, &scope)
			.await
			.map_err(|e| {
				error!(entity, id = %request.id, error = %e, "Reading patched entity failed");
				ErrorDescriptor::from(e)
			})
	}

	/// Overlay the payload on a blank instance, decode, then validate.
	///
	/// Fields missing from the payload keep their blank value, so they are
	/// reported by validation rather than by the decoder.
	fn decode(&self, payload: Value) -> Result<S::Model, ErrorDescriptor> {
		let entity = self.entity.name();

		let model = overlay(serde_json::to_value(self.entity.create())?, payload)
			.and_then(|merged| serde_json::from_value::<S::Model>(merged).map_err(Into::into))
			.map_err(|e| {
				warn!(entity, error = %e, "Decoding entity failed");
				e
			})?;

		self.validator.validate(&model).map_err(|e| {
			warn!(entity, error = %e, "Entity failed validation");
			e
		})?;

		Ok(model)
	}

	fn resolve(&self, filters: &Filters) -> Scope {
		Scope::resolve(filters, &self.scopes)
	}
}

fn overlay(blank: Value, payload: Value) -> Result<Value, ErrorDescriptor> {
	match (blank, payload) {
		(Value::Object(mut fields), Value::Object(given)) => {
			fields.extend(given);
			Ok(Value::Object(fields))
		}
		(_, Value::Object(given)) => Ok(Value::Object(given)),
		(_, other) => Err(ErrorDescriptor::json(format!(
			"expected an entity object, found {}",
			json_kind(&other)
		))),
	}
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}
