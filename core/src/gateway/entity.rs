//! Capability contract for storable entity types

use super::{scope::NamedFilter, validate::Constraint};
use sea_orm::{
	ActiveModelBehavior, ActiveModelTrait, EntityTrait, FromQueryResult, IntoActiveModel,
	ModelTrait,
};
use serde::{de::DeserializeOwned, Serialize};
use strum::{Display, EnumString};

/// Reserved classification of an entity type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
	#[default]
	Normal,
}

/// A type the gateway can store without entity-specific code.
///
/// Implemented once per domain type, usually on a unit struct next to the
/// sea-orm entity definition. `Table`, `Model` and `ActiveModel` are the
/// sea-orm types generated by `DeriveEntityModel`.
pub trait Storable: Send + Sync + 'static {
	type Table: EntityTrait<Model = Self::Model, ActiveModel = Self::ActiveModel> + Send + Sync;
	type Model: ModelTrait<Entity = Self::Table>
		+ FromQueryResult
		+ IntoActiveModel<Self::ActiveModel>
		+ Serialize
		+ DeserializeOwned
		+ Default
		+ Clone
		+ Send
		+ Sync
		+ 'static;
	type ActiveModel: ActiveModelTrait<Entity = Self::Table>
		+ ActiveModelBehavior
		+ Send
		+ Sync
		+ 'static;

	/// Stable logical name, also the middle segment of routing keys
	fn name(&self) -> &str;

	fn kind(&self) -> EntityKind {
		EntityKind::Normal
	}

	/// Blank instance used as the decode target
	fn create(&self) -> Self::Model {
		Self::Model::default()
	}

	/// Empty collection used as the search result target
	fn create_array(&self) -> Vec<Self::Model> {
		Vec::new()
	}

	/// Structural constraints checked on create and update
	fn constraints(&self) -> Vec<Constraint> {
		Vec::new()
	}

	/// Named filter capability, absent unless the type declares filters
	fn as_scoped(&self) -> Option<&dyn Scoped> {
		None
	}
}

/// Optional capability: the entity type declares named filters.
pub trait Scoped: Send + Sync {
	fn scopes(&self) -> Vec<NamedFilter>;
}
