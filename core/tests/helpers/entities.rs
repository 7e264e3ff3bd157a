//! sea-orm entities used as storable test types

use qs_core::gateway::{Constraint, NamedFilter, QueryModifier, Scoped, Storable};
use sea_orm::ColumnTrait;

pub mod person {
	use sea_orm::entity::prelude::*;
	use serde::{Deserialize, Serialize};

	#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
	#[sea_orm(table_name = "people")]
	pub struct Model {
		#[sea_orm(primary_key)]
		pub id: i32,
		pub full_name: String,
		pub age: i32,
	}

	#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
	pub enum Relation {}

	impl ActiveModelBehavior for ActiveModel {}
}

pub mod note {
	use sea_orm::entity::prelude::*;
	use serde::{Deserialize, Serialize};

	#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
	#[sea_orm(table_name = "notes")]
	pub struct Model {
		#[sea_orm(primary_key)]
		pub id: i32,
		pub title: String,
		pub body: String,
	}

	#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
	pub enum Relation {}

	impl ActiveModelBehavior for ActiveModel {}
}

pub mod tag {
	use sea_orm::entity::prelude::*;
	use serde::{Deserialize, Serialize};

	#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
	#[sea_orm(table_name = "tags")]
	pub struct Model {
		#[sea_orm(primary_key)]
		pub id: i32,
		#[sea_orm(column_type = "String(StringLen::N(4))")]
		pub label: String,
	}

	#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
	pub enum Relation {}

	impl ActiveModelBehavior for ActiveModel {}
}

pub mod owner {
	use sea_orm::entity::prelude::*;
	use serde::{Deserialize, Serialize};

	#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
	#[sea_orm(table_name = "owners")]
	pub struct Model {
		#[sea_orm(primary_key)]
		pub id: i32,
		pub name: String,
	}

	#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
	pub enum Relation {
		#[sea_orm(has_many = "super::pet::Entity")]
		Pet,
	}

	impl Related<super::pet::Entity> for Entity {
		fn to() -> RelationDef {
			Relation::Pet.def()
		}
	}

	impl ActiveModelBehavior for ActiveModel {}
}

pub mod pet {
	use sea_orm::entity::prelude::*;
	use serde::{Deserialize, Serialize};

	#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
	#[sea_orm(table_name = "pets")]
	pub struct Model {
		#[sea_orm(primary_key)]
		pub id: i32,
		pub name: String,
		pub owner_id: i32,
	}

	#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
	pub enum Relation {
		#[sea_orm(
			belongs_to = "super::owner::Entity",
			from = "Column::OwnerId",
			to = "super::owner::Column::Id",
			on_delete = "Cascade"
		)]
		Owner,
	}

	impl Related<super::owner::Entity> for Entity {
		fn to() -> RelationDef {
			Relation::Owner.def()
		}
	}

	impl ActiveModelBehavior for ActiveModel {}
}

/// Person records, with a `min` filter on age and an `owned_by` filter
pub struct People;

impl Storable for People {
	type Table = person::Entity;
	type Model = person::Model;
	type ActiveModel = person::ActiveModel;

	fn name(&self) -> &str {
		"person"
	}

	fn constraints(&self) -> Vec<Constraint> {
		vec![
			Constraint::required("full_name"),
			Constraint::max_len("full_name", 32),
			Constraint::min("age", 0),
			Constraint::required("age"),
		]
	}

	fn as_scoped(&self) -> Option<&dyn Scoped> {
		Some(self)
	}
}

impl Scoped for People {
	fn scopes(&self) -> Vec<NamedFilter> {
		vec![
			NamedFilter::new("min", |params| {
				match params.get("age").and_then(|age| age.parse::<i32>().ok()) {
					Some(age) => QueryModifier::filter(person::Column::Age.gt(age)),
					None => QueryModifier::identity(),
				}
			}),
			NamedFilter::new("named", |params| match params.get("prefix") {
				Some(prefix) => {
					QueryModifier::filter(person::Column::FullName.starts_with(prefix.as_str()))
				}
				None => QueryModifier::identity(),
			}),
		]
	}
}

/// Notes declare no filters and no constraints
pub struct Notes;

impl Storable for Notes {
	type Table = note::Entity;
	type Model = note::Model;
	type ActiveModel = note::ActiveModel;

	fn name(&self) -> &str {
		"note"
	}
}

/// Tags rely on the column definition alone to bound `label`
pub struct Tags;

impl Storable for Tags {
	type Table = tag::Entity;
	type Model = tag::Model;
	type ActiveModel = tag::ActiveModel;

	fn name(&self) -> &str {
		"tag"
	}
}

/// Owners own pets; deleting an owner deletes its pets
pub struct Owners;

impl Storable for Owners {
	type Table = owner::Entity;
	type Model = owner::Model;
	type ActiveModel = owner::ActiveModel;

	fn name(&self) -> &str {
		"owner"
	}
}

pub struct Pets;

impl Storable for Pets {
	type Table = pet::Entity;
	type Model = pet::Model;
	type ActiveModel = pet::ActiveModel;

	fn name(&self) -> &str {
		"pet"
	}
}
