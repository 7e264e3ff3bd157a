//! Test entities and gateway fixtures shared by the integration tests

#![allow(dead_code)]

pub mod entities;

pub use entities::*;

use qs_core::{
	config::DatabaseConfig,
	gateway::{Create, GatewayOptions, StorageGateway, Storable},
	infra::db::Database,
};
use serde_json::json;

/// Fresh in-memory database with the entity's table created
pub async fn database_for<S: Storable>(entity: &S) -> Database {
	let db = Database::connect(&DatabaseConfig::default()).await.unwrap();
	db.ensure_table(entity).await.unwrap();
	db
}

pub async fn people() -> StorageGateway<People> {
	people_with(GatewayOptions::default()).await
}

pub async fn people_with(options: GatewayOptions) -> StorageGateway<People> {
	let db = database_for(&People).await;
	StorageGateway::with_options(People, db.engine(), options)
}

pub async fn notes() -> StorageGateway<Notes> {
	let db = database_for(&Notes).await;
	StorageGateway::new(Notes, db.engine())
}

pub async fn tags() -> StorageGateway<Tags> {
	let db = database_for(&Tags).await;
	StorageGateway::new(Tags, db.engine())
}

/// Owner and pet gateways sharing one database
pub async fn owners_and_pets() -> (StorageGateway<Owners>, StorageGateway<Pets>) {
	let db = database_for(&Owners).await;
	db.ensure_table(&Pets).await.unwrap();

	(
		StorageGateway::new(Owners, db.engine()),
		StorageGateway::new(Pets, db.engine()),
	)
}

/// Insert a person and return the stored row
pub async fn add_person(
	gateway: &StorageGateway<People>,
	full_name: &str,
	age: i32,
) -> person::Model {
	gateway
		.create(Create {
			entity: json!({ "full_name": full_name, "age": age }),
		})
		.await
		.unwrap()
}
