//! Service wiring: config, table bootstrap and route registration

mod helpers;

use helpers::*;
use qs_core::{Service, ServiceConfig, ServiceError};
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn register_creates_tables_and_routes() {
	let mut service = Service::new(ServiceConfig::default()).await.unwrap();

	let subjects = service.register(People).await.unwrap();
	assert_eq!(subjects.len(), 6);
	assert!(subjects.contains(&"quickapi.person.search".to_string()));

	let reply = service
		.router()
		.dispatch(
			"quickapi.person.create",
			br#"{"entity":{"full_name":"Test Testsson","age":42}}"#,
		)
		.await
		.unwrap();
	assert_eq!(reply["age"], 42);
}

#[tokio::test]
async fn registering_twice_is_rejected() {
	let mut service = Service::new(ServiceConfig::default()).await.unwrap();
	service.register(People).await.unwrap();

	let err = service.register(People).await.unwrap_err();

	assert!(matches!(err, ServiceError::Router(_)));
}

#[tokio::test]
async fn file_config_sets_prefix_and_database() {
	let dir = TempDir::new().unwrap();
	let config_path = dir.path().join("quickstore.toml");
	let db_path = dir.path().join("quickstore.db");
	std::fs::write(
		&config_path,
		format!(
			"prefix = \"crm\"\n\n[database]\nurl = \"sqlite://{}?mode=rwc\"\n",
			db_path.display()
		),
	)
	.unwrap();

	let mut service = Service::from_file(&config_path).await.unwrap();
	service.register(Notes).await.unwrap();

	let payload = serde_json::to_vec(&json!({ "entity": { "title": "a", "body": "b" } })).unwrap();
	let created = service
		.router()
		.dispatch("crm.note.create", &payload)
		.await
		.unwrap();
	assert_eq!(created["title"], "a");

	let found = service
		.router()
		.dispatch("crm.note.search", b"{}")
		.await
		.unwrap();
	assert_eq!(found.as_array().map(Vec::len), Some(1));
	assert!(db_path.exists());

	assert!(service
		.router()
		.dispatch("quickapi.note.search", b"{}")
		.await
		.is_none());
}

#[tokio::test]
async fn missing_config_file_is_a_config_error() {
	let err = Service::from_file("/nonexistent/quickstore.toml")
		.await
		.err()
		.unwrap();

	assert!(matches!(err, ServiceError::Config(_)));
}
