//! Database infrastructure using SeaORM

use crate::{config::DatabaseConfig, gateway::entity::Storable};
use sea_orm::{
	ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection, DbErr, Schema,
};
use tracing::{debug, info};

pub mod engine;

pub use engine::{Engine, Page};

/// Database wrapper for the gateway
#[derive(Debug, Clone)]
pub struct Database {
	/// SeaORM database connection
	conn: DatabaseConnection,
}

impl Database {
	/// Connect using the configured URL and pool settings
	pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbErr> {
		let mut opt = ConnectOptions::new(config.url.clone());
		opt.connect_timeout(config.connect_timeout())
			.sqlx_logging(config.sqlx_logging); // We'll use tracing instead

		if config.is_in_memory() {
			// Every pooled connection would otherwise see its own empty database
			opt.max_connections(1).min_connections(1);
		} else {
			opt.max_connections(config.max_connections);
		}

		let conn = SeaDatabase::connect(opt).await?;

		info!("Connected to database at {}", config.url);

		Ok(Self { conn })
	}

	/// Create the entity's table from its definition unless it already exists
	pub async fn ensure_table<S: Storable>(&self, entity: &S) -> Result<(), DbErr> {
		let backend = self.conn.get_database_backend();
		let schema = Schema::new(backend);

		let mut statement = schema.create_table_from_entity(S::Table::default());
		statement.if_not_exists();

		self.conn.execute(backend.build(&statement)).await?;

		debug!(entity = entity.name(), "Table ready");

		Ok(())
	}

	/// Engine handle sharing this connection
	pub fn engine(&self) -> Engine {
		Engine::new(self.conn.clone())
	}

	/// Get the database connection
	pub fn conn(&self) -> &DatabaseConnection {
		&self.conn
	}
}
