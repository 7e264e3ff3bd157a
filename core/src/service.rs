//! Process wiring - database, registered gateways and the RPC server

use crate::{
	config::{ConfigError, ServiceConfig},
	gateway::{GatewayOptions, StorageGateway, Storable},
	infra::{
		db::Database,
		rpc::{Router, RouterError, RpcServer},
	},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ServiceError {
	#[error("database error: {0}")]
	Database(#[from] sea_orm::DbErr),

	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("routing error: {0}")]
	Router(#[from] RouterError),

	#[error("transport error: {0}")]
	Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// A running persistence gateway: one database, any number of entities.
pub struct Service {
	config: ServiceConfig,
	database: Database,
	router: Router,
}

impl Service {
	pub async fn new(config: ServiceConfig) -> Result<Self> {
		let database = Database::connect(&config.database).await?;
		let router = Router::new(config.prefix.clone());

		Ok(Self {
			config,
			database,
			router,
		})
	}

	/// Load the config file, then connect
	pub async fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
		Self::new(ServiceConfig::load(path)?).await
	}

	/// Make an entity type reachable under its six routing keys.
	///
	/// Creates the backing table when it does not exist yet.
	pub async fn register<S: Storable>(&mut self, entity: S) -> Result<Vec<String>> {
		self.database.ensure_table(&entity).await?;

		let options = GatewayOptions {
			search: self.config.search.clone(),
			patch: self.config.patch.clone(),
		};
		let name = entity.name().to_string();
		let gateway = StorageGateway::with_options(entity, self.database.engine(), options);
		let subjects = self.router.mount(gateway)?;

		info!(entity = %name, routes = subjects.len(), "Registered entity");

		Ok(subjects)
	}

	pub fn config(&self) -> &ServiceConfig {
		&self.config
	}

	pub fn database(&self) -> &Database {
		&self.database
	}

	pub fn router(&self) -> &Router {
		&self.router
	}

	/// Split into the server, ready to start, without waiting on signals
	pub fn into_server(self) -> RpcServer {
		RpcServer::new(
			self.config.rpc.socket_path.clone(),
			Arc::new(self.router),
			self.config.rpc.max_connections,
		)
		.with_max_frame_bytes(self.config.rpc.max_frame_bytes)
	}

	/// Serve requests until ctrl-c
	pub async fn serve(self) -> Result<()> {
		let mut server = self.into_server();
		let shutdown = server.shutdown_handle();

		tokio::spawn(async move {
			if let Err(e) = tokio::signal::ctrl_c().await {
				warn!(error = %e, "Listening for ctrl-c failed");
				return;
			}
			info!("Interrupt received");
			shutdown.shutdown().await;
		});

		server.start().await?;

		info!("Service stopped");

		Ok(())
	}
}
