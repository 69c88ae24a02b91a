mod auth;
mod service;

use std::{net::SocketAddr, sync::Arc};

use abi::{reservation_service_server::ReservationServiceServer, Config, ServerConfig};
use anyhow::Result;
use reservation::{ReservationManager, Rsvp};
use sqlx::postgres::PgPoolOptions;
use tonic::transport::Server;
use tracing::info;

pub use auth::{
    authorize, identity_from_metadata, redact_foreign, Capability, USER_ID_HEADER, USER_ROLE_HEADER,
};

pub struct RsvpService {
    manager: Arc<dyn Rsvp>,
}

impl RsvpService {
    pub fn new(manager: impl Rsvp + 'static) -> Self {
        Self {
            manager: Arc::new(manager),
        }
    }
}

pub async fn start_server(config: &Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db.max_connections)
        .connect(&config.db.url())
        .await?;
    info!("connected to {}:{}/{}", config.db.host, config.db.port, config.db.dbname);
    serve(ReservationManager::new(pool), &config.server).await
}

pub async fn serve(manager: impl Rsvp + 'static, config: &ServerConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let svc = RsvpService::new(manager);

    info!("listening on {}", addr);
    Server::builder()
        .add_service(ReservationServiceServer::new(svc))
        .serve(addr)
        .await?;
    Ok(())
}
