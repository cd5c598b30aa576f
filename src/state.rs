//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::services::change_feed::ChangeFeed;
use crate::services::messaging_service::MessagingService;
use crate::services::routing_service::{OsrmRoutingClient, RoutingProvider};
use crate::services::storage_service::StorageService;
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub http_client: Client,
    pub change_feed: ChangeFeed,
    pub routing: Arc<dyn RoutingProvider>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Result<Self> {
        let routing = OsrmRoutingClient::new(
            config.routing_base_url.clone(),
            Duration::from_secs(config.routing_timeout_secs),
        )?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            pool,
            config,
            http_client,
            change_feed: ChangeFeed::new(),
            routing: Arc::new(routing),
        })
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::from(&self.config)
    }

    /// Cliente de mensajería, si MESSAGING_URL está configurado
    pub fn messaging(&self) -> Option<MessagingService> {
        self.config
            .messaging_url
            .as_ref()
            .map(|url| MessagingService::new(url.clone(), self.http_client.clone()))
    }

    /// Cliente de almacenamiento, si STORAGE_UPLOAD_URL está configurado
    pub fn storage(&self) -> Option<StorageService> {
        self.config
            .storage_upload_url
            .as_ref()
            .map(|url| StorageService::new(url.clone(), self.http_client.clone()))
    }
}
