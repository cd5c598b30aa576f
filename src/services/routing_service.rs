//! Cliente del servicio de rutas de conducción (API compatible con OSRM)
//!
//! Una petición por par origen/destino, con timeout acotado y sin reintentos.
//! Cualquier fallo se reporta como "sin ruta" para que el llamador dibuje
//! la línea recta de respaldo.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::location::Coordinates;

/// Ruta por carretera devuelta por el proveedor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadRoute {
    /// Pares `[lon, lat]` tal como los entrega el servicio
    pub coordinates: Vec<[f64; 2]>,
    pub distance_m: f64,
    pub duration_s: f64,
}

/// Proveedor de rutas. `None` significa "sin ruta" (timeout, error HTTP,
/// `code != "Ok"` o lista de rutas vacía).
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn driving_route(&self, from: Coordinates, to: Coordinates) -> Option<RoadRoute>;
}

#[derive(Debug, Deserialize)]
struct RouteEnvelope {
    code: String,
    #[serde(default)]
    routes: Vec<EnvelopeRoute>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeRoute {
    geometry: EnvelopeGeometry,
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct EnvelopeGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Interpretar el JSON del servicio de rutas
pub fn parse_route_envelope(body: &str) -> Result<Option<RoadRoute>> {
    let envelope: RouteEnvelope =
        serde_json::from_str(body).map_err(|e| anyhow!("Error parsing routing response: {}", e))?;

    if envelope.code != "Ok" {
        log::warn!("⚠️ Servicio de rutas respondió code={}", envelope.code);
        return Ok(None);
    }

    Ok(envelope.routes.into_iter().next().map(|route| RoadRoute {
        coordinates: route.geometry.coordinates,
        distance_m: route.distance,
        duration_s: route.duration,
    }))
}

pub struct OsrmRoutingClient {
    base_url: String,
    client: Client,
}

impl OsrmRoutingClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn route_url(&self, from: Coordinates, to: Coordinates) -> String {
        format!(
            "{}/route/v1/driving/{};{}?overview=full&geometries=geojson",
            self.base_url,
            from.to_lon_lat(),
            to.to_lon_lat()
        )
    }

    async fn fetch_route(&self, from: Coordinates, to: Coordinates) -> Result<Option<RoadRoute>> {
        let url = self.route_url(from, to);
        log::debug!("🌐 Solicitando ruta: {}", url);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "FieldDispatch/1.0")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Routing service error {}", status));
        }

        let body = response.text().await?;
        parse_route_envelope(&body)
    }
}

#[async_trait]
impl RoutingProvider for OsrmRoutingClient {
    async fn driving_route(&self, from: Coordinates, to: Coordinates) -> Option<RoadRoute> {
        match self.fetch_route(from, to).await {
            Ok(route) => route,
            Err(e) => {
                log::warn!("⚠️ Sin ruta por carretera, se usará línea recta: {}", e);
                None
            }
        }
    }
}
