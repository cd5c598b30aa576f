//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;

const DEV_JWT_SECRET: &str = "field-dispatch-dev-secret-change-in-production";

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub log_level: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    // Servicio de rutas (OSRM)
    pub routing_base_url: String,
    pub routing_timeout_secs: u64,
    pub route_fallback_nearest: usize,
    // Proveedores externos opcionales
    pub messaging_url: Option<String>,
    pub storage_upload_url: Option<String>,
    pub max_upload_bytes: usize,
    // Facturación
    pub invoice_tax_rate: Decimal,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            log_level: "info".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expiration: 86_400,
            cors_origins: vec!["*".to_string()],
            routing_base_url: "https://router.project-osrm.org".to_string(),
            routing_timeout_secs: 10,
            route_fallback_nearest: 3,
            messaging_url: None,
            storage_upload_url: None,
            max_upload_bytes: 5 * 1024 * 1024,
            invoice_tax_rate: Decimal::new(18, 0),
        }
    }
}

/// Leer una variable opcional y parsearla, reportando el nombre si es inválida
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("{} tiene un valor inválido '{}': {}", name, raw, e)),
        _ => Ok(None),
    }
}

fn string_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl EnvironmentConfig {
    /// Cargar configuración desde variables de entorno, con valores por defecto
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let environment = string_var("ENVIRONMENT").unwrap_or(defaults.environment);

        let jwt_secret = match string_var("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == "production" => {
                return Err(anyhow!("JWT_SECRET must be set in production"));
            }
            None => {
                log::warn!("⚠️ JWT_SECRET no configurado, usando secreto de desarrollo");
                defaults.jwt_secret
            }
        };

        let cors_origins = string_var("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        let config = Self {
            environment,
            port: parse_var("PORT")?.unwrap_or(defaults.port),
            host: string_var("HOST").unwrap_or(defaults.host),
            log_level: string_var("LOG_LEVEL").unwrap_or(defaults.log_level),
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION")?.unwrap_or(defaults.jwt_expiration),
            cors_origins,
            routing_base_url: string_var("ROUTING_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.routing_base_url),
            routing_timeout_secs: parse_var("ROUTING_TIMEOUT_SECS")?
                .unwrap_or(defaults.routing_timeout_secs),
            route_fallback_nearest: parse_var("ROUTE_FALLBACK_NEAREST")?
                .unwrap_or(defaults.route_fallback_nearest),
            messaging_url: string_var("MESSAGING_URL"),
            storage_upload_url: string_var("STORAGE_UPLOAD_URL"),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES")?.unwrap_or(defaults.max_upload_bytes),
            invoice_tax_rate: parse_var::<Decimal>("INVOICE_TAX_RATE")?
                .unwrap_or(defaults.invoice_tax_rate),
        };

        if config.invoice_tax_rate.is_sign_negative() {
            return Err(anyhow!("INVOICE_TAX_RATE must not be negative"));
        }

        Ok(config)
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Nivel de log para tracing-subscriber
    pub fn tracing_level(&self) -> Result<tracing::Level> {
        tracing::Level::from_str(&self.log_level)
            .with_context(|| format!("LOG_LEVEL inválido: {}", self.log_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EnvironmentConfig::default();
        assert_eq!(config.environment, "development");
        assert_eq!(config.routing_timeout_secs, 10);
        assert_eq!(config.route_fallback_nearest, 3);
        assert_eq!(config.invoice_tax_rate, Decimal::new(18, 0));
        assert_eq!(config.server_url(), "0.0.0.0:3000");
    }

    #[test]
    fn test_tracing_level() {
        let mut config = EnvironmentConfig::default();
        assert_eq!(config.tracing_level().unwrap(), tracing::Level::INFO);
        config.log_level = "debug".to_string();
        assert_eq!(config.tracing_level().unwrap(), tracing::Level::DEBUG);
        config.log_level = "loud".to_string();
        assert!(config.tracing_level().is_err());
    }
}
