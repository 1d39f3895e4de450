//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    /// Token de Mapbox para rutas y geocoding; sin él esos endpoints fallan
    pub mapbox_token: Option<String>,
    /// Webhook del canal de notificaciones salientes (función serverless)
    pub notify_webhook_url: Option<String>,
    /// Intervalo en segundos entre repeticiones de la alerta de oferta
    pub alert_interval_secs: u64,
    /// TTL en segundos del cache de cotizaciones de ruta
    pub route_cache_ttl_secs: u64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
                .collect(),
            mapbox_token: env::var("MAPBOX_TOKEN").ok(),
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL").ok(),
            alert_interval_secs: env::var("ALERT_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("ALERT_INTERVAL_SECS must be a valid number"),
            route_cache_ttl_secs: env::var("ROUTE_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("ROUTE_CACHE_TTL_SECS must be a valid number"),
        }
    }
}

impl EnvironmentConfig {
    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
