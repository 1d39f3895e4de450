//! Configuración del cache Redis

/// Configuración de conexión y TTL del cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub redis_url: String,
    /// TTL por defecto en segundos
    pub default_ttl: u64,
    pub max_connections: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            default_ttl: 300,
            max_connections: 10,
        }
    }
}
