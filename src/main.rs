use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use taxi_dispatch::cache::{CacheConfig, RedisClient};
use taxi_dispatch::config::environment::EnvironmentConfig;
use taxi_dispatch::database::connection::create_pool;
use taxi_dispatch::middleware::cors::{cors_middleware, cors_middleware_with_origins};
use taxi_dispatch::realtime::ws;
use taxi_dispatch::routes;
use taxi_dispatch::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚕 Taxi Dispatch - Backend de despacho local");
    info!("============================================");

    let config = EnvironmentConfig::default();

    // Inicializar base de datos
    let pool = match create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    // Inicializar Redis
    let redis_client = match RedisClient::new(CacheConfig::default()).await {
        Ok(client) => {
            info!("✅ Redis conectado exitosamente");
            client
        }
        Err(e) => {
            error!("❌ Error conectando a Redis: {}", e);
            return Err(anyhow::anyhow!("Error de Redis: {}", e));
        }
    };

    let cors = if config.cors_origins.is_empty() {
        cors_middleware()
    } else {
        cors_middleware_with_origins(config.cors_origins.clone())
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app_state = AppState::new(pool, config, redis_client);

    let app = Router::new()
        .route("/health", get(health_endpoint))
        .nest("/api/rides", routes::ride_routes::create_ride_router())
        .nest("/api/drivers", routes::driver_routes::create_driver_router())
        .nest("/api/geocoding", routes::geocoding_routes::create_geocoding_router())
        .route("/ws/driver/:driver_id", get(ws::driver_channel_handler))
        .route("/ws/rides/:ride_id", get(ws::ride_channel_handler))
        .layer(cors)
        .with_state(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🚕 Endpoints - Rides:");
    info!("   POST /api/rides/quote - Cotizar un viaje");
    info!("   POST /api/rides - Crear solicitud de viaje");
    info!("   GET  /api/rides/:id - Obtener solicitud");
    info!("   POST /api/rides/:id/accept - Chofer acepta");
    info!("   POST /api/rides/:id/reject - Chofer rechaza");
    info!("   POST /api/rides/:id/complete - Chofer completa");
    info!("   POST /api/rides/:id/cancel - Pasajero cancela");
    info!("   POST /api/rides/:id/mute-alert - Silenciar alerta");
    info!("   GET  /api/rides/passenger/:passenger_id/active - Solicitud activa");
    info!("   GET  /api/rides/passenger/:passenger_id/history - Historial pasajero");
    info!("   GET  /api/rides/driver/:driver_id/history - Historial chofer");
    info!("🚗 Endpoints - Drivers:");
    info!("   POST /api/drivers - Registrar chofer");
    info!("   GET  /api/drivers/:id - Obtener chofer");
    info!("   PUT  /api/drivers/:id/availability - Cambiar disponibilidad");
    info!("🗺️ Endpoints - Geocoding:");
    info!("   GET  /api/geocoding/forward?q= - Buscar dirección");
    info!("   GET  /api/geocoding/reverse?lat=&lng= - Resolver coordenada");
    info!("📡 Canales WebSocket:");
    info!("   GET  /ws/driver/:driver_id - Ofertas y alertas del chofer");
    info!("   GET  /ws/rides/:ride_id?role= - Canal del viaje (posición y estado)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Health check simple
async fn health_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "taxi_dispatch",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
