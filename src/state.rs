//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::RedisClient;
use crate::config::environment::EnvironmentConfig;
use crate::realtime::{AlertRegistry, DispatchHub};
use crate::services::notification_service::{
    MockNotificationService, NotificationService, WebhookNotificationService,
};
use crate::services::routing_service::{
    MapboxDirectionsService, RouteProvider, UnconfiguredRouteProvider,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub redis: RedisClient,
    pub hub: DispatchHub,
    pub alerts: AlertRegistry,
    pub routing: Arc<dyn RouteProvider>,
    pub notifier: Arc<dyn NotificationService>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig, redis: RedisClient) -> Self {
        let hub = DispatchHub::new();
        let alerts = AlertRegistry::new(hub.clone(), Duration::from_secs(config.alert_interval_secs));

        let routing: Arc<dyn RouteProvider> = match &config.mapbox_token {
            Some(token) => Arc::new(MapboxDirectionsService::new(
                token.clone(),
                Some(redis.clone()),
                config.route_cache_ttl_secs,
            )),
            None => {
                tracing::warn!("⚠️ MAPBOX_TOKEN no configurado, las rutas no van a funcionar");
                Arc::new(UnconfiguredRouteProvider)
            }
        };

        let notifier: Arc<dyn NotificationService> = match &config.notify_webhook_url {
            Some(url) => Arc::new(WebhookNotificationService::new(url.clone())),
            None => {
                tracing::warn!("⚠️ NOTIFY_WEBHOOK_URL no configurado, usando notificador mock");
                Arc::new(MockNotificationService)
            }
        };

        Self {
            pool,
            config,
            redis,
            hub,
            alerts,
            routing,
            notifier,
        }
    }
}
