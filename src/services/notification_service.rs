//! Canal de notificaciones salientes
//!
//! Aviso out-of-band al pasajero (función serverless estilo WhatsApp/SMS).
//! Es best-effort: un fallo se loguea y nunca revierte la transacción que
//! lo disparó.

use async_trait::async_trait;
use serde_json::json;

use crate::models::ride_request::RideRequest;
use crate::utils::errors::AppError;

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Avisar al pasajero que su solicitud fue aceptada
    async fn notify_ride_accepted(&self, ride: &RideRequest) -> Result<(), AppError>;

    /// Avisar al pasajero que su viaje terminó
    async fn notify_ride_completed(&self, ride: &RideRequest) -> Result<(), AppError>;
}

/// Implementación real: POST al webhook de la función serverless
pub struct WebhookNotificationService {
    webhook_url: String,
    client: reqwest::Client,
}

impl WebhookNotificationService {
    pub fn new(webhook_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            webhook_url,
            client,
        }
    }

    async fn post_event(&self, event_type: &str, ride: &RideRequest) -> Result<(), AppError> {
        let payload = json!({
            "type": event_type,
            "ride_id": ride.id,
            "passenger_id": ride.passenger_id,
            "driver_id": ride.driver_id,
            "total_fare": ride.total_fare,
            "pickup_address": ride.pickup_address,
            "destination_address": ride.destination_address,
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Notification request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Notification webhook returned {}",
                response.status()
            )));
        }

        tracing::debug!("📨 Notificación '{}' enviada para viaje {}", event_type, ride.id);
        Ok(())
    }
}

#[async_trait]
impl NotificationService for WebhookNotificationService {
    async fn notify_ride_accepted(&self, ride: &RideRequest) -> Result<(), AppError> {
        self.post_event("ride_accepted", ride).await
    }

    async fn notify_ride_completed(&self, ride: &RideRequest) -> Result<(), AppError> {
        self.post_event("ride_completed", ride).await
    }
}

/// Mock para desarrollo y tests
#[derive(Debug)]
pub struct MockNotificationService;

#[async_trait]
impl NotificationService for MockNotificationService {
    async fn notify_ride_accepted(&self, ride: &RideRequest) -> Result<(), AppError> {
        tracing::info!("[MOCK] Aviso de aceptación para viaje {}", ride.id);
        Ok(())
    }

    async fn notify_ride_completed(&self, ride: &RideRequest) -> Result<(), AppError> {
        tracing::info!("[MOCK] Aviso de viaje completado {}", ride.id);
        Ok(())
    }
}
