//! Alerta repetitiva de oferta
//!
//! Mientras una solicitud siga pendiente, la oferta se re-publica en el
//! canal del chofer en un loop indefinido. El loop es una tarea tokio con
//! handle explícito de start/stop: se detiene al aceptar, al rechazar o al
//! silenciarla manualmente (mute no cambia el estado de la solicitud, solo
//! apaga la repetición).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::events::RideEvent;
use super::hub::DispatchHub;
use crate::models::ride_request::RideRequest;

#[derive(Clone)]
pub struct AlertRegistry {
    hub: DispatchHub,
    interval: Duration,
    handles: Arc<RwLock<HashMap<Uuid, JoinHandle<()>>>>,
}

impl AlertRegistry {
    pub fn new(hub: DispatchHub, interval: Duration) -> Self {
        Self {
            hub,
            interval,
            handles: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Arrancar el loop de oferta para una solicitud pendiente.
    /// Si ya había un loop para la misma solicitud, se reemplaza.
    pub async fn start_offer_loop(&self, ride: RideRequest) {
        let ride_id = ride.id;
        let driver_id = ride.driver_id;
        let hub = self.hub.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            loop {
                let delivered = hub
                    .publish_to_driver(driver_id, RideEvent::Offer { ride: ride.clone() })
                    .await;
                tracing::debug!(
                    "🔔 Oferta {} repetida al chofer {} ({} receptores)",
                    ride_id,
                    driver_id,
                    delivered
                );
                tokio::time::sleep(interval).await;
            }
        });

        let mut handles = self.handles.write().await;
        if let Some(previous) = handles.insert(ride_id, handle) {
            previous.abort();
        }
    }

    /// Detener el loop (accept, reject o mute manual)
    pub async fn stop(&self, ride_id: Uuid) -> bool {
        let mut handles = self.handles.write().await;
        match handles.remove(&ride_id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cuántos loops siguen activos
    pub async fn active_count(&self) -> usize {
        self.handles.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn ride_for(driver_id: Uuid) -> RideRequest {
        RideRequest {
            id: Uuid::new_v4(),
            passenger_id: Uuid::new_v4(),
            driver_id,
            pickup_lat: 29.0729,
            pickup_lng: -110.9559,
            destination_lat: 29.0892,
            destination_lng: -110.9613,
            pickup_address: None,
            destination_address: None,
            distance_km: 2.35,
            duration_min: 7.0,
            tarifa_km: Decimal::from_str("15").unwrap(),
            total_fare: Decimal::from_str("35.25").unwrap(),
            status: crate::models::ride_request::RideStatus::Pending,
            created_at: Utc::now(),
            accepted_at: None,
            completed_at: None,
            cancelled_at: None,
        }
    }

    #[tokio::test]
    async fn test_la_oferta_se_repite_hasta_detenerla() {
        let hub = DispatchHub::new();
        let registry = AlertRegistry::new(hub.clone(), Duration::from_millis(10));
        let driver_id = Uuid::new_v4();
        let ride = ride_for(driver_id);
        let ride_id = ride.id;

        let mut rx = hub.subscribe_driver(driver_id).await;
        registry.start_offer_loop(ride).await;

        // Debe llegar más de una repetición
        for _ in 0..3 {
            let event = tokio::time::timeout(Duration::from_millis(200), rx.recv())
                .await
                .expect("la oferta no llegó a tiempo")
                .unwrap();
            assert!(matches!(event, RideEvent::Offer { .. }));
        }

        assert!(registry.stop(ride_id).await);
        assert_eq!(registry.active_count().await, 0);

        // Tras detener, drenamos lo pendiente y ya no llegan más
        tokio::time::sleep(Duration::from_millis(50)).await;
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stop_sin_loop_devuelve_false() {
        let registry = AlertRegistry::new(DispatchHub::new(), Duration::from_millis(10));
        assert!(!registry.stop(Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_reemplaza_el_loop_anterior_de_la_misma_solicitud() {
        let hub = DispatchHub::new();
        let registry = AlertRegistry::new(hub.clone(), Duration::from_millis(10));
        let driver_id = Uuid::new_v4();
        let ride = ride_for(driver_id);

        registry.start_offer_loop(ride.clone()).await;
        registry.start_offer_loop(ride).await;

        assert_eq!(registry.active_count().await, 1);
    }
}
