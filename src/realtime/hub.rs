//! Hub de despacho realtime
//!
//! Mantiene un canal broadcast por chofer (ofertas de viaje filtradas a
//! driver_id = self) y uno por viaje (eventos de estado y posiciones).
//! Los eventos se entregan en el orden en que se publican; un suscriptor
//! lento puede perder eventos (broadcast con capacidad fija) y el flujo
//! degrada sin abortar.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::events::RideEvent;

const CHANNEL_CAPACITY: usize = 64;

type ChannelMap = Arc<RwLock<HashMap<Uuid, broadcast::Sender<RideEvent>>>>;

#[derive(Clone, Default)]
pub struct DispatchHub {
    driver_channels: ChannelMap,
    ride_channels: ChannelMap,
}

impl DispatchHub {
    pub fn new() -> Self {
        Self::default()
    }

    async fn subscribe(map: &ChannelMap, key: Uuid) -> broadcast::Receiver<RideEvent> {
        let mut channels = map.write().await;
        channels
            .entry(key)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    async fn publish(map: &ChannelMap, key: Uuid, event: RideEvent) -> usize {
        let channels = map.read().await;
        match channels.get(&key) {
            // send falla solo cuando no queda ningún receptor
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Suscripción permanente del chofer a sus ofertas
    pub async fn subscribe_driver(&self, driver_id: Uuid) -> broadcast::Receiver<RideEvent> {
        Self::subscribe(&self.driver_channels, driver_id).await
    }

    /// Suscripción de cualquiera de las partes al canal del viaje
    pub async fn subscribe_ride(&self, ride_id: Uuid) -> broadcast::Receiver<RideEvent> {
        Self::subscribe(&self.ride_channels, ride_id).await
    }

    /// Publicar al canal del chofer; devuelve cuántos receptores lo vieron
    pub async fn publish_to_driver(&self, driver_id: Uuid, event: RideEvent) -> usize {
        Self::publish(&self.driver_channels, driver_id, event).await
    }

    /// Publicar al canal del viaje
    pub async fn publish_to_ride(&self, ride_id: Uuid, event: RideEvent) -> usize {
        Self::publish(&self.ride_channels, ride_id, event).await
    }

    /// Liberar el canal de un viaje terminal
    pub async fn drop_ride_channel(&self, ride_id: Uuid) {
        self.ride_channels.write().await.remove(&ride_id);
    }

    /// Liberar canales de chofer sin receptores vivos
    pub async fn prune_driver_channels(&self) {
        self.driver_channels
            .write()
            .await
            .retain(|_, sender| sender.receiver_count() > 0);
    }

    /// Liberar canales de viaje sin receptores vivos
    pub async fn prune_ride_channels(&self) {
        self.ride_channels
            .write()
            .await
            .retain(|_, sender| sender.receiver_count() > 0);
    }

    /// Cuántos canales de viaje siguen registrados
    pub async fn ride_channel_count(&self) -> usize {
        self.ride_channels.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::events::PartyRole;
    use chrono::Utc;

    #[tokio::test]
    async fn test_el_chofer_recibe_lo_publicado_en_su_canal() {
        let hub = DispatchHub::new();
        let driver_id = Uuid::new_v4();

        let mut rx = hub.subscribe_driver(driver_id).await;

        let delivered = hub
            .publish_to_driver(
                driver_id,
                RideEvent::Accepted {
                    ride_id: Uuid::new_v4(),
                    accepted_at: Utc::now(),
                },
            )
            .await;

        assert_eq!(delivered, 1);
        assert!(matches!(rx.recv().await.unwrap(), RideEvent::Accepted { .. }));
    }

    #[tokio::test]
    async fn test_publicar_sin_suscriptores_no_falla() {
        let hub = DispatchHub::new();
        let delivered = hub
            .publish_to_ride(
                Uuid::new_v4(),
                RideEvent::Cancelled {
                    ride_id: Uuid::new_v4(),
                    cancelled_by: PartyRole::Driver,
                },
            )
            .await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_los_canales_estan_aislados_por_chofer() {
        let hub = DispatchHub::new();
        let driver_a = Uuid::new_v4();
        let driver_b = Uuid::new_v4();

        let mut rx_a = hub.subscribe_driver(driver_a).await;
        let _rx_b = hub.subscribe_driver(driver_b).await;

        hub.publish_to_driver(
            driver_b,
            RideEvent::Cancelled {
                ride_id: Uuid::new_v4(),
                cancelled_by: PartyRole::Passenger,
            },
        )
        .await;

        // El canal de A no debe tener nada
        assert!(matches!(
            rx_a.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_ambas_partes_reciben_en_el_canal_del_viaje() {
        let hub = DispatchHub::new();
        let ride_id = Uuid::new_v4();

        let mut rx_driver = hub.subscribe_ride(ride_id).await;
        let mut rx_passenger = hub.subscribe_ride(ride_id).await;

        let delivered = hub
            .publish_to_ride(
                ride_id,
                RideEvent::Position {
                    ride_id,
                    role: PartyRole::Driver,
                    lat: 29.08,
                    lng: -110.96,
                    heading: None,
                    reported_at: Utc::now(),
                },
            )
            .await;

        assert_eq!(delivered, 2);
        assert!(matches!(rx_driver.recv().await.unwrap(), RideEvent::Position { .. }));
        assert!(matches!(rx_passenger.recv().await.unwrap(), RideEvent::Position { .. }));
    }

    #[tokio::test]
    async fn test_drop_libera_el_canal_del_viaje() {
        let hub = DispatchHub::new();
        let ride_id = Uuid::new_v4();

        let mut rx = hub.subscribe_ride(ride_id).await;
        assert_eq!(hub.ride_channel_count().await, 1);

        // Lo ya publicado sigue entregándose después del drop
        hub.publish_to_ride(
            ride_id,
            RideEvent::Cancelled {
                ride_id,
                cancelled_by: PartyRole::Driver,
            },
        )
        .await;
        hub.drop_ride_channel(ride_id).await;

        assert_eq!(hub.ride_channel_count().await, 0);
        assert!(matches!(rx.recv().await.unwrap(), RideEvent::Cancelled { .. }));
    }

    #[tokio::test]
    async fn test_prune_conserva_solo_canales_con_receptores() {
        let hub = DispatchHub::new();
        let ride_vivo = Uuid::new_v4();
        let ride_muerto = Uuid::new_v4();

        let _rx = hub.subscribe_ride(ride_vivo).await;
        drop(hub.subscribe_ride(ride_muerto).await);

        hub.prune_ride_channels().await;

        assert_eq!(hub.ride_channel_count().await, 1);
    }
}
