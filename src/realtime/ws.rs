//! Handlers WebSocket de los canales realtime
//!
//! Cliente -> servidor (canal de viaje, JSON):
//! ```json
//! {"lat": 29.0729, "lng": -110.9559, "heading": 45.0}
//! ```
//!
//! Servidor -> cliente: eventos `RideEvent` serializados (ver events.rs).
//! El canal del chofer es de solo lectura para el cliente; el canal del
//! viaje además acepta reportes de posición que se retransmiten a la otra
//! parte sin persistirse.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use super::events::{PartyRole, RideEvent};
use crate::state::AppState;
use crate::utils::geo;

/// Reporte de posición de una de las partes
#[derive(Debug, Deserialize)]
struct PositionReport {
    lat: f64,
    lng: f64,
    #[serde(default)]
    heading: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RideChannelParams {
    pub role: PartyRole,
}

/// Upgrade del canal permanente del chofer (ofertas filtradas a su id)
pub async fn driver_channel_handler(
    ws: WebSocketUpgrade,
    Path(driver_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_driver_socket(socket, state, driver_id))
}

async fn handle_driver_socket(socket: WebSocket, state: AppState, driver_id: Uuid) {
    tracing::info!("🔌 Chofer {} conectado al canal de ofertas", driver_id);

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut events = state.hub.subscribe_driver(driver_id).await;

    let sender_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let frame = match serde_json::to_string(&event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!("no se pudo serializar evento: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                // Suscriptor lento: se saltó eventos, el flujo sigue
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("canal del chofer {} atrasado, {} eventos perdidos", driver_id, skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // El chofer no manda nada por este canal; solo esperamos el cierre
    while let Some(Ok(msg)) = ws_receiver.next().await {
        if matches!(msg, Message::Close(_)) {
            break;
        }
    }

    sender_task.abort();
    state.hub.prune_driver_channels().await;
    tracing::info!("🔌 Chofer {} desconectado del canal de ofertas", driver_id);
}

/// Upgrade del canal del viaje (estado + posiciones de ambas partes)
pub async fn ride_channel_handler(
    ws: WebSocketUpgrade,
    Path(ride_id): Path<Uuid>,
    Query(params): Query<RideChannelParams>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_ride_socket(socket, state, ride_id, params.role))
}

async fn handle_ride_socket(socket: WebSocket, state: AppState, ride_id: Uuid, role: PartyRole) {
    tracing::info!("🔌 {:?} conectado al canal del viaje {}", role, ride_id);

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut events = state.hub.subscribe_ride(ride_id).await;

    let sender_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    // Cada parte no necesita el eco de su propia posición
                    if let RideEvent::Position { role: from, .. } = &event {
                        if *from == role {
                            continue;
                        }
                    }
                    let frame = match serde_json::to_string(&event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!("no se pudo serializar evento: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("canal del viaje {} atrasado, {} eventos perdidos", ride_id, skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Último fix recibido, para derivar el rumbo cuando el cliente no lo manda
    let mut last_fix: Option<(f64, f64)> = None;

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let report: PositionReport = match serde_json::from_str(&text) {
                    Ok(report) => report,
                    Err(e) => {
                        tracing::warn!("reporte de posición inválido: {}", e);
                        continue;
                    }
                };

                let heading = report.heading.or_else(|| {
                    last_fix.and_then(|(prev_lat, prev_lng)| {
                        // Con el mismo punto no hay rumbo que derivar
                        if (prev_lat - report.lat).abs() < 1e-9
                            && (prev_lng - report.lng).abs() < 1e-9
                        {
                            None
                        } else {
                            Some(geo::bearing_degrees(
                                prev_lat, prev_lng, report.lat, report.lng,
                            ))
                        }
                    })
                });
                last_fix = Some((report.lat, report.lng));

                state
                    .hub
                    .publish_to_ride(
                        ride_id,
                        RideEvent::Position {
                            ride_id,
                            role,
                            lat: report.lat,
                            lng: report.lng,
                            heading,
                            reported_at: Utc::now(),
                        },
                    )
                    .await;
            }
            Message::Close(_) => break,
            _ => {} // binary y ping se ignoran
        }
    }

    sender_task.abort();
    state.hub.prune_ride_channels().await;
    tracing::info!("🔌 {:?} desconectado del canal del viaje {}", role, ride_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporte_minimo_sin_heading() {
        let json = r#"{"lat": 29.0729, "lng": -110.9559}"#;
        let report: PositionReport = serde_json::from_str(json).unwrap();
        assert!((report.lat - 29.0729).abs() < 1e-9);
        assert!(report.heading.is_none());
    }

    #[test]
    fn test_reporte_con_heading() {
        let json = r#"{"lat": 29.0729, "lng": -110.9559, "heading": 180.5}"#;
        let report: PositionReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.heading, Some(180.5));
    }

    #[test]
    fn test_params_del_canal_aceptan_role() {
        let params: RideChannelParams =
            serde_json::from_str(r#"{"role": "passenger"}"#).unwrap();
        assert_eq!(params.role, PartyRole::Passenger);
    }
}
