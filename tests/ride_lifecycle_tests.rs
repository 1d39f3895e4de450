//! Tests de integración del ciclo de vida contra PostgreSQL
//!
//! Ejercitan las garantías que viven en los updates condicionales del
//! repositorio y en los efectos secundarios del controller: un solo ganador
//! al aceptar, el candado de cancelación sobre solicitudes aceptadas y el
//! acople de la disponibilidad del chofer a las transiciones.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use taxi_dispatch::controllers::ride_controller::RideController;
use taxi_dispatch::models::driver::{Driver, DriverAvailability};
use taxi_dispatch::realtime::{AlertRegistry, DispatchHub};
use taxi_dispatch::repositories::driver_repository::DriverRepository;
use taxi_dispatch::repositories::ride_repository::{NewRide, RideRepository};
use taxi_dispatch::services::notification_service::MockNotificationService;
use taxi_dispatch::services::routing_service::UnconfiguredRouteProvider;
use taxi_dispatch::utils::errors::AppError;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn controller(pool: PgPool) -> RideController {
    let hub = DispatchHub::new();
    let alerts = AlertRegistry::new(hub.clone(), Duration::from_millis(50));
    RideController::new(
        pool,
        Arc::new(UnconfiguredRouteProvider),
        hub,
        alerts,
        Arc::new(MockNotificationService),
    )
}

async fn registrar_chofer(pool: &PgPool) -> Driver {
    DriverRepository::new(pool.clone())
        .create("Juan Pérez".to_string(), "6621234567".to_string(), Some(dec("15")))
        .await
        .unwrap()
}

async fn crear_solicitud(pool: &PgPool, passenger_id: Uuid, driver_id: Uuid) -> Uuid {
    let ride = RideRepository::new(pool.clone())
        .create(NewRide {
            passenger_id,
            driver_id,
            pickup_lat: 29.0729,
            pickup_lng: -110.9559,
            destination_lat: 29.0892,
            destination_lng: -110.9613,
            pickup_address: None,
            destination_address: None,
            distance_km: 2.35,
            duration_min: 7.0,
            tarifa_km: dec("15"),
            total_fare: dec("35.25"),
        })
        .await
        .unwrap();
    ride.id
}

async fn disponibilidad(pool: &PgPool, driver_id: Uuid) -> DriverAvailability {
    DriverRepository::new(pool.clone())
        .find_by_id(driver_id)
        .await
        .unwrap()
        .unwrap()
        .availability
}

#[sqlx::test(migrations = "./migrations")]
async fn test_dos_accepts_concurrentes_un_solo_ganador(pool: PgPool) {
    let driver = registrar_chofer(&pool).await;
    let ride_id = crear_solicitud(&pool, Uuid::new_v4(), driver.id).await;
    let ctrl = controller(pool);

    let (r1, r2) = tokio::join!(
        ctrl.accept(ride_id, driver.id),
        ctrl.accept(ride_id, driver.id)
    );

    let exitos = r1.is_ok() as usize + r2.is_ok() as usize;
    assert_eq!(exitos, 1, "exactamente un accept debe ganar");

    let perdedor = if r1.is_err() { r1 } else { r2 };
    assert!(matches!(perdedor, Err(AppError::Conflict(_))));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_no_se_cancela_una_solicitud_aceptada(pool: PgPool) {
    let driver = registrar_chofer(&pool).await;
    let passenger_id = Uuid::new_v4();
    let ride_id = crear_solicitud(&pool, passenger_id, driver.id).await;
    let ctrl = controller(pool);

    ctrl.accept(ride_id, driver.id).await.unwrap();

    let result = ctrl.cancel(ride_id, passenger_id).await;
    match result {
        Err(AppError::Conflict(msg)) => assert!(msg.contains("Accepted"), "mensaje: {}", msg),
        other => panic!("se esperaba Conflict, llegó {:?}", other.map(|_| ())),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_accept_y_complete_acoplan_la_disponibilidad(pool: PgPool) {
    let driver = registrar_chofer(&pool).await;
    let ride_id = crear_solicitud(&pool, Uuid::new_v4(), driver.id).await;
    let ctrl = controller(pool.clone());

    ctrl.accept(ride_id, driver.id).await.unwrap();
    assert_eq!(disponibilidad(&pool, driver.id).await, DriverAvailability::Busy);

    ctrl.complete(ride_id, driver.id).await.unwrap();
    assert_eq!(disponibilidad(&pool, driver.id).await, DriverAvailability::Available);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rechazo_y_cancelacion_no_tocan_la_disponibilidad(pool: PgPool) {
    let driver = registrar_chofer(&pool).await;
    let ctrl = controller(pool.clone());

    // Rechazo del chofer: sigue offline (estado inicial)
    let ride_id = crear_solicitud(&pool, Uuid::new_v4(), driver.id).await;
    ctrl.reject(ride_id, driver.id).await.unwrap();
    assert_eq!(disponibilidad(&pool, driver.id).await, DriverAvailability::Offline);

    // Cancelación del pasajero: tampoco cambia
    let passenger_id = Uuid::new_v4();
    let ride_id = crear_solicitud(&pool, passenger_id, driver.id).await;
    ctrl.cancel(ride_id, passenger_id).await.unwrap();
    assert_eq!(disponibilidad(&pool, driver.id).await, DriverAvailability::Offline);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_accept_de_otro_chofer_es_conflicto_de_actor(pool: PgPool) {
    let asignado = registrar_chofer(&pool).await;
    let intruso = registrar_chofer(&pool).await;
    let ride_id = crear_solicitud(&pool, Uuid::new_v4(), asignado.id).await;
    let ctrl = controller(pool.clone());

    let result = ctrl.accept(ride_id, intruso.id).await;
    match result {
        Err(AppError::Conflict(msg)) => {
            assert!(msg.contains("otro chofer"), "mensaje: {}", msg)
        }
        other => panic!("se esperaba Conflict, llegó {:?}", other.map(|_| ())),
    }

    // La solicitud sigue pendiente para el chofer asignado
    ctrl.accept(ride_id, asignado.id).await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn test_indice_parcial_impide_segunda_solicitud_activa(pool: PgPool) {
    let driver = registrar_chofer(&pool).await;
    let passenger_id = Uuid::new_v4();

    crear_solicitud(&pool, passenger_id, driver.id).await;

    let repo = RideRepository::new(pool.clone());
    let result = repo
        .create(NewRide {
            passenger_id,
            driver_id: driver.id,
            pickup_lat: 29.0729,
            pickup_lng: -110.9559,
            destination_lat: 29.0892,
            destination_lng: -110.9613,
            pickup_address: None,
            destination_address: None,
            distance_km: 2.35,
            duration_min: 7.0,
            tarifa_km: dec("15"),
            total_fare: dec("35.25"),
        })
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}
