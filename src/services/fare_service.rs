//! Servicio de tarifas
//!
//! Calcula la cotización de un viaje: pide la ruta al proveedor externo y
//! multiplica la distancia por la tarifa por km del chofer. La tarifa se
//! recibe ya resuelta (snapshot al momento de cotizar); el total se redondea
//! a 2 decimales para mostrar como moneda y nunca se recalcula después.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::services::routing_service::RouteProvider;
use crate::utils::errors::AppError;

/// Cotización completa de un viaje
#[derive(Debug, Clone)]
pub struct FareQuote {
    pub distance_km: f64,
    pub duration_min: f64,
    pub tarifa_km: Decimal,
    pub total_fare: Decimal,
    pub geometry: Option<String>,
}

pub struct FareService {
    routing: Arc<dyn RouteProvider>,
}

impl FareService {
    pub fn new(routing: Arc<dyn RouteProvider>) -> Self {
        Self { routing }
    }

    /// total_fare = distance_km * tarifa_km, redondeado a 2 decimales
    pub fn compute_total(distance_km: f64, tarifa_km: Decimal) -> Result<Decimal, AppError> {
        let distance = Decimal::from_f64_retain(distance_km)
            .ok_or_else(|| AppError::Internal("Invalid distance value".to_string()))?;
        Ok((distance * tarifa_km).round_dp(2))
    }

    pub async fn quote(
        &self,
        origin: (f64, f64),
        destination: (f64, f64),
        tarifa_km: Decimal,
    ) -> Result<FareQuote, AppError> {
        let route = self.routing.driving_route(origin, destination).await?;
        let total_fare = Self::compute_total(route.distance_km, tarifa_km)?;

        tracing::debug!(
            "💰 Cotización: {:.2} km x {} = {}",
            route.distance_km,
            tarifa_km,
            total_fare
        );

        Ok(FareQuote {
            distance_km: route.distance_km,
            duration_min: route.duration_min,
            tarifa_km,
            total_fare,
            geometry: route.geometry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::routing_service::RouteSummary;
    use async_trait::async_trait;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    struct FixedRouteProvider {
        distance_km: f64,
        duration_min: f64,
    }

    #[async_trait]
    impl RouteProvider for FixedRouteProvider {
        async fn driving_route(
            &self,
            _origin: (f64, f64),
            _destination: (f64, f64),
        ) -> Result<RouteSummary, AppError> {
            Ok(RouteSummary {
                distance_km: self.distance_km,
                duration_min: self.duration_min,
                geometry: None,
            })
        }
    }

    struct FailingRouteProvider;

    #[async_trait]
    impl RouteProvider for FailingRouteProvider {
        async fn driving_route(
            &self,
            _origin: (f64, f64),
            _destination: (f64, f64),
        ) -> Result<RouteSummary, AppError> {
            Err(AppError::ExternalApi("No route found".to_string()))
        }
    }

    #[tokio::test]
    async fn test_cotizacion_determinista() {
        // 2.35 km a 15 por km = 35.25
        let service = FareService::new(Arc::new(FixedRouteProvider {
            distance_km: 2.35,
            duration_min: 7.0,
        }));

        let quote = service
            .quote((29.0729, -110.9559), (29.0892, -110.9613), dec("15"))
            .await
            .unwrap();

        assert_eq!(quote.total_fare, dec("35.25"));
        assert!((quote.distance_km - 2.35).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_total_redondeado_a_dos_decimales() {
        let service = FareService::new(Arc::new(FixedRouteProvider {
            distance_km: 3.333,
            duration_min: 10.0,
        }));

        let quote = service
            .quote((0.0, 0.0), (1.0, 1.0), dec("12.50"))
            .await
            .unwrap();

        // 3.333 * 12.50 = 41.6625 -> 41.66
        assert_eq!(quote.total_fare, dec("41.66"));
    }

    #[tokio::test]
    async fn test_sin_ruta_propaga_error() {
        let service = FareService::new(Arc::new(FailingRouteProvider));
        let result = service.quote((0.0, 0.0), (1.0, 1.0), dec("15")).await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }
}
