//! Backend de despacho de taxi local
//!
//! Solicitudes de viaje con máquina de estados (pending -> accepted ->
//! completed, con cancelación), cotización de tarifa vía Mapbox Directions,
//! canales realtime por chofer y por viaje, y alerta repetitiva de oferta.

pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod realtime;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
