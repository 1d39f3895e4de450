//! Configuración de la aplicación

pub mod environment;
