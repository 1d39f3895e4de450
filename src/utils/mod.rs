//! Utilidades compartidas

pub mod errors;
pub mod geo;
