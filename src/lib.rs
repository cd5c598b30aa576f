//! Backend de despacho de servicio técnico en campo
//!
//! Issues de vehículos/dispositivos, técnicos, asistencia, ubicación en vivo,
//! inventario, facturación y notificaciones, con ranking del técnico más
//! cercano y overlay de rutas de conducción.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_app_router;
pub use state::AppState;
