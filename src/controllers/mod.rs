//! Controladores: orquestan repositorios y servicios por recurso

pub mod attendance_controller;
pub mod auth_controller;
pub mod dispatch_controller;
pub mod inventory_controller;
pub mod invoice_controller;
pub mod issue_controller;
pub mod location_controller;
pub mod media_controller;
pub mod notification_controller;
