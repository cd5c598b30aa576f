//! Services module
//!
//! Este módulo contiene la lógica de negocio y servicios de la aplicación.
//! Los servicios encapsulan operaciones puras (distancias, ranking, CSV,
//! facturas, ciclo de vida) y las integraciones externas (rutas, mensajería,
//! almacenamiento).

pub mod attendance_service;
pub mod change_feed;
pub mod csv_service;
pub mod dispatch_service;
pub mod geo;
pub mod inventory_service;
pub mod invoice_service;
pub mod issue_lifecycle;
pub mod messaging_service;
pub mod route_overlay;
pub mod routing_service;
pub mod storage_service;

pub use change_feed::{ChangeAction, ChangeFeed, ChangeTable};
pub use routing_service::{OsrmRoutingClient, RoutingProvider};
