//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL.

pub mod attendance;
pub mod inventory;
pub mod invoice;
pub mod issue;
pub mod location;
pub mod notification;
pub mod technician;

pub use attendance::{Attendance, OnDutyTechnician};
pub use inventory::InventoryItem;
pub use invoice::{Invoice, InvoiceLine, InvoiceWithLines};
pub use issue::{Issue, IssuePriority, IssueStatus};
pub use location::{Coordinates, LiveLocation};
pub use notification::Notification;
pub use technician::{Technician, TechnicianRole};
