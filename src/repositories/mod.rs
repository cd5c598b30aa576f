//! Acceso a datos (sqlx + PostgreSQL)

pub mod attendance_repository;
pub mod inventory_repository;
pub mod invoice_repository;
pub mod issue_repository;
pub mod location_repository;
pub mod notification_repository;
pub mod technician_repository;
