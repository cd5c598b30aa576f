//! DTOs de requests y responses de la API

pub mod auth_dto;
pub mod common_dto;
pub mod dispatch_dto;
pub mod field_ops_dto;
pub mod issue_dto;

pub use common_dto::ApiResponse;
