pub mod jwt;
pub mod password;

pub mod auth_dto;
pub mod auth_error;
pub mod auth_handlers;
pub mod auth_repository;
pub mod auth_service;

pub use auth_handlers::{login, logout, refresh_token, register};
pub use auth_repository::PgTokenBlacklist;
pub use auth_service::AuthService;
