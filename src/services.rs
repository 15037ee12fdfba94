pub mod auth;
pub mod library_service;
pub mod password;
pub mod session;
pub mod tenancy_service;
pub mod token;
