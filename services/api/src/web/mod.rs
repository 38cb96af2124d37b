pub mod auth;
pub mod dto;
pub mod flashcards;
pub mod generations;
pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::require_auth;
pub use rest::ApiDoc;
