pub mod auth;
pub mod cors;

pub use auth::{AuthMiddleware, current_staff};
pub use cors::create_cors;
