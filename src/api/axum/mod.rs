mod admin;
mod cors;
mod error;
mod handlers;
mod middleware;
mod routes;

pub use cors::layer as cors_layer;
pub use error::AppError;
pub use middleware::{AdminSession, ClientIp, ValidatedJson, extract_client_ip};
pub use routes::{AppState, admin_routes, router, submission_routes};
