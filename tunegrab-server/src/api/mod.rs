//! HTTP API handlers for tunegrab-server

pub mod download;
pub mod health;
pub mod search;

pub use download::download_routes;
pub use health::health_routes;
pub use search::search_routes;
