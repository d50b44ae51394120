pub mod cache_routes;
pub mod server;
