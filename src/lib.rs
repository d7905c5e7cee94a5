pub mod api;
pub mod app;
pub mod auth;
pub mod cart;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;
pub mod tracking;
