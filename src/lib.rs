pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod extract;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod schema;
pub mod state;
