pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod extractors;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod pagination;
pub mod services;

#[cfg(test)]
pub mod testing;

pub use app::{router, AppState};
