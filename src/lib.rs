// Public API for integration tests and the server binary

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod game;
pub mod protocol;
pub mod state;
pub mod types;
pub mod ws;
