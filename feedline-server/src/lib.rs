// Library exports for feedline-server
// This allows integration tests to exercise the server modules directly.

pub mod api;
pub mod config;
pub mod db;
pub mod import;
pub mod state;
