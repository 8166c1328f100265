//! Partner Match - a user matching and team formation backend
//!
//! Users register, tag themselves with interests and get matched with
//! other users; they can create small teams and join, leave or disband
//! them under capacity, visibility and password rules.

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod matching;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
