//! Bearer token authorization gate served over HTTP.
//!
//! The decision pipeline lives in [`services::authz`]; the rest is hosting plumbing.
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
