//! Rates Proxy Library
//!
//! A caching HTTP proxy for the Open Exchange Rates API. Modules are exposed
//! for use in integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod resource;
pub mod server;
