//! # FreelaCRM API Server Library
//!
//! HTTP surface of FreelaCRM, split from the binary so integration tests can
//! build the router directly.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from the environment
//! - `error`: error type and HTTP response mapping
//! - `middleware`: security headers
//! - `routes`: route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
