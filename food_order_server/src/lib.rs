//! # Food order server
//! This crate hosts the HTTP surface of the food ordering engine. It is responsible for:
//! * Authenticating callers from their bearer tokens.
//! * Forwarding transition, review, placement and wallet requests to the engine APIs.
//! * Streaming per-subscriber order updates over Server-Sent Events.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/...`: Authenticated routes. See [routes](routes/index.html).

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod push;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
