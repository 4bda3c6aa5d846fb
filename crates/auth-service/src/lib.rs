//! Auth Service Library
//!
//! Issues and refreshes HS256 access/refresh token pairs, authenticates
//! bearer tokens on incoming requests, and validates OAuth client
//! credentials against stored client descriptors.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Token codec, signing key, secret hashing
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - Bearer-token interceptor
//! - `models` - Data models
//! - `observability` - Metrics and log correlation helpers
//! - `repositories` - User and client storage
//! - `routes` - Router and application state
//! - `services` - Business logic layer

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
