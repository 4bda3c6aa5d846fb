//! Shared building blocks for the token service crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT wire-format checks (size limits, segment shape)
pub mod jwt;
