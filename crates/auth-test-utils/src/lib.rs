//! # Auth Test Utilities
//!
//! Shared test utilities for the auth service.
//!
//! This crate provides:
//! - Fixed signing secrets, users and clients
//! - Claim builders for hand-signed tokens (expired, foreign key, odd payloads)
//! - Server test harness (TestAuthServer for E2E tests)
//! - Fixed test IDs and credentials
//! - Custom assertions (TokenAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestAuthServer::spawn().await?;
//!     server.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD).await?;
//!
//!     let token = TestClaimsBuilder::new()
//!         .for_user(TEST_USERNAME)
//!         .expired_ms_ago(1_000)
//!         .sign(TEST_JWT_SECRET);
//!
//!     token.assert_valid_jwt().assert_for_username(TEST_USERNAME);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod server_harness;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use server_harness::*;
pub use test_ids::*;
pub use token_builders::*;

// Counting mocks live next to the repository traits so unit tests inside the
// service can use them too.
pub use auth_service::repositories::mock::{MockClientRepository, MockUserRepository};
