//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] wrappers used across the token service. Every
//! credential that crosses a crate boundary travels inside one of these types:
//! the JWT signing secret, user passwords on the login and registration paths,
//! and OAuth client secrets presented for validation.
//!
//! `SecretString` implements `Debug` with redaction, so a request DTO that
//! derives `Debug` stays safe to log. Reading the value requires an explicit
//! `expose_secret()` call, which keeps every use site greppable.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct LoginRequest {
//!     username: String,
//!     password: SecretString,
//! }
//!
//! let req = LoginRequest {
//!     username: "john_doe".to_string(),
//!     password: SecretString::from("hunter22"),
//! };
//!
//! assert!(!format!("{req:?}").contains("hunter22"));
//! assert_eq!(req.password.expose_secret(), "hunter22");
//! ```
//!
//! With the `serde` feature of `secrecy` enabled, request bodies deserialize
//! straight into `SecretString` fields.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
