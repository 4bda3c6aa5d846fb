//! Fixed test IDs and credentials for deterministic tests

use uuid::Uuid;

// User IDs (100-199)
pub const TEST_USER_JOHN: Uuid = Uuid::from_u128(100);

// Client record IDs (1000-1099)
pub const TEST_CLIENT_RECORD_1: Uuid = Uuid::from_u128(1000);

// Users
pub const TEST_USERNAME: &str = "john_doe";
pub const TEST_EMAIL: &str = "john@example.com";
pub const TEST_PASSWORD: &str = "password123";

pub const OTHER_USERNAME: &str = "jane_doe";
pub const OTHER_EMAIL: &str = "jane@example.com";

// Clients
pub const TEST_CLIENT_ID: &str = "test-client";
pub const TEST_CLIENT_SECRET: &str = "test-secret-do-not-use-in-production";
pub const TEST_REDIRECT_URI: &str = "http://localhost:3000/callback";
