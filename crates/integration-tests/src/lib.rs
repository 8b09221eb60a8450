//! Shared helpers for integration tests.
//!
//! These tests exercise a running API server; see the test files for the
//! required environment.

#![cfg_attr(not(test), forbid(unsafe_code))]

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("AVOI_API_BASE_URL").unwrap_or_else(|_| "http://localhost:5001".to_string())
}
