//! # LocalBitcoins Client
//!
//! An async Rust client for the LocalBitcoins HMAC-authenticated REST API.
//!
//! ## Features
//!
//! - HMAC-SHA256 request signing with the `Apiauth-*` header scheme
//! - Strictly increasing millisecond nonces, safe under concurrent calls
//! - Raw JSON access via [`rest::LbRestClient::send_request`] or typed
//!   responses via [`rest::LbRestClient::send`]
//! - Distinct error types for transport, HTTP status, and decode failures
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use localbitcoins_api_client::rest::LbRestClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LbRestClient::new("api_key", "api_secret");
//!     let myself = client.get("/api/myself/").await?;
//!     println!("Account: {myself}");
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod rest;

// Re-export commonly used types at crate root
pub use error::LbError;
pub use rest::{LbRestClient, Method};

/// Result type alias using LbError
pub type Result<T> = std::result::Result<T, LbError>;
