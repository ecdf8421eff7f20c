//! LocalBitcoins REST API endpoint constants.

/// Base URL for the LocalBitcoins API.
pub const LOCALBITCOINS_BASE_URL: &str = "https://localbitcoins.com";
