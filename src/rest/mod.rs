//! LocalBitcoins REST API client.

mod client;
mod endpoints;

pub use client::{LbRestClient, LbRestClientBuilder, Method};
pub use endpoints::LOCALBITCOINS_BASE_URL;
