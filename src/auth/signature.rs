//! HMAC-SHA256 signature generation for LocalBitcoins API authentication.
//!
//! Authenticated endpoints require a signature computed as:
//! ```text
//! HMAC-SHA256(nonce + api_key + path + encoded_params, api_secret)
//! ```
//!
//! where `encoded_params` is the form-encoded parameter string: prefixed with
//! `?` for GET requests carrying params, raw for POST bodies, and empty when
//! no params are supplied. The signature is rendered as uppercase hex and
//! sent in the `Apiauth-Signature` header.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::auth::Credentials;
use crate::error::LbError;

type HmacSha256 = Hmac<Sha256>;

/// Sign a request for the LocalBitcoins API.
///
/// # Arguments
///
/// * `credentials` - API credentials containing the secret
/// * `nonce` - The nonce value for this request
/// * `path` - The API endpoint path (e.g., "/api/myself/")
/// * `encoded_params` - The form-encoded params as they appear in the signed
///   message (`?`-prefixed query string for GET, raw body for POST, empty for
///   none)
///
/// # Returns
///
/// Uppercase hex-encoded HMAC-SHA256 signature.
///
/// # Example
///
/// ```rust
/// use localbitcoins_api_client::auth::{Credentials, sign_request};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = Credentials::new("api_key", "api_secret");
/// let signature = sign_request(&credentials, 1234567890123, "/api/myself/", "")?;
/// # Ok(())
/// # }
/// ```
pub fn sign_request(
    credentials: &Credentials,
    nonce: u64,
    path: &str,
    encoded_params: &str,
) -> Result<String, LbError> {
    let mut hmac = HmacSha256::new_from_slice(credentials.expose_secret().as_bytes())
        .map_err(|e| LbError::Auth(format!("Invalid HMAC key: {e}")))?;

    // The message is the plain concatenation of nonce, key, path and params,
    // with no delimiters.
    hmac.update(nonce.to_string().as_bytes());
    hmac.update(credentials.api_key.as_bytes());
    hmac.update(path.as_bytes());
    hmac.update(encoded_params.as_bytes());
    let hmac_result = hmac.finalize().into_bytes();

    Ok(hex::encode_upper(hmac_result))
}
