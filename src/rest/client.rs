//! LocalBitcoins REST API client implementation.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

use crate::auth::{Credentials, IncreasingNonce, NonceProvider, sign_request};
use crate::error::{ApiError, LbError};
use crate::rest::endpoints::LOCALBITCOINS_BASE_URL;

/// HTTP method for a LocalBitcoins API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// GET request; params, if any, are sent as the query string
    #[default]
    Get,
    /// POST request; params are sent as a form-encoded body
    Post,
}

impl Method {
    /// The method name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl FromStr for Method {
    type Err = LbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            other => Err(LbError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The LocalBitcoins REST API client.
///
/// Every request is signed with the HMAC scheme LocalBitcoins requires:
/// a fresh millisecond nonce, the `Apiauth-Key`/`Apiauth-Nonce`/
/// `Apiauth-Signature` headers, and an uppercase-hex HMAC-SHA256 over
/// `nonce + key + path + encoded_params`.
///
/// # Example
///
/// ```rust,no_run
/// use localbitcoins_api_client::rest::LbRestClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = LbRestClient::new("api_key", "api_secret");
///
///     // Raw JSON body of the endpoint.
///     let myself = client.get("/api/myself/").await?;
///     println!("Account: {myself}");
///
///     Ok(())
/// }
/// ```
///
/// For typed access to the `data` envelope:
///
/// ```rust,no_run
/// use localbitcoins_api_client::rest::{LbRestClient, Method};
///
/// #[derive(serde::Deserialize)]
/// struct Myself {
///     username: String,
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = LbRestClient::new("api_key", "api_secret");
///     let myself: Myself = client
///         .send("/api/myself/", Method::Get, None::<&()>)
///         .await?;
///     println!("Logged in as {}", myself.username);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct LbRestClient {
    http_client: ClientWithMiddleware,
    base_url: String,
    credentials: Credentials,
    nonce_provider: Arc<dyn NonceProvider>,
}

impl LbRestClient {
    /// Create a new client with default settings from an API key and secret.
    ///
    /// Use [`LbRestClient::builder()`] to override the base URL, nonce
    /// provider, user agent, or request timeout.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self::builder(Credentials::new(api_key, api_secret)).build()
    }

    /// Create a new client builder.
    pub fn builder(credentials: Credentials) -> LbRestClientBuilder {
        LbRestClientBuilder::new(credentials)
    }

    /// Send a signed request and return the parsed JSON response body.
    ///
    /// This is the raw access layer: the body is returned verbatim as a
    /// [`serde_json::Value`], including the LocalBitcoins response envelope.
    /// Interpreting semantic error codes inside a successfully parsed body is
    /// the caller's responsibility; use [`LbRestClient::send`] for typed
    /// envelope handling.
    ///
    /// # Errors
    ///
    /// - [`LbError::Transport`] / [`LbError::TransportMiddleware`] when the
    ///   request could not be completed
    /// - [`LbError::Status`] for non-2xx responses, with the raw body
    /// - [`LbError::Decode`] when the body is not valid JSON
    pub async fn send_request<P>(
        &self,
        path: &str,
        method: Method,
        params: Option<&P>,
    ) -> Result<serde_json::Value, LbError>
    where
        P: serde::Serialize + ?Sized,
    {
        let (status, body) = self.dispatch(method, path, params).await?;

        if !status.is_success() {
            return Err(LbError::Status { status, body });
        }

        serde_json::from_str(&body).map_err(|source| LbError::Decode { source, body })
    }

    /// Send a signed request and deserialize the `data` key of the response
    /// envelope.
    ///
    /// LocalBitcoins wraps every response in `{"data": ...}` and delivers
    /// semantic failures as `{"error": {...}}`; this method unwraps the
    /// former and maps the latter to [`LbError::Api`].
    pub async fn send<T, P>(&self, path: &str, method: Method, params: Option<&P>) -> Result<T, LbError>
    where
        T: serde::de::DeserializeOwned,
        P: serde::Serialize + ?Sized,
    {
        let (status, body) = self.dispatch(method, path, params).await?;

        match serde_json::from_str::<LbResponse>(&body) {
            Ok(envelope) => {
                // Error envelopes arrive with non-2xx statuses as well, so
                // check the envelope before the status code.
                if let Some(error) = envelope.error {
                    return Err(LbError::Api(error));
                }
                if let Some(data) = envelope.data {
                    return serde_json::from_value(data)
                        .map_err(|source| LbError::Decode { source, body });
                }
                if !status.is_success() {
                    return Err(LbError::Status { status, body });
                }
                Err(LbError::Decode {
                    source: <serde_json::Error as serde::de::Error>::custom(
                        "response missing 'data' field",
                    ),
                    body,
                })
            }
            Err(source) => {
                if !status.is_success() {
                    return Err(LbError::Status { status, body });
                }
                Err(LbError::Decode { source, body })
            }
        }
    }

    /// Make a signed GET request with no parameters.
    pub async fn get(&self, path: &str) -> Result<serde_json::Value, LbError> {
        self.send_request(path, Method::Get, None::<&()>).await
    }

    /// Make a signed GET request with query parameters.
    pub async fn get_with_params<P>(
        &self,
        path: &str,
        params: &P,
    ) -> Result<serde_json::Value, LbError>
    where
        P: serde::Serialize + ?Sized,
    {
        self.send_request(path, Method::Get, Some(params)).await
    }

    /// Make a signed POST request with form-encoded parameters.
    pub async fn post<P>(&self, path: &str, params: &P) -> Result<serde_json::Value, LbError>
    where
        P: serde::Serialize + ?Sized,
    {
        self.send_request(path, Method::Post, Some(params)).await
    }

    /// Make a signed POST request with an empty body.
    pub async fn post_empty(&self, path: &str) -> Result<serde_json::Value, LbError> {
        self.send_request(path, Method::Post, None::<&()>).await
    }

    /// Sign and dispatch a single request, returning the status and raw body.
    async fn dispatch<P>(
        &self,
        method: Method,
        path: &str,
        params: Option<&P>,
    ) -> Result<(StatusCode, String), LbError>
    where
        P: serde::Serialize + ?Sized,
    {
        let encoded = match params {
            Some(params) => serde_urlencoded::to_string(params)?,
            None => String::new(),
        };

        // GET params are signed with the leading '?', exactly as they appear
        // in the request line. POST bodies are signed raw.
        let signed_params = if method == Method::Get && !encoded.is_empty() {
            format!("?{encoded}")
        } else {
            encoded.clone()
        };

        let nonce = self.nonce_provider.next_nonce();
        let signature = sign_request(&self.credentials, nonce, path, &signed_params)?;

        let url = match method {
            Method::Get if !encoded.is_empty() => {
                format!("{}{}?{}", self.base_url, path, encoded)
            }
            _ => format!("{}{}", self.base_url, path),
        };

        tracing::debug!(%method, path, nonce, "dispatching signed request");

        let request = match method {
            Method::Get => self.http_client.get(&url),
            Method::Post => self
                .http_client
                .post(&url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encoded),
        };

        let response = request
            .header("Apiauth-Key", &self.credentials.api_key)
            .header("Apiauth-Nonce", nonce.to_string())
            .header("Apiauth-Signature", signature)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        Ok((status, body))
    }
}

impl std::fmt::Debug for LbRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LbRestClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.credentials.api_key)
            .finish()
    }
}

/// Builder for [`LbRestClient`].
pub struct LbRestClientBuilder {
    base_url: String,
    credentials: Credentials,
    nonce_provider: Option<Arc<dyn NonceProvider>>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl LbRestClientBuilder {
    /// Create a new builder with default settings.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            base_url: LOCALBITCOINS_BASE_URL.to_string(),
            credentials,
            nonce_provider: None,
            user_agent: None,
            timeout: None,
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a custom nonce provider.
    pub fn nonce_provider(mut self, provider: Arc<dyn NonceProvider>) -> Self {
        self.nonce_provider = Some(provider);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set a timeout applied to each request round-trip.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> LbRestClient {
        // Build default headers.
        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("localbitcoins-api-client/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("localbitcoins-api-client"));
        headers.insert(USER_AGENT, header_value);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let reqwest_client = builder.build().unwrap_or_else(|_| reqwest::Client::new());

        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        let nonce_provider = self
            .nonce_provider
            .unwrap_or_else(|| Arc::new(IncreasingNonce::new()));

        LbRestClient {
            http_client: client,
            base_url: self.base_url,
            credentials: self.credentials,
            nonce_provider,
        }
    }
}

/// Internal wrapper for the LocalBitcoins response envelope.
#[derive(Debug, serde::Deserialize)]
struct LbResponse {
    data: Option<serde_json::Value>,
    error: Option<ApiError>,
}
