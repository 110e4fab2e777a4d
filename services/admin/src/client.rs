//! HTTP client for the club administration backend
//!
//! Every request carries `Authorization: Bearer <token>` when the token
//! store holds a token. A 401 or 403 answer clears the store. Requests are
//! attempted once: no retry, no backoff.

use std::sync::Arc;

use common::{ClientConfig, TokenStore};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::{ClientError, ClientResult, server_message};

/// HTTP client for the backend
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    store: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Create a client without a request timeout
    pub fn new(base_url: &str, store: Arc<dyn TokenStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: Arc::from(base_url.trim_end_matches('/')),
            store,
        }
    }

    /// Create a client from the configuration
    pub fn from_config(config: &ClientConfig, store: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            store,
        })
    }

    /// The token store consulted before each request
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Backend base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .http
            .request(method, format!("{}{}", self.base_url, path));

        match self.store.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Vec<u8>> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        if status.is_success() {
            return Ok(body);
        }

        let message = server_message(&body);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("Server rejected the session with {}", status);
            if let Err(e) = self.store.remove() {
                error!("Failed to clear rejected session token: {}", e);
            }
            return Err(ClientError::Unauthorized {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Request failed with {}: {:?}", status, message);
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// GET `path` and decode the body
    #[tracing::instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let body = self.send(self.request(Method::GET, path)).await?;
        decode(&body)
    }

    /// POST a JSON body to `path` and decode the answer
    #[tracing::instrument(skip(self, body))]
    pub async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        decode(&body)
    }

    /// PATCH `path` with a JSON body and decode the answer
    #[tracing::instrument(skip(self, body))]
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self
            .send(self.request(Method::PATCH, path).json(body))
            .await?;
        decode(&body)
    }

    /// DELETE `path`, ignoring any answer body
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    /// DELETE `path` with a JSON body, ignoring any answer body
    #[tracing::instrument(skip(self, body))]
    pub async fn delete_with_body<B>(&self, path: &str, body: &B) -> ClientResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::DELETE, path).json(body))
            .await?;
        Ok(())
    }
}

/// Decode a success body; an empty body reads as JSON `null`
fn decode<T: DeserializeOwned>(body: &[u8]) -> ClientResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::IgnoredAny;

    #[test]
    fn test_decode_empty_body() {
        let value: Value = decode(b"").unwrap();
        assert_eq!(value, Value::Null);

        let _: IgnoredAny = decode(b"  ").unwrap();
        let _: IgnoredAny = decode(br#"{"id":"1"}"#).unwrap();

        let missing: Option<Vec<String>> = decode(b"").unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_decode_shape_mismatch() {
        let result: ClientResult<Vec<String>> = decode(br#"{"id":"1"}"#);
        assert!(matches!(result, Err(ClientError::Decode(_))));
    }

    #[test]
    fn test_base_url_is_normalized() {
        let store = Arc::new(common::MemoryTokenStore::new());
        let client = ApiClient::new("http://localhost:3000/", store);
        assert_eq!(client.base_url(), "http://localhost:3000");
    }
}
