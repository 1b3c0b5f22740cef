//! Shipment-tracking API client
//!
//! A thin blocking client over `ureq`. Each resource lives in its own
//! submodule as methods on [`ApiClient`]; this module owns the agent,
//! authentication header and error mapping shared by all of them.
//!
//! Calls block, so async callers run them on the blocking pool.

pub mod admin;
pub mod auth;
pub mod models;
pub mod products;
pub mod shipments;
pub mod transport;

use crate::config::ApiConfig;
use crate::error::ApiError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// List endpoints return either a bare array or `{ "data": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListEnvelope<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) => items,
            ListEnvelope::Wrapped { data } => data,
        }
    }
}

/// Single resources, likewise, may come back wrapped in `{ "data": ... }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemEnvelope<T> {
    Bare(T),
    Wrapped { data: T },
}

impl<T> ItemEnvelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            ItemEnvelope::Bare(item) | ItemEnvelope::Wrapped { data: item } => item,
        }
    }
}

/// Pull the server's explanation out of an error body
///
/// The server answers errors with `{ "message": "..." }`, a bare JSON
/// string, or plain text.
pub fn error_message(body: &str) -> String {
    let body = body.trim();
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => map
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string(),
        Ok(serde_json::Value::String(s)) => s,
        Ok(_) => String::new(),
        Err(_) => body.to_string(),
    }
}

/// Blocking client for the shipment API
#[derive(Clone)]
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("barcodeverify/", env!("CARGO_PKG_VERSION")))
            .build();

        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Absolute URL for an API path
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ApiError::Network(format!("Invalid API URL {}{}: {}", self.base_url, path, e)))
    }

    /// `path` followed by `value` as one percent-encoded path segment
    pub(crate) fn endpoint_with(&self, path: &str, value: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Network(format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .push(value);
        Ok(url)
    }

    fn request(&self, method: &str, url: &Url, query: &[(&str, &str)]) -> ureq::Request {
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .agent
            .request_url(method, url)
            .set("Accept", "application/json");
        if let Some(ref token) = self.token {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }
        for (key, value) in query {
            request = request.query(key, value);
        }
        request
    }

    /// Require a stored session before calling an authenticated endpoint
    pub(crate) fn require_auth(&self) -> Result<(), ApiError> {
        if self.token.is_some() {
            Ok(())
        } else {
            Err(ApiError::NotLoggedIn)
        }
    }

    fn send<B: Serialize>(
        &self,
        request: ureq::Request,
        body: Option<&B>,
    ) -> Result<ureq::Response, ApiError> {
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };

        result.map_err(|e| match e {
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                let message = error_message(&body);
                tracing::debug!("Server returned {}: {}", code, body);
                ApiError::from_status(code, message)
            }
            ureq::Error::Transport(t) => ApiError::Network(t.to_string()),
        })
    }

    fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, ApiError> {
        let body = response
            .into_string()
            .map_err(|e| ApiError::Network(format!("Failed to read response: {}", e)))?;
        // Bodyless success (204, empty 200) decodes as JSON null
        let body = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(body)
            .map_err(|e| ApiError::Decode(format!("Failed to parse response: {}", e)))
    }

    pub(crate) fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        self.get_url(&self.endpoint(path)?, query)
    }

    pub(crate) fn get_url<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response = self.send::<()>(self.request("GET", url, query), None)?;
        Self::decode(response)
    }

    pub(crate) fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, ApiError> {
        let envelope: ListEnvelope<T> = self.get(path, query)?;
        Ok(envelope.into_vec())
    }

    pub(crate) fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let response = self.send(self.request("POST", &self.endpoint(path)?, &[]), body)?;
        Self::decode(response)
    }

    pub(crate) fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.send(self.request("PUT", &self.endpoint(path)?, &[]), Some(body))?;
        Self::decode(response)
    }

    pub(crate) fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let response = self.send(self.request("PATCH", &self.endpoint(path)?, &[]), body)?;
        Self::decode(response)
    }

    pub(crate) fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send::<()>(self.request("DELETE", &self.endpoint(path)?, &[]), None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Shipment;

    #[test]
    fn test_list_envelope_bare_and_wrapped() {
        let bare: ListEnvelope<i64> = serde_json::from_str("[1,2,3]").unwrap();
        assert_eq!(bare.into_vec(), vec![1, 2, 3]);

        let wrapped: ListEnvelope<i64> = serde_json::from_str(r#"{"data":[4,5]}"#).unwrap();
        assert_eq!(wrapped.into_vec(), vec![4, 5]);

        assert!(serde_json::from_str::<ListEnvelope<i64>>(r#"{"items":[1]}"#).is_err());
    }

    #[test]
    fn test_item_envelope() {
        let json = r#"{"data":{"id":2,"shipmentNumber":"ENV-2","status":"Pending"}}"#;
        let item: ItemEnvelope<Shipment> = serde_json::from_str(json).unwrap();
        assert_eq!(item.into_inner().id, 2);

        let json = r#"{"id":3,"shipmentNumber":"ENV-3","status":"Completed"}"#;
        let item: ItemEnvelope<Shipment> = serde_json::from_str(json).unwrap();
        assert_eq!(item.into_inner().shipment_number, "ENV-3");
    }

    #[test]
    fn test_list_envelope_of_shipments() {
        let json = r#"{"data":[{"id":1,"shipmentNumber":"ENV-1","status":"Pending"}]}"#;
        let list: ListEnvelope<Shipment> = serde_json::from_str(json).unwrap();
        let list = list.into_vec();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].shipment_number, "ENV-1");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"message":"Shipment already completed"}"#),
            "Shipment already completed"
        );
        assert_eq!(error_message(r#""Invalid barcode""#), "Invalid barcode");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(r#"{"title":"x"}"#), "");
        assert_eq!(error_message(""), "");
    }

    #[test]
    fn test_base_url_normalized() {
        let config = ApiConfig {
            base_url: "https://example.com/".into(),
            timeout_secs: 5,
        };
        let client = ApiClient::new(&config);
        assert_eq!(
            client.endpoint("/api/auth/login").unwrap().as_str(),
            "https://example.com/api/auth/login"
        );
        assert!(!client.is_authenticated());
        assert!(matches!(client.require_auth(), Err(ApiError::NotLoggedIn)));
        let client = client.with_token(Some("t".into()));
        assert!(client.require_auth().is_ok());
    }

    #[test]
    fn test_lookup_values_stay_one_segment() {
        let client = ApiClient::new(&ApiConfig {
            base_url: "https://api.example.com/".into(),
            ..ApiConfig::default()
        });

        let url = client
            .endpoint_with("/api/Shipment/number", "ENV-2024_01")
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/Shipment/number/ENV-2024_01");

        let url = client.endpoint_with("/api/Product/barcode", "A/B C?").unwrap();
        assert_eq!(url.path(), "/api/Product/barcode/A%2FB%20C%3F");
        assert!(url.query().is_none());
    }
}
