//! Azure DevOps REST client.
//!
//! This module provides:
//! - Authenticated HTTP transport (basic auth with the PAT)
//! - Organization-scoped URL building with percent-encoded path segments
//! - Rate limiting of every outbound request
//! - Status and body mapping into [`ApiError`]

#![allow(clippy::missing_errors_doc)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderValue, ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, ETAG, IF_MATCH};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::config::{ClientConfig, Host};
use super::types::{ErrorBody, PatchOperation};
use crate::config::{Config, SecretString};
use crate::error::{ApiError, AppError};
use crate::rate_limit::RateLimiter;

/// Content type for JSON Patch bodies.
const JSON_PATCH: &str = "application/json-patch+json";

/// Azure DevOps REST client.
///
/// One instance per process. Cloning the inner `reqwest::Client` is cheap,
/// but the rate limiter is per instance, so share the client behind an
/// `Arc` rather than constructing several.
#[derive(Debug)]
pub struct DevOpsClient {
    http: Client,
    pat: SecretString,
    config: ClientConfig,
    limiter: Arc<RateLimiter>,
}

impl DevOpsClient {
    /// Create a new client.
    pub fn new(pat: impl Into<SecretString>, config: ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ApiError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            pat: pat.into(),
            config,
            limiter: Arc::new(RateLimiter::default()),
        })
    }

    /// Create a client for the organization and token in `config`.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let client_config = ClientConfig::for_organization(&config.organization)
            .with_timeout_ms(config.request_timeout_ms);
        Self::new(config.pat.clone(), client_config)
    }

    /// Replace the rate limiter.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// The limiter guarding outbound requests.
    #[must_use]
    pub const fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Get the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // URL building
    // ------------------------------------------------------------------------

    /// Builds `{host}/{segments...}?api-version={default}`.
    ///
    /// Each segment is percent-encoded, so a `/` inside a segment cannot
    /// address a different resource.
    pub(crate) fn endpoint(&self, host: Host, segments: &[&str]) -> Result<Url, ApiError> {
        self.endpoint_with_version(host, segments, &self.config.api_version)
    }

    /// Like [`endpoint`](Self::endpoint) with an explicit `api-version`.
    pub(crate) fn endpoint_with_version(
        &self,
        host: Host,
        segments: &[&str],
        api_version: &str,
    ) -> Result<Url, ApiError> {
        let base = self.config.host_url(host);
        let mut url = Url::parse(base).map_err(|e| ApiError::InvalidRequest {
            message: format!("Invalid base URL '{base}': {e}"),
        })?;

        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidRequest {
                message: format!("Base URL '{base}' cannot carry a path"),
            })?
            .pop_if_empty()
            .extend(segments);

        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    /// The canonical URL of a work item, as used in relation links.
    pub(crate) fn work_item_api_url(&self, id: u32) -> Result<Url, ApiError> {
        let mut url = self.endpoint(Host::Core, &["_apis", "wit", "workItems", &id.to_string()])?;
        url.set_query(None);
        Ok(url)
    }

    // ------------------------------------------------------------------------
    // Verbs
    // ------------------------------------------------------------------------

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, AppError> {
        let response = self.send(Method::GET, url, |req| req).await?;
        Self::decode(response).await
    }

    /// GET returning the body together with its `ETag` header.
    pub(crate) async fn get_with_etag<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<(T, Option<String>), AppError> {
        let response = self.send(Method::GET, url, |req| req).await?;
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok((Self::decode(response).await?, etag))
    }

    pub(crate) async fn post<B, T>(&self, url: Url, body: &B) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, url, |req| req.json(body)).await?;
        Self::decode(response).await
    }

    /// POST without a body, for endpoints addressed entirely by path.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, url: Url) -> Result<T, AppError> {
        let response = self
            .send(Method::POST, url, |req| req.header(CONTENT_LENGTH, "0"))
            .await?;
        Self::decode(response).await
    }

    pub(crate) async fn patch<B, T>(&self, url: Url, body: &B) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PATCH, url, |req| req.json(body)).await?;
        Self::decode(response).await
    }

    /// PUT, optionally conditional on `if_match`.
    pub(crate) async fn put<B, T>(
        &self,
        url: Url,
        body: &B,
        if_match: Option<&str>,
    ) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let if_match = if_match
            .map(HeaderValue::from_str)
            .transpose()
            .map_err(|e| ApiError::InvalidRequest {
                message: format!("Invalid version value: {e}"),
            })?;

        let response = self
            .send(Method::PUT, url, |req| {
                let req = req.json(body);
                match if_match {
                    Some(value) => req.header(IF_MATCH, value),
                    None => req,
                }
            })
            .await?;
        Self::decode(response).await
    }

    /// Sends a JSON Patch document (work item create, update and link).
    pub(crate) async fn json_patch<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        operations: &[PatchOperation],
    ) -> Result<T, AppError> {
        let body = serde_json::to_vec(operations).map_err(|e| ApiError::InvalidRequest {
            message: format!("Failed to serialize patch document: {e}"),
        })?;
        let response = self
            .send(method, url, |req| {
                req.header(CONTENT_TYPE, JSON_PATCH).body(body)
            })
            .await?;
        Self::decode(response).await
    }

    // ------------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------------

    /// Issues one request. The rate limiter is checked before anything
    /// touches the network.
    async fn send(
        &self,
        method: Method,
        url: Url,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response, AppError> {
        self.limiter.check()?;

        let start = Instant::now();
        tracing::debug!(method = %method, url = %url, "Starting Azure DevOps request");

        let request = self
            .http
            .request(method.clone(), url.clone())
            .basic_auth("", Some(self.pat.expose()))
            .header(ACCEPT, "application/json");

        let response = build(request).send().await.map_err(|e| {
            let elapsed_ms = elapsed_ms(start);
            if e.is_timeout() {
                tracing::error!(
                    url = %url,
                    elapsed_ms,
                    timeout_ms = self.config.timeout_ms,
                    "Azure DevOps request timed out"
                );
                ApiError::Timeout {
                    timeout_ms: self.config.timeout_ms,
                }
            } else {
                tracing::error!(url = %url, elapsed_ms, error = %e, "Azure DevOps request failed");
                ApiError::Network {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        tracing::debug!(
            method = %method,
            url = %url,
            status = %status,
            elapsed_ms = elapsed_ms(start),
            "Azure DevOps response received"
        );

        // An expired or wrong PAT yields a 203 sign-in page rather than 401.
        if status == StatusCode::NON_AUTHORITATIVE_INFORMATION {
            tracing::error!(url = %url, "Azure DevOps rejected the personal access token");
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: "Authentication failed, check the personal access token".to_string(),
            }
            .into());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            tracing::error!(url = %url, status = status.as_u16(), message = %message, "Azure DevOps request rejected");
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
        let bytes = response.bytes().await.map_err(|e| ApiError::Network {
            message: format!("Failed to read response body: {e}"),
        })?;

        let slice: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(slice).map_err(|e| {
            ApiError::UnexpectedResponse {
                message: format!("Failed to parse response: {e}"),
            }
            .into()
        })
    }
}

/// Picks the body's `message` field, falling back to the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string())
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::devops::types::ListResponse;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DevOpsClient {
        DevOpsClient::new("test-pat", ClientConfig::with_single_host(server.uri())).unwrap()
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = DevOpsClient::new(
            "pat",
            ClientConfig::for_organization("contoso"),
        )
        .unwrap();

        let url = client
            .endpoint(Host::Core, &["My Project", "_apis", "git", "repositories"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://dev.azure.com/contoso/My%20Project/_apis/git/repositories?api-version=7.0"
        );

        let url = client.endpoint(Host::Core, &["a/b"]).unwrap();
        assert!(url.path().ends_with("/a%2Fb"));
    }

    #[test]
    fn test_endpoint_hosts_and_versions() {
        let client = DevOpsClient::new("pat", ClientConfig::for_organization("contoso")).unwrap();

        let url = client
            .endpoint_with_version(Host::Release, &["P", "_apis", "release", "releases"], "7.0-preview.7")
            .unwrap();
        assert_eq!(url.host_str(), Some("vsrm.dev.azure.com"));
        assert_eq!(url.query(), Some("api-version=7.0-preview.7"));
    }

    #[test]
    fn test_work_item_api_url_has_no_query() {
        let client = DevOpsClient::new("pat", ClientConfig::for_organization("contoso")).unwrap();
        let url = client.work_item_api_url(12).unwrap();
        assert_eq!(url.as_str(), "https://dev.azure.com/contoso/_apis/wit/workItems/12");
    }

    #[test]
    fn test_error_message_prefers_body() {
        let msg = error_message(StatusCode::NOT_FOUND, r#"{"message":"TF200016: project does not exist"}"#);
        assert_eq!(msg, "TF200016: project does not exist");

        let msg = error_message(StatusCode::NOT_FOUND, "<html/>");
        assert_eq!(msg, "Not Found");
    }

    #[tokio::test]
    async fn test_get_sends_basic_auth() {
        let server = MockServer::start().await;
        // base64(":test-pat")
        Mock::given(method("GET"))
            .and(path("/_apis/projects"))
            .and(query_param("api-version", "7.0"))
            .and(header("authorization", "Basic OnRlc3QtcGF0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "value": [{ "id": "1", "name": "Alpha" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = client.endpoint(Host::Core, &["_apis", "projects"]).unwrap();
        let list: ListResponse<Value> = client.get(url).await.unwrap();
        assert_eq!(list.value.len(), 1);
    }

    #[tokio::test]
    async fn test_http_error_maps_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "message": "Work item 9 does not exist" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = client.endpoint(Host::Core, &["_apis", "wit", "workitems", "9"]).unwrap();
        let err = client.get::<Value>(url).await.unwrap_err();
        assert_eq!(err.to_string(), "404: Work item 9 does not exist");
    }

    #[tokio::test]
    async fn test_203_is_authentication_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(203).set_body_string("<html>sign in</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = client.endpoint(Host::Core, &["_apis", "projects"]).unwrap();
        let err = client.get::<Value>(url).await.unwrap_err();
        assert!(matches!(err, AppError::Api(ref e) if e.is_authentication_failure()));
    }

    #[tokio::test]
    async fn test_empty_body_decodes_as_null() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = client.endpoint(Host::Core, &["x"]).unwrap();
        let out: Option<Value> = client.patch(url, &json!({ "a": 1 })).await.unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_json_patch_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(header("content-type", JSON_PATCH))
            .and(body_json(json!([
                { "op": "replace", "path": "/fields/System.Title", "value": "New" }
            ])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = client.endpoint(Host::Core, &["_apis", "wit", "workitems", "1"]).unwrap();
        let ops = [PatchOperation::replace_field("System.Title", "New")];
        let _: Value = client.json_patch(Method::PATCH, url, &ops).await.unwrap();
    }

    #[tokio::test]
    async fn test_put_with_if_match_and_etag() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(header("if-match", "\"abc\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "path": "/Home" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "\"abc\"")
                    .set_body_json(json!({ "path": "/Home" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = client.endpoint(Host::Core, &["w"]).unwrap();
        let (_, etag): (Value, _) = client.get_with_etag(url.clone()).await.unwrap();
        assert_eq!(etag.as_deref(), Some("\"abc\""));

        let _: Value = client
            .put(url, &json!({ "content": "x" }), etag.as_deref())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rate_limited_request_never_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
            .expect(2)
            .mount(&server)
            .await;

        let client =
            client_for(&server).with_rate_limiter(Arc::new(RateLimiter::new(2, 60_000)));
        let url = client.endpoint(Host::Core, &["_apis", "projects"]).unwrap();

        for _ in 0..2 {
            let _: ListResponse<Value> = client.get(url.clone()).await.unwrap();
        }
        let err = client.get::<ListResponse<Value>>(url).await.unwrap_err();
        assert!(matches!(err, AppError::RateLimit(_)));
        assert!(err.to_string().starts_with("Rate limit exceeded"));
    }

    #[tokio::test]
    async fn test_network_error() {
        let client = DevOpsClient::new(
            "pat",
            ClientConfig::with_single_host("http://127.0.0.1:9").with_timeout_ms(2_000),
        )
        .unwrap();
        let url = client.endpoint(Host::Core, &["_apis", "projects"]).unwrap();
        let err = client.get::<Value>(url).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
