use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::backend::Backend;
use crate::client_logger::ClientLogger;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, CLIENT_UNAUTHORIZED,
};
use crate::types::{
    ChatRecord, ChatReply, ChatRequest, Credentials, CreatedThread, Health, RefreshRequest,
    RefreshedToken, Thread, ThreadId, ThreadTitle, TokenPair,
};

/// Which error mapping applies to an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndpointKind {
    /// Signup, login, refresh: every failure is an authentication failure.
    Auth,
    /// Bearer-protected endpoints: 401 means the access token is stale.
    Resource,
}

/// Client for the FlowChat API.
#[derive(Clone)]
pub struct FlowChat {
    client: ReqwestClient,
    base_url: Url,
    refresh_path: String,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl FlowChat {
    /// Create a new client for the API rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(&ClientConfig::new().with_base_url(base_url))
    }

    /// Create a new client from a [`ClientConfig`].
    ///
    /// The base URL falls back to the `FLOWCHAT_API_BASE` environment variable.
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.resolved_base_url())?;
        if base_url.cannot_be_a_base() {
            return Err(Error::url(
                format!("{base_url} cannot be used as a base URL"),
                None,
            ));
        }

        let timeout = config.timeout();
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            refresh_path: config.refresh.path.clone(),
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that sees every request.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The API root every path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, path: &str, access: Option<&str>) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        let mut builder = self
            .client
            .request(method, url)
            .header(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = access {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// Convert a transport failure (no response received) into our Error type.
    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Send a request, recording metrics and logging, and turn non-2xx into errors.
    async fn execute(
        &self,
        kind: EndpointKind,
        method: &Method,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Response> {
        CLIENT_REQUESTS.click();
        if let Some(logger) = &self.logger {
            logger.log_request(method.as_str(), path);
        }

        let start = Instant::now();
        let sent = builder.send().await;
        let elapsed = start.elapsed();
        CLIENT_REQUEST_DURATION.add(elapsed.as_secs_f64());

        let outcome = match sent {
            Err(e) => Err(self.transport_error(e)),
            Ok(response) => {
                if let Some(logger) = &self.logger {
                    logger.log_response(
                        method.as_str(),
                        path,
                        response.status().as_u16(),
                        elapsed,
                    );
                }
                if response.status().is_success() {
                    Ok(response)
                } else {
                    Err(Self::process_error_response(kind, response).await)
                }
            }
        };

        if let Err(err) = &outcome {
            CLIENT_REQUEST_ERRORS.click();
            if err.is_unauthorized() {
                CLIENT_UNAUTHORIZED.click();
            }
            if let Some(logger) = &self.logger {
                logger.log_failure(method.as_str(), path, err);
            }
        }
        outcome
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(kind: EndpointKind, response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        map_error(kind, status_code, &error_message(&error_body), retry_after)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, access: Option<&str>) -> Result<T> {
        let method = Method::GET;
        let builder = self.request(method.clone(), path, access)?;
        let response = self
            .execute(EndpointKind::Resource, &method, path, builder)
            .await?;
        parse_json(response).await
    }

    async fn post_json<B, T>(
        &self,
        kind: EndpointKind,
        path: &str,
        access: Option<&str>,
        body: &B,
    ) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let method = Method::POST;
        let builder = self.request(method.clone(), path, access)?.json(body);
        let response = self.execute(kind, &method, path, builder).await?;
        parse_json(response).await
    }
}

#[async_trait::async_trait]
impl Backend for FlowChat {
    async fn signup(&self, credentials: &Credentials) -> Result<()> {
        let method = Method::POST;
        let path = "signup/";
        let builder = self.request(method.clone(), path, None)?.json(credentials);
        self.execute(EndpointKind::Auth, &method, path, builder)
            .await?;
        Ok(())
    }

    async fn obtain_token(&self, credentials: &Credentials) -> Result<TokenPair> {
        self.post_json(EndpointKind::Auth, "token/", None, credentials)
            .await
    }

    async fn refresh_token(&self, refresh: &str) -> Result<RefreshedToken> {
        let body = RefreshRequest {
            refresh: refresh.to_string(),
        };
        self.post_json(EndpointKind::Auth, &self.refresh_path, None, &body)
            .await
    }

    async fn list_threads(&self, access: &str) -> Result<Vec<Thread>> {
        self.get_json("threads/", Some(access)).await
    }

    async fn create_thread(&self, access: &str) -> Result<CreatedThread> {
        let method = Method::POST;
        let path = "threads/";
        let builder = self
            .request(method.clone(), path, Some(access))?
            .json(&serde_json::json!({}));
        let response = self
            .execute(EndpointKind::Resource, &method, path, builder)
            .await?;
        let body = read_body(response).await?;
        // A body without an id is a valid answer; only the id matters.
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }

    async fn delete_thread(&self, access: &str, id: ThreadId) -> Result<()> {
        let method = Method::DELETE;
        let path = format!("threads/{id}/");
        let builder = self.request(method.clone(), &path, Some(access))?;
        self.execute(EndpointKind::Resource, &method, &path, builder)
            .await?;
        Ok(())
    }

    async fn thread_messages(&self, access: &str, id: ThreadId) -> Result<Vec<ChatRecord>> {
        self.get_json(&format!("threads/{id}/messages/"), Some(access))
            .await
    }

    async fn thread_title(&self, access: &str, id: ThreadId) -> Result<ThreadTitle> {
        self.get_json(&format!("threads/{id}/title/"), Some(access))
            .await
    }

    async fn chat(&self, access: &str, request: &ChatRequest) -> Result<ChatReply> {
        self.post_json(EndpointKind::Resource, "chat/", Some(access), request)
            .await
    }

    async fn recent_records(&self, access: &str) -> Result<Vec<ChatRecord>> {
        self.get_json("chat/", Some(access)).await
    }

    async fn health(&self) -> Result<Health> {
        self.get_json("health/", None).await
    }
}

async fn read_body(response: Response) -> Result<String> {
    response.text().await.map_err(|e| {
        Error::http_client(
            format!("Failed to read response body: {}", e),
            Some(Box::new(e)),
        )
    })
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = read_body(response).await?;
    serde_json::from_str(&body).map_err(|e| {
        Error::serialization(
            format!("Failed to parse response: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Extract the human-readable message from an error body.
///
/// Looks at `detail`, `message` and `error` in that order, then at field
/// errors (`{"username": ["..."]}`), and finally falls back to the raw body.
fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "Unknown error".to_string();
    }
    let Ok(serde_json::Value::Object(fields)) = serde_json::from_str::<serde_json::Value>(trimmed)
    else {
        return trimmed.to_string();
    };
    for key in ["detail", "message", "error"] {
        if let Some(value) = fields.get(key)
            && let Some(text) = flatten_value(value)
        {
            return text;
        }
    }
    let field_errors = fields
        .iter()
        .filter_map(|(field, value)| flatten_value(value).map(|text| format!("{field}: {text}")))
        .collect::<Vec<_>>();
    if field_errors.is_empty() {
        trimmed.to_string()
    } else {
        field_errors.join("; ")
    }
}

fn flatten_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts = items.iter().filter_map(flatten_value).collect::<Vec<_>>();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        }
        _ => None,
    }
}

/// Map HTTP status code to appropriate error type
fn map_error(kind: EndpointKind, status_code: u16, message: &str, retry_after: Option<u64>) -> Error {
    if kind == EndpointKind::Auth {
        return Error::authentication(Some(status_code), message);
    }
    match status_code {
        400 => Error::bad_request(message),
        401 => Error::unauthorized(message),
        403 => Error::permission(message),
        404 => Error::not_found(message, None, None),
        408 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RefreshContract;

    #[test]
    fn test_client_creation() {
        let client = FlowChat::new("https://chat.example.com/api").unwrap();
        assert_eq!(client.base_url.as_str(), "https://chat.example.com/api/");
        assert_eq!(client.refresh_path, "token/refresh/");
        assert_eq!(client.timeout, Duration::from_secs(60));

        let config = ClientConfig::new()
            .with_base_url("https://chat.example.com/api/")
            .with_timeout(Duration::from_secs(30))
            .with_refresh(RefreshContract {
                path: "token/".to_string(),
                persist_rotated: false,
            });
        let client = FlowChat::with_config(&config).unwrap();
        assert_eq!(client.refresh_path, "token/");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(FlowChat::new("not a url").is_err());
        assert!(FlowChat::new("mailto:someone@example.com").is_err());
    }

    #[test]
    fn endpoints_join_under_base_path() {
        let client = FlowChat::new("https://chat.example.com/api/").unwrap();
        assert_eq!(
            client.endpoint("threads/7/messages/").unwrap().as_str(),
            "https://chat.example.com/api/threads/7/messages/"
        );
        assert_eq!(
            client.endpoint("/token/refresh/").unwrap().as_str(),
            "https://chat.example.com/api/token/refresh/"
        );
    }

    #[test]
    fn error_message_prefers_detail() {
        assert_eq!(
            error_message(r#"{"detail": "Given token not valid for any token type", "code": "token_not_valid"}"#),
            "Given token not valid for any token type"
        );
        assert_eq!(
            error_message(r#"{"error": "Username already exists."}"#),
            "Username already exists."
        );
        assert_eq!(
            error_message(r#"{"message": "nope", "error": "ignored"}"#),
            "nope"
        );
    }

    #[test]
    fn error_message_field_errors_and_raw_bodies() {
        assert_eq!(
            error_message(r#"{"thread_id": ["This field is required."]}"#),
            "thread_id: This field is required."
        );
        assert_eq!(error_message("<h1>Bad Gateway</h1>"), "<h1>Bad Gateway</h1>");
        assert_eq!(error_message("   "), "Unknown error");
    }

    #[test]
    fn status_mapping_depends_on_endpoint() {
        let err = map_error(EndpointKind::Auth, 401, "bad credentials", None);
        assert!(err.is_authentication());
        assert_eq!(err.status_code(), Some(401));

        let err = map_error(EndpointKind::Resource, 401, "expired", None);
        assert!(err.is_unauthorized());

        let err = map_error(EndpointKind::Resource, 429, "Daily quota exceeded.", Some(30));
        assert!(err.is_rate_limit());

        let err = map_error(EndpointKind::Resource, 503, "down", None);
        assert!(err.is_server_error());

        let err = map_error(EndpointKind::Resource, 418, "teapot", None);
        assert_eq!(err.status_code(), Some(418));
    }
}
