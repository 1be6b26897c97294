//! HTTP transport trait and reqwest-based implementation shared by adapters.

use std::time::Duration;

use serde_json::Value;

use crate::{ProviderError, ProviderFuture};

/// Upper bound for a single provider call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw reply; status handling is left to the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

pub trait HttpTransport: Send + Sync + std::fmt::Debug {
    /// Posts a JSON body. Only connection-level failures are errors; any
    /// status code the server returns comes back as an [`HttpReply`].
    fn post_json<'a>(
        &'a self,
        request: HttpRequest,
    ) -> ProviderFuture<'a, Result<HttpReply, ProviderError>>;
}

#[cfg(feature = "reqwest-transport")]
pub use self::reqwest_impl::ReqwestTransport;

#[cfg(feature = "reqwest-transport")]
mod reqwest_impl {
    use std::time::Duration;

    use reqwest::Client;

    use super::{DEFAULT_REQUEST_TIMEOUT, HttpReply, HttpRequest, HttpTransport};
    use crate::{ProviderError, ProviderFuture};

    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: Client,
        timeout: Duration,
    }

    impl Default for ReqwestTransport {
        fn default() -> Self {
            Self::new(Client::new())
        }
    }

    impl ReqwestTransport {
        pub fn new(client: Client) -> Self {
            Self {
                client,
                timeout: DEFAULT_REQUEST_TIMEOUT,
            }
        }

        pub fn with_timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }

        pub fn timeout(&self) -> Duration {
            self.timeout
        }
    }

    impl HttpTransport for ReqwestTransport {
        fn post_json<'a>(
            &'a self,
            request: HttpRequest,
        ) -> ProviderFuture<'a, Result<HttpReply, ProviderError>> {
            Box::pin(async move {
                let mut builder = self
                    .client
                    .post(&request.url)
                    .timeout(self.timeout)
                    .json(&request.body);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }

                let response = builder.send().await.map_err(|err| {
                    if err.is_timeout() {
                        ProviderError::transport(format!(
                            "request timed out after {}s: {err}",
                            self.timeout.as_secs()
                        ))
                    } else {
                        ProviderError::transport(err.to_string())
                    }
                })?;

                let status = response.status().as_u16();
                let body = response
                    .text()
                    .await
                    .map_err(|err| ProviderError::transport(err.to_string()))?;

                Ok(HttpReply::new(status, body))
            })
        }
    }
}

#[cfg(all(test, feature = "reqwest-transport"))]
mod tests {
    use std::time::Duration;

    use httptest::{Expectation, Server, matchers::*, responders::*};
    use serde_json::json;

    use super::*;
    use crate::ProviderErrorKind;

    #[tokio::test]
    async fn reqwest_transport_posts_json_with_headers() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/v1/chat/completions"),
                request::headers(contains(("authorization", "Bearer sk-test"))),
                request::body(json_decoded(eq(json!({"model": "m"})))),
            ])
            .respond_with(status_code(200).body(r#"{"ok":true}"#)),
        );

        let transport = ReqwestTransport::default();
        let reply = transport
            .post_json(
                HttpRequest::new(server.url_str("/v1/chat/completions"), json!({"model": "m"}))
                    .bearer_auth("sk-test"),
            )
            .await
            .expect("request should succeed");

        assert_eq!(reply, HttpReply::new(200, r#"{"ok":true}"#));
    }

    #[tokio::test]
    async fn reqwest_transport_returns_error_statuses_as_replies() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/messages"))
                .respond_with(status_code(429).body("slow down")),
        );

        let reply = ReqwestTransport::default()
            .post_json(HttpRequest::new(server.url_str("/messages"), json!({})))
            .await
            .expect("status errors are replies");

        assert_eq!(reply.status, 429);
        assert!(!reply.is_success());
    }

    #[tokio::test]
    async fn reqwest_transport_maps_timeouts_to_transport_failure() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/slow"))
                .respond_with(delay_and_then(Duration::from_millis(500), status_code(200))),
        );

        let transport = ReqwestTransport::default().with_timeout(Duration::from_millis(50));
        assert_eq!(transport.timeout(), Duration::from_millis(50));
        let error = transport
            .post_json(HttpRequest::new(server.url_str("/slow"), json!({})))
            .await
            .expect_err("request should time out");

        assert_eq!(error.kind, ProviderErrorKind::TransportFailure);
        assert!(error.retryable);
    }

    #[test]
    fn default_timeout_is_thirty_seconds() {
        assert_eq!(ReqwestTransport::default().timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs(30));
    }
}
