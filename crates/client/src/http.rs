use futures::future::BoxFuture;
use snafu::ResultExt;

use super::transport::{
    AnswerBody, BuildClientSnafu, ChatExchange, ChatRequest, ChatTransport, DecodeBodySnafu,
    ReadBodySnafu, RefusalBody, RequestSnafu, TransportConfig, TransportError, TransportResult,
};

/// `POST {base_url}/chat` over reqwest.
#[derive(Debug, Clone)]
pub struct HttpChatTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpChatTransport {
    pub fn new(config: TransportConfig) -> TransportResult<Self> {
        let endpoint = config.endpoint();
        if let Err(error) = reqwest::Url::parse(&endpoint) {
            return Err(TransportError::InvalidEndpoint {
                stage: "http-transport-new",
                endpoint,
                details: error.to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context(BuildClientSnafu {
                stage: "http-transport-build-client",
            })?;

        Ok(Self { client, endpoint })
    }

    async fn exchange(&self, message: &str) -> TransportResult<ChatExchange> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { message })
            .send()
            .await
            .context(RequestSnafu {
                stage: "send-chat-request",
                endpoint: self.endpoint.clone(),
            })?;

        let status = response.status();
        let body = response.text().await.context(ReadBodySnafu {
            stage: "read-chat-response",
            endpoint: self.endpoint.clone(),
        })?;

        if status.is_success() {
            let answer = serde_json::from_str::<AnswerBody>(&body).context(DecodeBodySnafu {
                stage: "decode-chat-answer",
                status: status.as_u16(),
            })?;
            return Ok(ChatExchange::Answered {
                response: answer.response,
                timestamp: answer.timestamp,
            });
        }

        let refusal = serde_json::from_str::<RefusalBody>(&body).context(DecodeBodySnafu {
            stage: "decode-chat-refusal",
            status: status.as_u16(),
        })?;
        let error = refusal
            .error
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        tracing::warn!(
            endpoint = %self.endpoint,
            status = status.as_u16(),
            error = %error,
            "chat endpoint refused the message"
        );
        Ok(ChatExchange::Refused {
            status: status.as_u16(),
            error,
        })
    }
}

impl ChatTransport for HttpChatTransport {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn post_message<'a>(&'a self, message: &'a str) -> BoxFuture<'a, TransportResult<ChatExchange>> {
        Box::pin(self.exchange(message))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn transport_for(server: &MockServer) -> HttpChatTransport {
        HttpChatTransport::new(TransportConfig::new(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn answered_reply_is_passed_through_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "message": "Which primer for wood?" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "An alkyd primer works well.",
                "timestamp": "14:05"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let exchange = transport_for(&server)
            .post_message("Which primer for wood?")
            .await
            .unwrap();

        assert_eq!(
            exchange,
            ChatExchange::Answered {
                response: "An alkyd primer works well.".to_string(),
                timestamp: Some("14:05".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn error_status_carries_server_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "overloaded" })))
            .mount(&server)
            .await;

        let exchange = transport_for(&server).post_message("hi").await.unwrap();
        assert_eq!(
            exchange,
            ChatExchange::Refused {
                status: 500,
                error: "overloaded".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn error_status_without_detail_names_the_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({})))
            .mount(&server)
            .await;

        let exchange = transport_for(&server).post_message("hi").await.unwrap();
        assert_eq!(
            exchange,
            ChatExchange::Refused {
                status: 400,
                error: "HTTP 400".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn non_json_body_is_a_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let error = transport_for(&server).post_message("hi").await.unwrap_err();
        assert!(matches!(error, TransportError::DecodeBody { status: 502, .. }));
        assert!(!error.is_timeout());
    }

    #[tokio::test]
    async fn slow_server_hits_the_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "late", "timestamp": "10:00" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let transport = HttpChatTransport::new(
            TransportConfig::new(server.uri()).with_timeout(Duration::from_millis(100)),
        )
        .unwrap();

        let error = transport.post_message("hi").await.unwrap_err();
        assert!(error.is_timeout());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_failure() {
        // Port 9 on localhost is reserved for discard and normally closed.
        let transport = HttpChatTransport::new(
            TransportConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2)),
        )
        .unwrap();

        let error = transport.post_message("hi").await.unwrap_err();
        assert!(matches!(error, TransportError::Request { .. }));
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        let error = HttpChatTransport::new(TransportConfig::new("not a url")).unwrap_err();
        assert!(matches!(error, TransportError::InvalidEndpoint { .. }));
    }
}
