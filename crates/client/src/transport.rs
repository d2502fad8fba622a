use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Default request path of the chat endpoint.
pub const DEFAULT_CHAT_PATH: &str = "/chat";

/// Applied to every request unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub base_url: String,
    pub chat_path: String,
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().to_string(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_chat_path(mut self, chat_path: impl Into<String>) -> Self {
        self.chat_path = chat_path.into().trim().to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL the message is posted to.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.chat_path.trim_start_matches('/')
        )
    }
}

/// JSON body sent to the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

/// Body of a 2xx reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct AnswerBody {
    pub response: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Body of a non-2xx reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RefusalBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// A completed request/response exchange. Transport failures are not
/// exchanges and come back as [`TransportError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatExchange {
    /// 2xx status with `{response, timestamp}`.
    Answered {
        response: String,
        timestamp: Option<String>,
    },
    /// Non-2xx status with `{error}`.
    Refused { status: u16, error: String },
}

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TransportError {
    #[snafu(display("chat endpoint '{endpoint}' is not a valid URL: {details}"))]
    InvalidEndpoint {
        stage: &'static str,
        endpoint: String,
        details: String,
    },
    #[snafu(display("failed to build HTTP client on `{stage}`: {source}"))]
    BuildClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("no response from {endpoint} on `{stage}`: {source}"))]
    Request {
        stage: &'static str,
        endpoint: String,
        source: reqwest::Error,
    },
    #[snafu(display("failed to read response body from {endpoint}: {source}"))]
    ReadBody {
        stage: &'static str,
        endpoint: String,
        source: reqwest::Error,
    },
    #[snafu(display("response with status {status} is not the expected JSON: {source}"))]
    DecodeBody {
        stage: &'static str,
        status: u16,
        source: serde_json::Error,
    },
}

impl TransportError {
    /// True when the request was abandoned because the timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Request { source, .. } | Self::ReadBody { source, .. } => source.is_timeout(),
            Self::InvalidEndpoint { .. } | Self::BuildClient { .. } | Self::DecodeBody { .. } => {
                false
            }
        }
    }
}

/// The remote side of the conversation.
pub trait ChatTransport: Send + Sync {
    fn endpoint(&self) -> &str;
    fn post_message<'a>(&'a self, message: &'a str) -> BoxFuture<'a, TransportResult<ChatExchange>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_doubled_slashes() {
        let config = TransportConfig::new("http://shop.local:5000/");
        assert_eq!(config.endpoint(), "http://shop.local:5000/chat");

        let config = TransportConfig::new("http://shop.local").with_chat_path("api/chat");
        assert_eq!(config.endpoint(), "http://shop.local/api/chat");
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_string(&ChatRequest { message: "Hi" }).unwrap();
        assert_eq!(body, r#"{"message":"Hi"}"#);
    }
}
