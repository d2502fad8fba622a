use std::sync::Arc;

mod http;
mod transport;

pub use http::HttpChatTransport;
pub use transport::{
    ChatExchange, ChatRequest, ChatTransport, DEFAULT_CHAT_PATH, DEFAULT_REQUEST_TIMEOUT,
    TransportConfig, TransportError, TransportResult,
};

pub fn create_transport(config: TransportConfig) -> TransportResult<Arc<dyn ChatTransport>> {
    let transport = HttpChatTransport::new(config)?;
    tracing::debug!(endpoint = %transport.endpoint(), "chat transport ready");
    Ok(Arc::new(transport))
}
