//! HTML projection of the message list.
//!
//! Rendering never feeds back into state: the markup is rebuilt from the
//! message list on every call.

use colorchat_storage::Message;

use crate::texts::TYPING_LABEL;

/// Element id of the transient typing block.
pub const TYPING_INDICATOR_ID: &str = "typing-indicator";

/// Snapshot handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetView {
    pub open: bool,
    pub awaiting_reply: bool,
    pub message_count: usize,
    pub markup: String,
}

/// Escapes text for use as HTML element content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(character),
        }
    }

    escaped
}

/// Timestamps come from the local clock or the server and are written as-is.
pub fn render_message(message: &Message) -> String {
    format!(
        "<div class=\"message {sender}\"><div class=\"message-bubble\">{text}<div class=\"message-time\">{timestamp}</div></div></div>",
        sender = message.sender.as_str(),
        text = escape_html(&message.text),
        timestamp = message.timestamp,
    )
}

pub fn render_typing_indicator() -> String {
    format!(
        "<div class=\"message bot\" id=\"{TYPING_INDICATOR_ID}\"><div class=\"message-bubble\"><div class=\"typing-indicator\">{TYPING_LABEL}<div class=\"typing-dots\"><span></span><span></span><span></span></div></div></div></div>"
    )
}

pub fn render_messages(messages: &[Message], typing: bool) -> String {
    let mut markup = messages.iter().map(render_message).collect::<String>();
    if typing {
        markup.push_str(&render_typing_indicator());
    }
    markup
}
