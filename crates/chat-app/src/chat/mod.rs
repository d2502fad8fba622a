/// Event contracts between the widget, its reply worker and the host.
pub mod events;
/// Pure HTML projection of the message list.
pub mod render;
pub mod widget;
pub mod worker;

pub use events::{
    Generation, IgnoreReason, ReplyEvent, ReplyOutcome, RequestTarget, SendOutcome, WidgetEvent,
};
pub use render::{WidgetView, escape_html, render_message, render_messages};
pub use widget::ChatWidget;
pub use worker::{ReplyHandle, spawn_reply_worker};
