use colorchat_client::{ChatExchange, TransportError};

/// History generation a request was issued under. Bumped on every clear so
/// replies to requests made before the clear can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u64);

impl Generation {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Routing key for one outstanding request.
///
/// Must change on every send so a late reply can never be applied to a
/// different request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTarget {
    pub generation: Generation,
    pub request_id: u64,
}

impl RequestTarget {
    pub const fn new(generation: Generation, request_id: u64) -> Self {
        Self {
            generation,
            request_id,
        }
    }
}

/// Signals the host acts on. None of them carry state the widget needs back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    FocusInput,
    ScrollToLatest,
    TypingStarted,
    TypingStopped,
    HistoryPersisted { message_count: usize },
}

/// Result of one request as seen by the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Answered {
        response: String,
        timestamp: Option<String>,
    },
    Refused {
        status: u16,
        error: String,
    },
    /// No usable response: network failure, undecodable body or timeout.
    Unreachable { details: String },
}

impl From<Result<ChatExchange, TransportError>> for ReplyOutcome {
    fn from(result: Result<ChatExchange, TransportError>) -> Self {
        match result {
            Ok(ChatExchange::Answered {
                response,
                timestamp,
            }) => Self::Answered {
                response,
                timestamp,
            },
            Ok(ChatExchange::Refused { status, error }) => Self::Refused { status, error },
            Err(error) => Self::Unreachable {
                details: error.to_string(),
            },
        }
    }
}

/// Posted by the reply worker once its request settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEvent {
    pub target: RequestTarget,
    pub outcome: ReplyOutcome,
}

/// Why a send did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    BlankInput,
    AwaitingReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Dispatched(RequestTarget),
    Ignored(IgnoreReason),
}

impl SendOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched(_))
    }
}
