use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Sent,
    Received,
}

/// What a node reports to whoever is displaying the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChatEvent {
    Message {
        text: String,
        direction: Direction,
        user: String,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },
    Error {
        text: String,
        error: String,
    },
}

impl ChatEvent {
    pub fn message(
        text: impl Into<String>,
        direction: Direction,
        user: impl Into<String>,
        timestamp: OffsetDateTime,
    ) -> Self {
        ChatEvent::Message {
            text: text.into(),
            direction,
            user: user.into(),
            timestamp,
        }
    }

    pub fn error(text: impl Into<String>, error: impl Into<String>) -> Self {
        ChatEvent::Error {
            text: text.into(),
            error: error.into(),
        }
    }
}

/// Receives events as they happen. Must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ChatEvent);
}

/// Sink backed by an unbounded `flume` channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: flume::Sender<ChatEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, flume::Receiver<ChatEvent>) {
        let (tx, rx) = flume::unbounded();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ChatEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("event receiver dropped, discarding event");
        }
    }
}
