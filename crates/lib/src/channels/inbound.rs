//! Inbound message from a channel: delivered to the ingestion controller.

use serde::Deserialize;

/// Telegram chat type (`chat.type` in the Bot API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
    /// Any chat type this bot does not know. Kept so one exotic chat in a
    /// getUpdates batch cannot fail the whole batch and stall the offset.
    #[serde(other)]
    Unknown,
}

impl ChatKind {
    /// Summaries are only expected in client group rooms.
    pub fn is_group(self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

/// A text message from a chat room, with the room context the pipeline needs.
/// Created per received update and discarded after processing.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub text: String,
    pub room_title: String,
    pub room_kind: ChatKind,
    pub room_id: i64,
    pub message_id: i64,
    pub room_username: Option<String>,
}
