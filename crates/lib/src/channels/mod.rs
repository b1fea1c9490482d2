//! Communication channels (Telegram).
//!
//! The connector long-polls for updates and forwards text messages to the
//! ingestion controller. Invite-link export and permalinks are the only
//! outbound platform operations the pipeline uses.

mod inbound;
mod telegram;

pub use inbound::{ChatKind, InboundMessage};
pub use telegram::{message_permalink, TelegramChannel};
