//! Ingestion controller: the per-message pipeline.
//!
//! One inbound message runs room-kind and text checks, title resolution,
//! classification, directory matching, then mutation — terminating at the
//! first rejection with the reason logged. The record store sits behind a
//! trait so the short-circuit behavior is testable without Notion.

use crate::channels::{message_permalink, InboundMessage, TelegramChannel};
use crate::classify::{classify, CallSummary};
use crate::directory::{ClientRecord, DirectoryMatcher};
use crate::mutate::{RecordMutator, RoomLinks};
use crate::notion::NotionError;
use crate::resolve::TitleResolver;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;

/// The record store as the pipeline sees it: find a client record, then file
/// a summary on it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_record(&self, identifier: &str) -> Result<Option<ClientRecord>, NotionError>;
    async fn apply_summary(
        &self,
        record_id: &str,
        summary: &CallSummary,
        links: &RoomLinks,
    ) -> Result<(), NotionError>;
}

/// Production store: Notion-backed matcher and mutator.
pub struct NotionStore {
    matcher: DirectoryMatcher,
    mutator: RecordMutator,
}

impl NotionStore {
    pub fn new(matcher: DirectoryMatcher, mutator: RecordMutator) -> Self {
        Self { matcher, mutator }
    }
}

#[async_trait]
impl RecordStore for NotionStore {
    async fn find_record(&self, identifier: &str) -> Result<Option<ClientRecord>, NotionError> {
        self.matcher.find_record(identifier).await
    }

    async fn apply_summary(
        &self,
        record_id: &str,
        summary: &CallSummary,
        links: &RoomLinks,
    ) -> Result<(), NotionError> {
        self.mutator.apply(record_id, summary, links).await
    }
}

/// Source of chat invite links. Export is fallible (the bot may lack admin
/// rights); the controller tolerates failure and files without the link.
#[async_trait]
pub trait InviteLinkSource: Send + Sync {
    async fn export_invite_link(&self, chat_id: i64) -> Result<String, String>;
}

#[async_trait]
impl InviteLinkSource for TelegramChannel {
    async fn export_invite_link(&self, chat_id: i64) -> Result<String, String> {
        self.export_chat_invite_link(chat_id).await
    }
}

/// Terminal state of one message's run through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Room is not a group or supergroup.
    SkippedRoomKind,
    /// Message carried no text worth looking at.
    SkippedEmptyText,
    /// Room title matched neither client-title shape.
    ResolutionMiss,
    /// Text does not look like a call summary.
    ClassificationMiss,
    /// No client record matched the resolved identifier.
    RecordNotFound,
    /// Summary filed on the record with this id.
    Filed(String),
}

/// Orchestrates the pipeline for each inbound message.
pub struct IngestionController {
    resolver: TitleResolver,
    store: Arc<dyn RecordStore>,
    invites: Option<Arc<dyn InviteLinkSource>>,
}

impl IngestionController {
    pub fn new(
        resolver: TitleResolver,
        store: Arc<dyn RecordStore>,
        invites: Option<Arc<dyn InviteLinkSource>>,
    ) -> Self {
        Self {
            resolver,
            store,
            invites,
        }
    }

    /// Run one message through the pipeline. Record-store errors propagate;
    /// everything else resolves to a logged `Outcome`.
    pub async fn handle_message(&self, msg: &InboundMessage) -> Result<Outcome, NotionError> {
        if !msg.room_kind.is_group() {
            log::debug!(
                "ingest: skipping {:?} room {} (not a client group)",
                msg.room_kind,
                msg.room_id
            );
            return Ok(Outcome::SkippedRoomKind);
        }
        if msg.text.trim().is_empty() {
            log::debug!("ingest: skipping empty message in room {}", msg.room_id);
            return Ok(Outcome::SkippedEmptyText);
        }
        let identifier = match self.resolver.resolve(&msg.room_title) {
            Some(id) => id,
            None => {
                log::warn!(
                    "ingest: room title \"{}\" does not name a client, skipping",
                    msg.room_title
                );
                return Ok(Outcome::ResolutionMiss);
            }
        };
        let summary = match classify(&msg.text, Utc::now().date_naive()) {
            Some(s) => s,
            None => {
                log::debug!(
                    "ingest: message {} in \"{}\" is not a call summary",
                    msg.message_id,
                    msg.room_title
                );
                return Ok(Outcome::ClassificationMiss);
            }
        };
        let record = match self.store.find_record(&identifier).await? {
            Some(r) => r,
            None => {
                log::info!("ingest: no client record found for \"{}\"", identifier);
                return Ok(Outcome::RecordNotFound);
            }
        };

        // Only collect room context once we know there is a record to file on.
        let links = self.collect_links(msg).await;
        self.store.apply_summary(&record.id, &summary, &links).await?;
        log::info!(
            "ingest: filed summary for \"{}\" on record {} (\"{}\")",
            identifier,
            record.id,
            record.display_name
        );
        Ok(Outcome::Filed(record.id))
    }

    async fn collect_links(&self, msg: &InboundMessage) -> RoomLinks {
        let permalink = message_permalink(msg.room_id, msg.room_username.as_deref(), msg.message_id);
        let invite_link = match &self.invites {
            Some(source) => match source.export_invite_link(msg.room_id).await {
                Ok(link) => Some(link),
                Err(e) => {
                    log::warn!(
                        "ingest: could not export invite link for room {}: {}; filing without it",
                        msg.room_id,
                        e
                    );
                    None
                }
            },
            None => None,
        };
        RoomLinks {
            invite_link,
            permalink: Some(permalink),
        }
    }

    /// Consume inbound messages until the channel closes. A record-store
    /// error aborts only the message that hit it; the loop keeps going.
    pub async fn run(&self, mut inbound_rx: mpsc::Receiver<InboundMessage>) {
        while let Some(msg) = inbound_rx.recv().await {
            if let Err(e) = self.handle_message(&msg).await {
                log::error!(
                    "ingest: failed to process message {} in room {}: {}",
                    msg.message_id,
                    msg.room_id,
                    e
                );
            }
        }
        log::info!("ingest: inbound channel closed, stopping");
    }
}
