//! Telegram channel: long-poll getUpdates, exportChatInviteLink, and permalinks.

use crate::channels::inbound::{ChatKind, InboundMessage};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const LONG_POLL_TIMEOUT: u64 = 30;

#[derive(Debug, Deserialize)]
struct GetUpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<TelegramUpdate>,
}

#[derive(Debug, Deserialize)]
struct ExportInviteLinkResponse {
    ok: bool,
    #[serde(default)]
    result: Option<String>,
}

/// Telegram update payload (getUpdates result item).
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Telegram channel connector: long-polls for updates and exposes the
/// platform primitives the pipeline consumes (invite link export).
pub struct TelegramChannel {
    token: String,
    api_base: String,
    running: AtomicBool,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(token: String) -> Self {
        Self::with_api_base(token, TELEGRAM_API_BASE.to_string())
    }

    pub fn with_api_base(token: String, api_base: String) -> Self {
        Self {
            token,
            api_base: api_base.trim_end_matches('/').to_string(),
            running: AtomicBool::new(false),
            client: reqwest::Client::new(),
        }
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the long-poll loop after the current iteration.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Start the getUpdates long-poll loop and forward text messages to the
    /// controller. Returns a handle to await on shutdown.
    pub fn start_inbound(
        self: Arc<Self>,
        inbound_tx: mpsc::Sender<InboundMessage>,
    ) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        log::info!("telegram channel: starting getUpdates long-poll loop");
        tokio::spawn(async move {
            run_get_updates_loop(self, inbound_tx).await;
        })
    }

    /// Call Telegram getUpdates (long poll). Returns (updates, next_offset).
    async fn get_updates(
        &self,
        offset: Option<i64>,
    ) -> Result<(Vec<TelegramUpdate>, Option<i64>), String> {
        let url = format!(
            "{}/bot{}/getUpdates?timeout={}",
            self.api_base, self.token, LONG_POLL_TIMEOUT
        );
        let url = if let Some(off) = offset {
            format!("{}&offset={}", url, off)
        } else {
            url
        };
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("getUpdates failed: {} {}", status, body));
        }
        let data: GetUpdatesResponse = res.json().await.map_err(|e| e.to_string())?;
        if !data.ok {
            return Err("getUpdates returned ok: false".to_string());
        }
        let next_offset = data
            .result
            .iter()
            .map(|u| u.update_id)
            .max()
            .map(|id| id + 1);
        Ok((data.result, next_offset))
    }

    /// Export the chat's primary invite link via exportChatInviteLink.
    /// Fails for chats where the bot lacks admin rights; callers decide
    /// whether that is tolerable.
    pub async fn export_chat_invite_link(&self, chat_id: i64) -> Result<String, String> {
        let url = format!("{}/bot{}/exportChatInviteLink", self.api_base, self.token);
        let body = serde_json::json!({ "chat_id": chat_id });
        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("exportChatInviteLink failed: {} {}", status, body));
        }
        let data: ExportInviteLinkResponse = res.json().await.map_err(|e| e.to_string())?;
        if !data.ok {
            return Err("exportChatInviteLink returned ok: false".to_string());
        }
        data.result
            .ok_or_else(|| "exportChatInviteLink returned no link".to_string())
    }
}

/// Build a t.me permalink to a message. Public rooms use the username form;
/// private supergroups use the `/c/` form with the `-100` prefix stripped
/// from the numeric chat id.
pub fn message_permalink(room_id: i64, room_username: Option<&str>, message_id: i64) -> String {
    match room_username {
        Some(username) if !username.is_empty() => {
            format!("https://t.me/{}/{}", username, message_id)
        }
        _ => {
            let id = room_id.to_string();
            let internal = id.strip_prefix("-100").unwrap_or(&id);
            format!("https://t.me/c/{}/{}", internal, message_id)
        }
    }
}

async fn run_get_updates_loop(
    channel: Arc<TelegramChannel>,
    inbound_tx: mpsc::Sender<InboundMessage>,
) {
    let mut offset: Option<i64> = None;
    while channel.running() {
        match channel.get_updates(offset).await {
            Ok((updates, next)) => {
                offset = next;
                for u in updates {
                    if let Some(msg) = u.message {
                        if let Some(text) = msg.text {
                            let inbound = InboundMessage {
                                text,
                                room_title: msg.chat.title.unwrap_or_default(),
                                room_kind: msg.chat.kind,
                                room_id: msg.chat.id,
                                message_id: msg.message_id,
                                room_username: msg.chat.username,
                            };
                            if inbound_tx.send(inbound).await.is_err() {
                                log::debug!("telegram: inbound channel closed, stopping loop");
                                return;
                            }
                        }
                    }
                }
            }
            Err(e) => {
                log::debug!("telegram getUpdates error: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
            }
        }
    }
    log::info!("telegram channel: getUpdates loop stopped");
}
