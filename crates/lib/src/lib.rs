//! callsync core library — Telegram channel, Notion client, and the
//! call-summary pipeline (classify, resolve, match, mutate) used by the CLI.

pub mod channels;
pub mod classify;
pub mod config;
pub mod directory;
pub mod ingest;
pub mod init;
pub mod mutate;
pub mod notion;
pub mod resolve;
