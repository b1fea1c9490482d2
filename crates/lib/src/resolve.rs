//! Chat-title resolution: extract the client name from a room title.
//!
//! Titles follow the team's naming convention: the client name and the
//! org's own name (the anchor, e.g. "WeDo") joined by `+`, `x`, or `&`.

use anyhow::{Context, Result};
use regex::Regex;

/// Resolves room titles like `"Acme Corp + WeDo"` or `"WeDo x Acme"` to the
/// client side of the separator.
pub struct TitleResolver {
    /// `<client> <sep> Anchor` — tried first.
    client_first: Regex,
    /// `Anchor <sep> <client>`.
    anchor_first: Regex,
}

impl TitleResolver {
    /// Build a resolver for the given anchor token. The anchor is matched
    /// literally and case-insensitively.
    pub fn new(anchor: &str) -> Result<Self> {
        let anchor = regex::escape(anchor.trim());
        let client_first = Regex::new(&format!(r"(?i)^(.+?)\s*[+x&]\s*{}\s*$", anchor))
            .context("building client-first title pattern")?;
        let anchor_first = Regex::new(&format!(r"(?i)^\s*{}\s*[+x&]\s*(.+)$", anchor))
            .context("building anchor-first title pattern")?;
        Ok(Self {
            client_first,
            anchor_first,
        })
    }

    /// Extract the client name from a room title. The client-first pattern
    /// wins when both shapes would match. Returns `None` for titles that
    /// follow neither shape.
    pub fn resolve(&self, title: &str) -> Option<String> {
        if title.trim().is_empty() {
            return None;
        }
        for pattern in [&self.client_first, &self.anchor_first] {
            if let Some(caps) = pattern.captures(title) {
                let client = caps.get(1).map(|m| m.as_str().trim().to_string())?;
                if !client.is_empty() {
                    return Some(client);
                }
            }
        }
        None
    }
}
