//! Record mutation: file a call summary on a matched client page.
//!
//! The history property is read-modify-write: two new segments (date marker
//! and a fixed annotation) are prepended ahead of whatever is already there;
//! prior segments are carried through untouched. The full message text goes
//! into a page comment so it stays recoverable even though the history
//! property only carries the short annotation.

use crate::classify::CallSummary;
use crate::config::NotionProperties;
use crate::notion::{NotionClient, NotionError};
use chrono::NaiveDate;
use serde_json::{json, Value};

/// Annotation prepended to the history property alongside the date marker.
const HISTORY_ANNOTATION: &str = "Call held, summary filed in page comments.\n";

/// Optional room context written to the page's URL properties.
#[derive(Debug, Clone, Default)]
pub struct RoomLinks {
    pub invite_link: Option<String>,
    pub permalink: Option<String>,
}

/// Prepend the date marker and annotation ahead of the existing history
/// segments. Existing segments keep their order; nothing is removed.
pub fn rebuild_history(existing: Vec<Value>, call_date: NaiveDate) -> Vec<Value> {
    let mut segments = Vec::with_capacity(existing.len() + 2);
    segments.push(json!({
        "type": "text",
        "text": { "content": format!("{}\n", call_date.format("%Y-%m-%d")) },
    }));
    segments.push(json!({
        "type": "text",
        "text": { "content": HISTORY_ANNOTATION },
    }));
    segments.extend(existing);
    segments
}

/// Build the single PATCH payload: rebuilt history, completed status, and
/// any link properties. Link properties overwrite prior values.
pub fn build_properties(
    properties: &NotionProperties,
    history: Vec<Value>,
    links: &RoomLinks,
) -> Value {
    let mut props = serde_json::Map::new();
    props.insert(properties.history.clone(), json!({ "rich_text": history }));
    props.insert(
        properties.status.clone(),
        json!({ "select": { "name": properties.completed_status.clone() } }),
    );
    if let Some(ref invite) = links.invite_link {
        props.insert(properties.invite_link.clone(), json!({ "url": invite }));
    }
    if let Some(ref permalink) = links.permalink {
        props.insert(properties.permalink.clone(), json!({ "url": permalink }));
    }
    Value::Object(props)
}

/// Applies a classified summary to a client page.
pub struct RecordMutator {
    client: NotionClient,
    properties: NotionProperties,
}

impl RecordMutator {
    pub fn new(client: NotionClient, properties: NotionProperties) -> Self {
        Self { client, properties }
    }

    /// File the summary on the page: prepend to history, set the completed
    /// status, write link properties, and attach the full text as a comment.
    /// Any API failure propagates; a partial write (update succeeded, comment
    /// failed) is surfaced as the comment error.
    pub async fn apply(
        &self,
        record_id: &str,
        summary: &CallSummary,
        links: &RoomLinks,
    ) -> Result<(), NotionError> {
        let page = self.client.retrieve_page(record_id).await?;
        let existing = page
            .property_rich_text(&self.properties.history)
            .unwrap_or_default();
        let history = rebuild_history(existing, summary.date);
        let props = build_properties(&self.properties, history, links);
        self.client.update_page(record_id, props).await?;
        self.client.create_comment(record_id, &summary.text).await?;
        log::info!(
            "mutate: filed {} summary on record {}",
            summary.date,
            record_id
        );
        Ok(())
    }
}
