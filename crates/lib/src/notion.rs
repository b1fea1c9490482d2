//! Notion API client (https://api.notion.com, version 2022-06-28).
//!
//! Covers the four operations the pipeline needs: query a database page by
//! page, retrieve a page, patch page properties, and create a comment.

use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_API_BASE: &str = "https://api.notion.com";
const NOTION_VERSION: &str = "2022-06-28";

/// Client for the Notion HTTP API.
#[derive(Clone)]
pub struct NotionClient {
    api_base: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum NotionError {
    #[error("notion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("notion api error: {0}")]
    Api(String),
}

/// One page of database query results.
#[derive(Debug, Deserialize)]
pub struct QueryPage {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A Notion page, with properties kept as raw JSON: the pipeline reads only
/// the properties it is configured for and passes the rest through untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: Value,
}

impl Page {
    /// Plain-text concatenation of a title or rich_text property. Missing
    /// property or unexpected shape yields an empty string.
    pub fn property_plain_text(&self, name: &str) -> String {
        let segments = self
            .property_rich_text(name)
            .unwrap_or_default();
        segments
            .iter()
            .filter_map(|seg| seg.get("plain_text").and_then(Value::as_str))
            .collect()
    }

    /// Raw rich-text segment array of a title or rich_text property.
    pub fn property_rich_text(&self, name: &str) -> Option<Vec<Value>> {
        let prop = self.properties.get(name)?;
        let array = prop.get("title").or_else(|| prop.get("rich_text"))?;
        Some(array.as_array().cloned().unwrap_or_default())
    }
}

impl NotionClient {
    pub fn new(token: String, api_base: Option<String>) -> Self {
        let api_base = api_base
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self {
            api_base,
            token,
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_base, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, NotionError> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        Err(NotionError::Api(format!("{} {}", status, body)))
    }

    /// POST /v1/databases/{id}/query — one page of results, starting at the
    /// given cursor. Callers walk `next_cursor` while `has_more` is true.
    pub async fn query_database(
        &self,
        database_id: &str,
        start_cursor: Option<&str>,
    ) -> Result<QueryPage, NotionError> {
        let mut body = json!({});
        if let Some(cursor) = start_cursor {
            body["start_cursor"] = Value::String(cursor.to_string());
        }
        let res = self
            .request(
                reqwest::Method::POST,
                &format!("/v1/databases/{}/query", database_id),
            )
            .json(&body)
            .send()
            .await?;
        let res = Self::check(res).await?;
        Ok(res.json().await?)
    }

    /// GET /v1/pages/{id} — current property values of a page.
    pub async fn retrieve_page(&self, page_id: &str) -> Result<Page, NotionError> {
        let res = self
            .request(reqwest::Method::GET, &format!("/v1/pages/{}", page_id))
            .send()
            .await?;
        let res = Self::check(res).await?;
        Ok(res.json().await?)
    }

    /// PATCH /v1/pages/{id} — partial property update.
    pub async fn update_page(&self, page_id: &str, properties: Value) -> Result<(), NotionError> {
        let body = json!({ "properties": properties });
        let res = self
            .request(reqwest::Method::PATCH, &format!("/v1/pages/{}", page_id))
            .json(&body)
            .send()
            .await?;
        Self::check(res).await?;
        Ok(())
    }

    /// POST /v1/comments — attach a text comment to a page.
    pub async fn create_comment(&self, page_id: &str, text: &str) -> Result<(), NotionError> {
        let body = json!({
            "parent": { "page_id": page_id },
            "rich_text": [ { "text": { "content": text } } ],
        });
        let res = self
            .request(reqwest::Method::POST, "/v1/comments")
            .json(&body)
            .send()
            .await?;
        Self::check(res).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(properties: Value) -> Page {
        Page {
            id: "p1".to_string(),
            properties,
        }
    }

    #[test]
    fn plain_text_concatenates_title_segments() {
        let p = page(json!({
            "Client name": {
                "type": "title",
                "title": [
                    { "plain_text": "Acme " },
                    { "plain_text": "Corporation" },
                ],
            },
        }));
        assert_eq!(p.property_plain_text("Client name"), "Acme Corporation");
    }

    #[test]
    fn plain_text_handles_rich_text_property() {
        let p = page(json!({
            "Last call": {
                "type": "rich_text",
                "rich_text": [ { "plain_text": "2025-01-12\n" } ],
            },
        }));
        assert_eq!(p.property_plain_text("Last call"), "2025-01-12\n");
    }

    #[test]
    fn missing_property_yields_empty() {
        let p = page(json!({}));
        assert_eq!(p.property_plain_text("Client name"), "");
        assert!(p.property_rich_text("Last call").is_none());
    }

    #[test]
    fn query_page_deserializes_cursor_fields() {
        let q: QueryPage = serde_json::from_value(json!({
            "results": [ { "id": "p1", "properties": {} } ],
            "has_more": true,
            "next_cursor": "cur-2",
        }))
        .unwrap();
        assert!(q.has_more);
        assert_eq!(q.next_cursor.as_deref(), Some("cur-2"));
        assert_eq!(q.results.len(), 1);
    }
}
