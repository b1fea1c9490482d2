//! Client directory: scan the Notion database and fuzzy-match a resolved
//! chat identifier against stored client names.
//!
//! Room titles and CRM names are written independently by humans, so the
//! match rule is containment in either direction on normalized names rather
//! than equality. Normalization also strips URL dressing since client names
//! are sometimes pasted as website addresses.

use crate::config::NotionProperties;
use crate::notion::{NotionClient, NotionError, Page};

/// A matched client record: the page id and the display name it matched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    pub id: String,
    pub display_name: String,
}

/// Normalize a client name for matching: lowercase, strip an `http(s)://`
/// scheme and `www.` prefix, cut at the first `/`, trim trailing slashes
/// and whitespace. Idempotent.
pub fn normalize_name(name: &str) -> String {
    let mut s = name.trim().to_lowercase();
    for scheme in ["https://", "http://"] {
        if let Some(rest) = s.strip_prefix(scheme) {
            s = rest.to_string();
            break;
        }
    }
    if let Some(rest) = s.strip_prefix("www.") {
        s = rest.to_string();
    }
    if let Some(i) = s.find('/') {
        s.truncate(i);
    }
    s.trim_end_matches('/').trim().to_string()
}

/// Containment match on normalized names: either side being a substring of
/// the other counts. Empty strings never match.
pub fn names_match(identifier: &str, candidate: &str) -> bool {
    let a = normalize_name(identifier);
    let b = normalize_name(candidate);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// Scans the configured Notion database for a client record matching an
/// identifier resolved from a chat title.
pub struct DirectoryMatcher {
    client: NotionClient,
    database_id: String,
    client_name_property: String,
}

impl DirectoryMatcher {
    pub fn new(client: NotionClient, database_id: String, properties: &NotionProperties) -> Self {
        Self {
            client,
            database_id,
            client_name_property: properties.client_name.clone(),
        }
    }

    /// Find the first record whose display name matches the identifier by
    /// containment. Walks the database cursor by cursor so directories
    /// larger than one query page are fully scanned. On a miss, logs every
    /// scanned display name so operators can see what the search ran over.
    pub async fn find_record(&self, identifier: &str) -> Result<Option<ClientRecord>, NotionError> {
        let mut scanned: Vec<String> = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .client
                .query_database(&self.database_id, cursor.as_deref())
                .await?;
            if let Some(record) = first_match(
                &page.results,
                identifier,
                &self.client_name_property,
                &mut scanned,
            ) {
                log::debug!(
                    "directory: \"{}\" matched record \"{}\" ({})",
                    identifier,
                    record.display_name,
                    record.id
                );
                return Ok(Some(record));
            }
            if !page.has_more {
                break;
            }
            cursor = page.next_cursor;
            if cursor.is_none() {
                break;
            }
        }
        log::info!(
            "directory: no record matched \"{}\"; scanned {} names: {}",
            identifier,
            scanned.len(),
            scanned.join(", ")
        );
        Ok(None)
    }
}

/// First candidate on one query page whose display name matches, in
/// iteration order. Non-matching names are appended to `scanned` for the
/// miss diagnostic.
fn first_match(
    candidates: &[Page],
    identifier: &str,
    name_property: &str,
    scanned: &mut Vec<String>,
) -> Option<ClientRecord> {
    for candidate in candidates {
        let display_name = candidate.property_plain_text(name_property);
        if names_match(identifier, &display_name) {
            return Some(ClientRecord {
                id: candidate.id.clone(),
                display_name,
            });
        }
        scanned.push(display_name);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_name("  Acme Corp  "), "acme corp");
    }

    #[test]
    fn normalize_strips_scheme_www_and_path() {
        assert_eq!(normalize_name("https://www.acme.com/about"), "acme.com");
        assert_eq!(normalize_name("http://acme.com"), "acme.com");
        assert_eq!(normalize_name("www.acme.com/"), "acme.com");
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["https://www.Acme.com/x", "Acme Corp", "", "a/b/c"] {
            let once = normalize_name(input);
            assert_eq!(normalize_name(&once), once);
        }
    }

    #[test]
    fn match_is_symmetric_containment() {
        assert!(names_match("Acme Corp", "Acme Corporation"));
        assert!(names_match("Acme Corporation", "Acme Corp"));
        assert!(names_match("acme corp", "Acme Corp"));
        assert!(names_match("https://acme.com", "acme.com"));
    }

    #[test]
    fn match_rejects_unrelated_and_empty() {
        assert!(!names_match("Acme", "Globex"));
        assert!(!names_match("", "Globex"));
        assert!(!names_match("Acme", ""));
        assert!(!names_match("", ""));
    }

    fn page(id: &str, name: &str) -> Page {
        serde_json::from_value(json!({
            "id": id,
            "properties": {
                "Client name": { "type": "title", "title": [ { "plain_text": name } ] },
            },
        }))
        .unwrap()
    }

    #[test]
    fn first_match_takes_earliest_candidate_in_order() {
        let candidates = vec![
            page("p1", "Globex"),
            page("p2", "Acme Corporation"),
            page("p3", "Acme Corp"),
        ];
        let mut scanned = Vec::new();
        let record = first_match(&candidates, "Acme Corp", "Client name", &mut scanned).unwrap();
        assert_eq!(record.id, "p2");
        assert_eq!(record.display_name, "Acme Corporation");
        assert_eq!(scanned, vec!["Globex".to_string()]);
    }

    #[test]
    fn first_match_collects_all_names_on_miss() {
        let candidates = vec![page("p1", "Globex"), page("p2", "Initech")];
        let mut scanned = Vec::new();
        assert!(first_match(&candidates, "Acme", "Client name", &mut scanned).is_none());
        assert_eq!(scanned, vec!["Globex".to_string(), "Initech".to_string()]);
    }
}
