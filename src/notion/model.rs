use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Deserialize, Debug)]
pub struct DatabaseProperty {
    pub id: String,
    #[serde(rename = "type")]
    pub typ: String,
}

#[derive(Deserialize, Debug)]
pub struct RetrieveDatabaseResp {
    pub id: String,
    #[serde(default)]
    pub title: Vec<Value>,
    pub properties: std::collections::HashMap<String, DatabaseProperty>,
}

/// A database row. `properties` is kept loosely typed; readers go through
/// `crate::fields`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Deserialize, Debug)]
pub struct QueryDatabaseResp {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl QueryDatabaseResp {
    /// Cursor for the next query, if Notion reports more results.
    pub fn continuation(&self) -> Option<&str> {
        if self.has_more {
            self.next_cursor.as_deref().filter(|c| !c.is_empty())
        } else {
            None
        }
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct PageRef {
    pub id: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct CreateFileUploadResponse {
    pub id: String,
    pub upload_url: String,
}
