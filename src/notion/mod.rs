use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::notion::model::{CreateFileUploadResponse, PageRef, QueryDatabaseResp};
use crate::schema;

pub mod model;

pub use model::{Page, RetrieveDatabaseResp};

const NOTION_API_BASE: &str = "https://api.notion.com/";
const QUERY_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct NotionClient {
    http: Client,
    base_url: Url,
    token: String,
    version: String,
}

impl fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Notion operations used by the daily check and the leftovers CLI.
#[async_trait]
pub trait NotionService: Send + Sync {
    /// All pages whose `Archived` checkbox is unticked, in database order.
    async fn query_unarchived(&self, database_id: &str) -> Result<Vec<Page>>;

    /// Create a page from a full request body; returns the new page id.
    async fn create_page(&self, body: &Value) -> Result<String>;

    /// Patch the properties of an existing page; returns its id.
    async fn update_page(&self, page_id: &str, properties: &Value) -> Result<String>;
}

/// Filter selecting rows that are still in the fridge.
pub fn unarchived_filter() -> Value {
    json!({
        "property": schema::ARCHIVED,
        "checkbox": { "equals": false }
    })
}

pub fn build_query_body(filter: Option<&Value>, start_cursor: Option<&str>) -> Value {
    let mut body = Map::new();
    if let Some(filter) = filter {
        body.insert("filter".into(), filter.clone());
    }
    body.insert("page_size".into(), json!(QUERY_PAGE_SIZE));
    if let Some(cursor) = start_cursor {
        body.insert("start_cursor".into(), json!(cursor));
    }
    Value::Object(body)
}

impl NotionClient {
    pub fn new(token: String, version: String) -> Self {
        let base_url = Url::parse(NOTION_API_BASE).expect("valid default Notion URL");
        Self::with_base_url(token, version, base_url)
    }

    pub fn with_base_url(token: String, version: String, base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent(concat!("fridge-watch/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            token,
            version,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.notion.token.clone(), cfg.notion.version.clone())
    }

    fn authorized(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let endpoint = self
            .base_url
            .join(path)
            .context("invalid Notion base URL")?;
        Ok(self
            .http
            .request(method, endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.version))
    }

    pub fn build_request(&self, method: Method, path: &str, body: &Value) -> Result<reqwest::Request> {
        self.authorized(method, path)?
            .header("Content-Type", "application/json")
            .json(body)
            .build()
            .context("failed to build Notion request")
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::Request) -> Result<T> {
        debug!(method=%request.method(), url=%request.url(), "sending notion request");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach Notion")?;

        if res.status() == StatusCode::TOO_MANY_REQUESTS {
            let body = res.text().await.unwrap_or_default();
            warn!("Rate limited by Notion: {}", body);
            return Err(anyhow!("received 429 from Notion: {}", body));
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!("Notion API error - Status: {}, Body: {}", status, body);
            return Err(anyhow!("notion error {}: {}", status, body));
        }

        let body = res.text().await.context("failed to read Notion response")?;
        serde_json::from_str(&body).context("invalid Notion response JSON")
    }

    /// Query a database, following `next_cursor` until every page is read.
    #[instrument(skip(self, filter))]
    pub async fn query_database(
        &self,
        database_id: &str,
        filter: Option<&Value>,
    ) -> Result<Vec<Page>> {
        let path = format!("v1/databases/{}/query", database_id);
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let body = build_query_body(filter, cursor.as_deref());
            let request = self.build_request(Method::POST, &path, &body)?;
            let resp: QueryDatabaseResp = self.execute(request).await?;
            let next = resp.continuation().map(str::to_string);
            pages.extend(resp.results);
            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        info!(count = pages.len(), "queried Notion database");
        Ok(pages)
    }

    pub async fn query_unarchived(&self, database_id: &str) -> Result<Vec<Page>> {
        self.query_database(database_id, Some(&unarchived_filter()))
            .await
    }

    pub async fn create_page(&self, body: &Value) -> Result<String> {
        let request = self.build_request(Method::POST, "v1/pages", body)?;
        let page: PageRef = self.execute(request).await?;
        info!(page_id = %page.id, "created Notion page");
        Ok(page.id)
    }

    pub async fn update_page(&self, page_id: &str, properties: &Value) -> Result<String> {
        let body = json!({ "properties": properties });
        let request =
            self.build_request(Method::PATCH, &format!("v1/pages/{}", page_id), &body)?;
        let page: PageRef = self.execute(request).await?;
        info!(page_id = %page.id, "updated Notion page");
        Ok(page.id)
    }

    pub async fn retrieve_database(&self, database_id: &str) -> Result<RetrieveDatabaseResp> {
        let request = self
            .authorized(Method::GET, &format!("v1/databases/{}", database_id))?
            .build()
            .context("failed to build Notion request")?;
        self.execute(request).await
    }

    /// Upload a local file through Notion's file upload API and return the
    /// upload id, which page properties can reference as `file_upload`.
    pub async fn upload_file<P: AsRef<Path>>(&self, file_path: P) -> Result<String> {
        let file_path = file_path.as_ref();
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("invalid file name"))?;
        let content_type = content_type_for(file_path);

        let file_content = fs::read(file_path)
            .await
            .with_context(|| format!("failed to read file: {}", file_path.display()))?;

        let create_body = json!({
            "filename": file_name,
            "content_type": content_type,
            "mode": "single_part"
        });
        let request = self.build_request(Method::POST, "v1/file_uploads", &create_body)?;
        let upload: CreateFileUploadResponse = self
            .execute(request)
            .await
            .context("failed to create file upload")?;

        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(file_content)
                .file_name(file_name.to_string())
                .mime_str(content_type)?,
        );
        let send_res = self
            .http
            .post(&upload.upload_url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.version)
            .multipart(form)
            .send()
            .await
            .context("failed to send file content")?;

        if !send_res.status().is_success() {
            let status = send_res.status();
            let body = send_res.text().await.unwrap_or_default();
            return Err(anyhow!("send file failed {}: {}", status, body));
        }

        info!(file = file_name, upload_id = %upload.id, "uploaded file to Notion");
        Ok(upload.id)
    }
}

fn content_type_for(file_path: &Path) -> &'static str {
    match file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_ascii_lowercase())
    {
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "webp" => "image/webp",
        Some(ext) if ext == "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl NotionService for NotionClient {
    async fn query_unarchived(&self, database_id: &str) -> Result<Vec<Page>> {
        NotionClient::query_unarchived(self, database_id).await
    }

    async fn create_page(&self, body: &Value) -> Result<String> {
        NotionClient::create_page(self, body).await
    }

    async fn update_page(&self, page_id: &str, properties: &Value) -> Result<String> {
        NotionClient::update_page(self, page_id, properties).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header<'a>(request: &'a reqwest::Request, name: &str) -> &'a str {
        request
            .headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .unwrap()
    }

    #[test]
    fn build_request_sets_headers() {
        let client = NotionClient::new("token".into(), "2022-06-28".into());
        let body = json!({ "sample": true });
        let request = client.build_request(Method::POST, "v1/pages", &body).unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/v1/pages");
        assert_eq!(header(&request, "Authorization"), "Bearer token");
        assert_eq!(header(&request, "Notion-Version"), "2022-06-28");
        assert_eq!(header(&request, "Content-Type"), "application/json");
    }

    #[test]
    fn query_body_carries_filter_and_cursor() {
        let filter = unarchived_filter();
        let body = build_query_body(Some(&filter), None);
        assert_eq!(body["filter"]["property"], "Archived");
        assert_eq!(body["filter"]["checkbox"]["equals"], false);
        assert_eq!(body["page_size"], 100);
        assert!(body.get("start_cursor").is_none());

        let body = build_query_body(None, Some("cursor-2"));
        assert!(body.get("filter").is_none());
        assert_eq!(body["start_cursor"], "cursor-2");
    }

    #[test]
    fn query_request_targets_database() {
        let client = NotionClient::new("token".into(), "2022-06-28".into());
        let body = build_query_body(Some(&unarchived_filter()), None);
        let request = client
            .build_request(Method::POST, "v1/databases/db-123/query", &body)
            .unwrap();
        assert_eq!(request.url().path(), "/v1/databases/db-123/query");
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.png")), "image/png");
        assert_eq!(content_type_for(Path::new("a")), "application/octet-stream");
    }
}
