//! Adding, listing and archiving leftovers.

use anyhow::Result;
use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;
use tracing::info;

use crate::fields::{first_file_url, first_text, formula_text, select_name, FieldPath};
use crate::notion::{NotionService, Page};
use crate::report::{UNKNOWN_DAYS, UNKNOWN_FOOD};
use crate::schema;

#[derive(Debug, Error, PartialEq)]
pub enum LeftoverError {
    #[error("food name must be non-empty")]
    EmptyFood,
    #[error("expiry date {expires} is before today ({today})")]
    ExpiresInPast { expires: NaiveDate, today: NaiveDate },
    #[error("meal cost must be a non-negative number, got {0}")]
    InvalidCost(f64),
    #[error("unknown location '{0}'")]
    UnknownLocation(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Photo {
    /// Image hosted elsewhere.
    External(String),
    /// Id returned by the Notion file upload API.
    Uploaded(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLeftover {
    pub food: String,
    pub expires: NaiveDate,
    pub location: String,
    pub added_by: String,
    pub meal_cost: f64,
    pub notes: String,
    pub photo: Option<Photo>,
}

impl NewLeftover {
    pub fn validate(&self, today: NaiveDate) -> Result<(), LeftoverError> {
        if self.food.trim().is_empty() {
            return Err(LeftoverError::EmptyFood);
        }
        if self.expires < today {
            return Err(LeftoverError::ExpiresInPast {
                expires: self.expires,
                today,
            });
        }
        if !self.meal_cost.is_finite() || self.meal_cost < 0.0 {
            return Err(LeftoverError::InvalidCost(self.meal_cost));
        }
        if !schema::LOCATIONS.contains(&self.location.as_str()) {
            return Err(LeftoverError::UnknownLocation(self.location.clone()));
        }
        Ok(())
    }
}

/// Request body for creating the page of a new leftover.
pub fn build_create_request(
    database_id: &str,
    item: &NewLeftover,
    today: NaiveDate,
) -> Result<Value, LeftoverError> {
    item.validate(today)?;
    let food = item.food.trim();

    let mut properties = Map::new();
    properties.insert(
        schema::FOOD.into(),
        json!({ "title": [ { "text": { "content": food } } ] }),
    );
    properties.insert(
        schema::DATE_ADDED.into(),
        json!({ "date": { "start": today.to_string() } }),
    );
    properties.insert(
        schema::EXPIRES.into(),
        json!({ "date": { "start": item.expires.to_string() } }),
    );
    properties.insert(schema::MEAL_COST.into(), json!({ "number": item.meal_cost }));
    properties.insert(
        schema::LOCATION.into(),
        json!({ "select": { "name": item.location } }),
    );
    if !item.added_by.trim().is_empty() {
        properties.insert(
            schema::ADDED_BY.into(),
            json!({ "select": { "name": item.added_by.trim() } }),
        );
    }
    if !item.notes.trim().is_empty() {
        properties.insert(
            schema::NOTES.into(),
            json!({ "rich_text": [ { "text": { "content": item.notes } } ] }),
        );
    }
    properties.insert(schema::ARCHIVED.into(), json!({ "checkbox": false }));

    if let Some(photo) = &item.photo {
        let name = format!("Photo_{}", food);
        let file = match photo {
            Photo::External(url) => json!({
                "name": name,
                "type": "external",
                "external": { "url": url }
            }),
            Photo::Uploaded(id) => json!({
                "name": name,
                "type": "file_upload",
                "file_upload": { "id": id }
            }),
        };
        properties.insert(schema::PHOTO.into(), json!({ "files": [file] }));
    }

    Ok(json!({
        "parent": { "database_id": database_id },
        "properties": Value::Object(properties),
    }))
}

/// How a leftover left the fridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Eaten,
    Tossed,
}

impl Verdict {
    /// Option name in the `The Verdict` select, emoji included.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Eaten => "🍴 Eaten",
            Verdict::Tossed => "🗑️ Tossed",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Properties patch recording the verdict and archiving the page.
pub fn build_verdict_update(verdict: Verdict) -> Value {
    let mut properties = Map::new();
    properties.insert(
        schema::VERDICT.into(),
        json!({ "select": { "name": verdict.label() } }),
    );
    properties.insert(schema::ARCHIVED.into(), json!({ "checkbox": true }));
    Value::Object(properties)
}

/// A row of the inventory view.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryEntry {
    pub id: String,
    pub food: String,
    pub meal_cost: f64,
    pub status: String,
    pub days_left: String,
    pub location: Option<String>,
    pub added_by: Option<String>,
    pub photo: Option<String>,
}

impl InventoryEntry {
    pub fn from_page(page: Page) -> Self {
        let props = Value::Object(page.properties);
        Self {
            id: page.id,
            food: first_text(&props, schema::FOOD, "title")
                .unwrap_or_else(|| UNKNOWN_FOOD.to_string()),
            meal_cost: FieldPath::property(schema::MEAL_COST)
                .key("number")
                .number(&props)
                .unwrap_or(0.0),
            status: formula_text(&props, schema::STATUS)
                .unwrap_or_else(|| "Unknown".to_string()),
            days_left: formula_text(&props, schema::DAYS_LEFT)
                .unwrap_or_else(|| UNKNOWN_DAYS.to_string()),
            location: select_name(&props, schema::LOCATION),
            added_by: select_name(&props, schema::ADDED_BY),
            photo: first_file_url(&props, schema::PHOTO),
        }
    }
}

impl fmt::Display for InventoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]\n  {} | {}\n  Status: {} ({})\n  Value: ${:.2}",
            self.food,
            self.id,
            self.location.as_deref().unwrap_or("-"),
            self.added_by.as_deref().unwrap_or("-"),
            self.status,
            self.days_left,
            self.meal_cost,
        )?;
        if let Some(photo) = &self.photo {
            write!(f, "\n  Photo: {}", photo)?;
        }
        Ok(())
    }
}

pub async fn add(
    notion: &dyn NotionService,
    database_id: &str,
    item: &NewLeftover,
    today: NaiveDate,
) -> Result<String> {
    let body = build_create_request(database_id, item, today)?;
    let page_id = notion.create_page(&body).await?;
    info!(%page_id, food = %item.food, "added leftover");
    Ok(page_id)
}

pub async fn inventory(notion: &dyn NotionService, database_id: &str) -> Result<Vec<InventoryEntry>> {
    let pages = notion.query_unarchived(database_id).await?;
    Ok(pages.into_iter().map(InventoryEntry::from_page).collect())
}

pub async fn settle(notion: &dyn NotionService, page_id: &str, verdict: Verdict) -> Result<()> {
    notion
        .update_page(page_id, &build_verdict_update(verdict))
        .await?;
    info!(%page_id, %verdict, "archived leftover");
    Ok(())
}
