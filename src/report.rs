//! Rendering of the daily fridge summary.

use serde_json::Value;
use thiserror::Error;

use crate::fields::{first_text, formula_text};
use crate::schema;

pub const HEADER: &str = "Fridge Update:";
pub const EMPTY_MESSAGE: &str = "Fridge is empty! No leftovers today.";
pub const UNKNOWN_FOOD: &str = "Unknown";
pub const UNKNOWN_DAYS: &str = "N/A";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidInputError {
    #[error("item {index} is not an object (found {found})")]
    NotAnObject { index: usize, found: &'static str },
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodItem {
    pub food_name: String,
    pub days_left: String,
}

impl FoodItem {
    /// Read an item from a page's `properties` map. Missing values fall back
    /// to [`UNKNOWN_FOOD`] and [`UNKNOWN_DAYS`].
    pub fn from_properties(properties: &Value) -> Self {
        let food_name = first_text(properties, schema::FOOD, "title")
            .unwrap_or_else(|| UNKNOWN_FOOD.to_string());
        let days_left = formula_text(properties, schema::DAYS_LEFT)
            .unwrap_or_else(|| UNKNOWN_DAYS.to_string());
        Self {
            food_name,
            days_left,
        }
    }

    pub fn line(&self) -> String {
        format!("- {}: {}", self.food_name, self.days_left)
    }
}

/// Build the report from raw property maps, in input order.
pub fn build_report(items: &[Value]) -> Result<String, InvalidInputError> {
    let items = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if item.is_object() {
                Ok(FoodItem::from_properties(item))
            } else {
                Err(InvalidInputError::NotAnObject {
                    index,
                    found: kind_of(item),
                })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(render_report(&items))
}

pub fn render_report(items: &[FoodItem]) -> String {
    if items.is_empty() {
        return EMPTY_MESSAGE.to_string();
    }
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(HEADER.to_string());
    lines.extend(items.iter().map(FoodItem::line));
    lines.join("\n")
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
