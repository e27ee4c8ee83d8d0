//! Property names of the leftovers database.

use crate::notion::RetrieveDatabaseResp;

pub const FOOD: &str = "Food";
pub const DAYS_LEFT: &str = "Days Left";
pub const STATUS: &str = "Status";
pub const ARCHIVED: &str = "Archived";
pub const DATE_ADDED: &str = "Date Added";
pub const EXPIRES: &str = "Expires";
pub const MEAL_COST: &str = "Meal Cost";
pub const LOCATION: &str = "Location";
pub const ADDED_BY: &str = "Added By";
pub const NOTES: &str = "Notes";
pub const PHOTO: &str = "Photo";
pub const VERDICT: &str = "The Verdict";

/// Options of the `Location` select property.
pub const LOCATIONS: [&str; 5] = [
    "Top shelf",
    "Middle shelf",
    "Bottom shelf",
    "Crisper drawer",
    "Door",
];

/// Notion property type expected for each property.
pub const EXPECTED_TYPES: [(&str, &str); 12] = [
    (FOOD, "title"),
    (DAYS_LEFT, "formula"),
    (STATUS, "formula"),
    (ARCHIVED, "checkbox"),
    (DATE_ADDED, "date"),
    (EXPIRES, "date"),
    (MEAL_COST, "number"),
    (LOCATION, "select"),
    (ADDED_BY, "select"),
    (NOTES, "rich_text"),
    (PHOTO, "files"),
    (VERDICT, "select"),
];

/// Differences between a retrieved database schema and [`EXPECTED_TYPES`].
pub fn mismatches(db: &RetrieveDatabaseResp) -> Vec<String> {
    EXPECTED_TYPES
        .iter()
        .filter_map(|&(name, typ)| match db.properties.get(name) {
            Some(prop) if prop.typ == typ => None,
            Some(prop) => Some(format!("{} should be {} but is {}", name, typ, prop.typ)),
            None => Some(format!("missing property {} ({})", name, typ)),
        })
        .collect()
}
