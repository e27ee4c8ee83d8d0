//! Fridge leftovers tracker backed by a Notion database.
//!
//! The daily check queries unarchived items, renders a short report and pushes
//! it through ntfy.sh or Pushover. The `leftovers` binary manages the same
//! database from the command line.

pub mod check;
pub mod config;
pub mod fields;
pub mod leftovers;
pub mod notify;
pub mod notion;
pub mod report;
pub mod schema;
