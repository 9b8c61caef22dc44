use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type BookId = i64;

/// A book in progress. Field names on disk match the browser build's
/// `libretto_books` slot so its exports load here. That build stored `null`
/// progress for a zero total; it reads back as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub current_position: String,
    #[serde(rename = "totalPages")]
    pub estimated_total: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub progress: u32,
    pub date_added: DateTime<Utc>,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_default())
}
