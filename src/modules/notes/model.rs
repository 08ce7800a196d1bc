use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_CATEGORIES: [&str; 3] = ["Work", "Personal", "Important"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NoteStatus {
    New,
    Todo,
    Done,
}

impl NoteStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Self::New),
            "todo" => Some(Self::Todo),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: NoteStatus,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note row joined with its creator, the shape every read returns.
#[derive(Debug, Clone, FromRow)]
pub struct NoteRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: NoteStatus,
    pub user_id: String,
    pub creator_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
