use serde::{Deserialize, Serialize};

use super::model::{NoteRecord, NoteStatus};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// LIST
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub notes: Vec<NoteResponse>,
    pub categories: Vec<String>,
}

// =============================================================================
// CREATE / UPDATE
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

// =============================================================================
// SERIALIZATION
// =============================================================================

#[derive(Debug, Serialize)]
pub struct NoteEnvelope {
    pub note: NoteResponse,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: NoteStatus,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    pub creator: CreatorResponse,
}

#[derive(Debug, Serialize)]
pub struct CreatorResponse {
    pub id: String,
    pub email: String,
}

impl From<NoteRecord> for NoteResponse {
    fn from(record: NoteRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            content: record.content,
            category: record.category,
            status: record.status,
            created_at: record.created_at.format(TIMESTAMP_FORMAT).to_string(),
            updated_at: record.updated_at.format(TIMESTAMP_FORMAT).to_string(),
            creator: CreatorResponse {
                id: record.user_id,
                email: record.creator_email,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
}
