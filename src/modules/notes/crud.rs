use std::collections::BTreeSet;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use sqlx::QueryBuilder;

use super::model::{Note, NoteRecord, NoteStatus, DEFAULT_CATEGORIES};
use super::schema::{CreateNoteRequest, UpdateNoteRequest};
use crate::config::DbPool;

const TITLE_MAX_LEN: usize = 255;
const CATEGORY_MAX_LEN: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("Note not found")]
    NotFound,

    #[error("You do not have permission to {0} this note")]
    Forbidden(&'static str),

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl NoteError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Normalized list filters; blank values have already been dropped.
#[derive(Debug, Default)]
pub struct NoteFilters {
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
}

pub struct NoteCrud {
    pool: DbPool,
}

impl NoteCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Filtered listing across all users, newest activity first. Filters are
    /// conjunctive; search matches a substring of title or content.
    pub async fn list(
        &self,
        filters: &NoteFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NoteRecord>, NoteError> {
        let mut qb = QueryBuilder::new(
            "SELECT n.id, n.title, n.content, n.category, n.status, n.user_id, \
             u.email AS creator_email, n.created_at, n.updated_at \
             FROM notes n JOIN users u ON u.id = n.user_id WHERE 1 = 1",
        );

        if let Some(search) = &filters.search {
            let pattern = format!("%{search}%");
            qb.push(" AND (n.title LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR n.content LIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
        if let Some(status) = &filters.status {
            qb.push(" AND n.status = ");
            qb.push_bind(status);
        }
        if let Some(category) = &filters.category {
            qb.push(" AND n.category = ");
            qb.push_bind(category);
        }

        qb.push(" ORDER BY n.updated_at DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let notes = qb
            .build_query_as::<NoteRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(notes)
    }

    /// The category catalog: every category currently in use, unioned with
    /// the defaults, sorted ascending.
    pub async fn categories(&self) -> Result<Vec<String>, NoteError> {
        let in_use: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM notes ORDER BY category ASC")
                .fetch_all(&self.pool)
                .await?;

        let mut categories: BTreeSet<String> =
            DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect();
        categories.extend(in_use);

        Ok(categories.into_iter().collect())
    }

    pub async fn get(&self, id: i64) -> Result<NoteRecord, NoteError> {
        sqlx::query_as::<_, NoteRecord>(
            "SELECT n.id, n.title, n.content, n.category, n.status, n.user_id, \
             u.email AS creator_email, n.created_at, n.updated_at \
             FROM notes n JOIN users u ON u.id = n.user_id WHERE n.id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(NoteError::NotFound)
    }

    pub async fn create(
        &self,
        owner_id: &str,
        req: &CreateNoteRequest,
    ) -> Result<NoteRecord, NoteError> {
        let title = req.title.as_deref().unwrap_or("");
        let content = req.content.as_deref().unwrap_or("");
        let category = req.category.as_deref().unwrap_or("");
        let status = req.status.as_deref().unwrap_or("new");

        let details =
            validate_fields(Some(title), Some(content), Some(category), Some(status));
        if !details.is_empty() {
            return Err(NoteError::Validation(details));
        }
        let Some(status) = NoteStatus::parse(status) else {
            return Err(NoteError::Validation(vec![
                "status: must be one of new, todo, done".to_string(),
            ]));
        };

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO notes (title, content, category, status, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(category)
        .bind(status)
        .bind(owner_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(result.last_insert_rowid()).await
    }

    /// Partial update: absent fields are left untouched, present fields are
    /// validated like on create. `updated_at` is bumped on every accepted
    /// write, even when no field value changed.
    pub async fn update(
        &self,
        id: i64,
        caller_id: &str,
        req: &UpdateNoteRequest,
    ) -> Result<NoteRecord, NoteError> {
        let note = self.find_note(id).await?.ok_or(NoteError::NotFound)?;

        if note.user_id != caller_id {
            return Err(NoteError::Forbidden("update"));
        }

        let details = validate_fields(
            req.title.as_deref(),
            req.content.as_deref(),
            req.category.as_deref(),
            req.status.as_deref(),
        );
        if !details.is_empty() {
            return Err(NoteError::Validation(details));
        }

        let title = req.title.as_deref().unwrap_or(&note.title);
        let content = req.content.as_deref().unwrap_or(&note.content);
        let category = req.category.as_deref().unwrap_or(&note.category);
        let status = req
            .status
            .as_deref()
            .and_then(NoteStatus::parse)
            .unwrap_or(note.status);

        // The clock may not have advanced since the previous write; the
        // strictly-increasing invariant wins over wall time.
        let mut now = Utc::now();
        if now <= note.updated_at {
            now = note.updated_at + Duration::microseconds(1);
        }

        sqlx::query(
            "UPDATE notes SET title = ?, content = ?, category = ?, status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(title)
        .bind(content)
        .bind(category)
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }

    pub async fn delete(&self, id: i64, caller_id: &str) -> Result<(), NoteError> {
        let note = self.find_note(id).await?.ok_or(NoteError::NotFound)?;

        if note.user_id != caller_id {
            return Err(NoteError::Forbidden("delete"));
        }

        sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_note(&self, id: i64) -> Result<Option<Note>, NoteError> {
        let note = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(note)
    }
}

/// Per-field checks shared by create and update; only provided fields are
/// checked. Messages are `field: message` strings the client maps back onto
/// form fields.
fn validate_fields(
    title: Option<&str>,
    content: Option<&str>,
    category: Option<&str>,
    status: Option<&str>,
) -> Vec<String> {
    let mut details = Vec::new();

    if let Some(title) = title {
        if title.trim().is_empty() {
            details.push("title: must not be blank".to_string());
        } else if title.chars().count() > TITLE_MAX_LEN {
            details.push(format!("title: must be at most {TITLE_MAX_LEN} characters"));
        }
    }

    if let Some(content) = content {
        if content.trim().is_empty() {
            details.push("content: must not be blank".to_string());
        }
    }

    if let Some(category) = category {
        if category.trim().is_empty() {
            details.push("category: must not be blank".to_string());
        } else if category.chars().count() > CATEGORY_MAX_LEN {
            details.push(format!(
                "category: must be at most {CATEGORY_MAX_LEN} characters"
            ));
        }
    }

    if let Some(status) = status {
        if NoteStatus::parse(status).is_none() {
            details.push("status: must be one of new, todo, done".to_string());
        }
    }

    details
}
