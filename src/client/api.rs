use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    pub creator: Creator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotesPage {
    pub notes: Vec<Note>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(rename = "isVerified")]
    pub is_verified: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredUser {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Effective list filters; blank values are normalized away before they reach
/// the cache key or the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilters {
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListFilters {
    pub fn normalized(&self) -> Self {
        let non_blank =
            |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Self {
            search: non_blank(&self.search),
            status: non_blank(&self.status),
            category: non_blank(&self.category),
            limit: self.limit,
            offset: self.offset,
        }
    }
}

// =============================================================================
// ENVELOPES
// =============================================================================

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct NoteEnvelope {
    note: Note,
}

#[derive(Debug, Deserialize)]
struct RegisterEnvelope {
    user: RegisteredUser,
}

#[derive(Debug, Deserialize)]
struct SessionEnvelope {
    user: SessionUser,
}

// =============================================================================
// ERRORS
// =============================================================================

/// A structured API error is kept apart from transport failures: only the
/// former carries `details` strings that map back onto form fields.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("{error}")]
    Api {
        status: u16,
        error: String,
        details: Vec<String>,
    },
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

impl ApiError {
    pub fn field_errors(&self) -> &[String] {
        match self {
            ApiError::Api { details, .. } => details,
            ApiError::Transport(_) => &[],
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Transport(_) => None,
        }
    }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .cookie_store(true) // the login session rides on a cookie
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body: serde_json::Value = response
            .json()
            .await
            .unwrap_or(serde_json::Value::Null);
        let error = body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("Request failed")
            .to_string();
        let details = body
            .get("details")
            .and_then(|v| v.as_array())
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Err(ApiError::Api {
            status: status.as_u16(),
            error,
            details,
        })
    }

    // -------------------------------------------------------------------------
    // AUTH
    // -------------------------------------------------------------------------

    pub async fn register(&self, email: &str, password: &str) -> Result<RegisteredUser, ApiError> {
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        Self::parse::<RegisterEnvelope>(response).await.map(|e| e.user)
    }

    pub async fn confirm(&self, token: &str) -> Result<String, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/auth/confirm/{token}")))
            .send()
            .await?;
        Self::parse::<MessageBody>(response).await.map(|m| m.message)
    }

    pub async fn auto_verify(&self, email: &str) -> Result<SessionUser, ApiError> {
        let response = self
            .http
            .post(self.url("/auth/auto-verify"))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;
        Self::parse::<SessionEnvelope>(response).await.map(|e| e.user)
    }

    /// Logs in; the session cookie is captured by the cookie store and sent
    /// on every following request.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, ApiError> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        Self::parse::<SessionEnvelope>(response).await.map(|e| e.user)
    }

    pub async fn me(&self) -> Result<SessionUser, ApiError> {
        let response = self.http.get(self.url("/auth/me")).send().await?;
        Self::parse::<SessionEnvelope>(response).await.map(|e| e.user)
    }

    // -------------------------------------------------------------------------
    // NOTES
    // -------------------------------------------------------------------------

    pub async fn list_notes(&self, filters: &ListFilters) -> Result<NotesPage, ApiError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(search) = &filters.search {
            params.push(("search", search.clone()));
        }
        if let Some(status) = &filters.status {
            params.push(("status", status.clone()));
        }
        if let Some(category) = &filters.category {
            params.push(("category", category.clone()));
        }
        if let Some(limit) = filters.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = filters.offset {
            params.push(("offset", offset.to_string()));
        }

        let response = self
            .http
            .get(self.url("/notes"))
            .query(&params)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn get_note(&self, id: i64) -> Result<Note, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/notes/{id}")))
            .send()
            .await?;
        Self::parse::<NoteEnvelope>(response).await.map(|e| e.note)
    }

    pub async fn create_note(&self, draft: &NoteDraft) -> Result<Note, ApiError> {
        let response = self
            .http
            .post(self.url("/notes"))
            .json(draft)
            .send()
            .await?;
        Self::parse::<NoteEnvelope>(response).await.map(|e| e.note)
    }

    pub async fn update_note(&self, id: i64, patch: &NotePatch) -> Result<Note, ApiError> {
        let response = self
            .http
            .put(self.url(&format!("/notes/{id}")))
            .json(patch)
            .send()
            .await?;
        Self::parse::<NoteEnvelope>(response).await.map(|e| e.note)
    }

    pub async fn delete_note(&self, id: i64) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/notes/{id}")))
            .send()
            .await?;
        Self::parse::<MessageBody>(response).await.map(|_| ())
    }
}
