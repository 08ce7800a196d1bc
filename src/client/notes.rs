use std::sync::Arc;

use super::api::{ApiClient, ApiError, ListFilters, Note, NoteDraft, NotePatch, NotesPage};
use super::cache::{QueryCache, QueryKey};
use super::debounce::Debouncer;

const DEFAULT_LIMIT: i64 = 50;

/// High-level notes client: every read goes through the query cache, every
/// successful mutation updates it so the next list read refetches.
pub struct NotesClient {
    api: Arc<ApiClient>,
    lists: QueryCache<NotesPage>,
    details: QueryCache<Note>,
    search_debounce: Debouncer,
}

impl NotesClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api: Arc::new(api),
            lists: QueryCache::new(),
            details: QueryCache::new(),
            search_debounce: Debouncer::default(),
        }
    }

    /// The underlying API client, for auth calls that bypass the cache.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn list_key(filters: &ListFilters) -> QueryKey {
        QueryKey::List {
            search: filters.search.clone(),
            status: filters.status.clone(),
            category: filters.category.clone(),
            limit: filters.limit.unwrap_or(DEFAULT_LIMIT),
            offset: filters.offset.unwrap_or(0),
        }
    }

    pub async fn list(&self, filters: &ListFilters) -> Result<NotesPage, ApiError> {
        let filters = filters.normalized();
        let key = Self::list_key(&filters);
        let api = Arc::clone(&self.api);
        self.lists
            .fetch(key, move || async move { api.list_notes(&filters).await })
            .await
    }

    /// Debounced search. Returns `Ok(None)` when a newer search superseded
    /// this one before the debounce window closed.
    pub async fn search(&self, filters: &ListFilters) -> Result<Option<NotesPage>, ApiError> {
        let filters = filters.normalized();
        match self.search_debounce.settle(filters).await {
            Some(filters) => self.list(&filters).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: i64) -> Result<Note, ApiError> {
        let api = Arc::clone(&self.api);
        self.details
            .fetch(QueryKey::Detail(id), move || async move {
                api.get_note(id).await
            })
            .await
    }

    pub async fn create(&self, draft: &NoteDraft) -> Result<Note, ApiError> {
        let note = self.api.create_note(draft).await?;
        self.details
            .put(QueryKey::Detail(note.id), note.clone())
            .await;
        self.lists.invalidate_lists().await;
        Ok(note)
    }

    pub async fn update(&self, id: i64, patch: &NotePatch) -> Result<Note, ApiError> {
        let note = self.api.update_note(id, patch).await?;
        self.details
            .put(QueryKey::Detail(note.id), note.clone())
            .await;
        self.lists.invalidate_lists().await;
        Ok(note)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete_note(id).await?;
        self.details.remove(&QueryKey::Detail(id)).await;
        self.lists.invalidate_lists().await;
        Ok(())
    }

    /// True when a list query with these filters would be answered from cache
    /// without a refetch.
    pub async fn list_is_fresh(&self, filters: &ListFilters) -> bool {
        self.lists
            .is_fresh(&Self::list_key(&filters.normalized()))
            .await
    }

    pub async fn note_is_cached(&self, id: i64) -> bool {
        self.details.contains(&QueryKey::Detail(id)).await
    }
}
