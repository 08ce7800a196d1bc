//! HTTP client with a React-Query-style synchronization layer: cached reads
//! with stale-while-revalidate, in-flight request sharing, debounced search,
//! and mutation-driven invalidation.

pub mod api;
pub mod cache;
pub mod debounce;
pub mod notes;

pub use api::{ApiClient, ApiError, ListFilters, Note, NoteDraft, NotePatch, NotesPage};
pub use cache::{QueryCache, QueryKey};
pub use debounce::Debouncer;
pub use notes::NotesClient;
