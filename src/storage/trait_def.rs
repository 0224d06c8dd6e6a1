use crate::models::{NewVisit, TrackingLink, Visit, VisitWithLink};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("slug already exists")]
    Conflict,
    #[error("no tracking link matches slug '{0}'")]
    UnknownSlug(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Create a tracking link; fails with `Conflict` when the slug is taken
    async fn create_link(
        &self,
        name: &str,
        slug: &str,
        created_by: Option<&str>,
    ) -> StorageResult<TrackingLink>;

    /// Get a tracking link by slug
    async fn get_link(&self, slug: &str) -> Result<Option<TrackingLink>>;

    /// Delete a tracking link and, through the foreign key, its visits
    async fn delete_link(&self, slug: &str) -> Result<bool>;

    /// List links, newest first
    async fn list_links(&self, limit: i64, offset: i64) -> Result<Vec<TrackingLink>>;

    /// Resolve the slug and append a visit in a single statement.
    ///
    /// Returns `UnknownSlug` without writing anything when no link matches.
    async fn record_visit(&self, visit: &NewVisit) -> StorageResult<Visit>;

    /// List visits across all links, newest first
    async fn list_visits(&self, limit: i64, offset: i64) -> Result<Vec<VisitWithLink>>;

    /// List visits for one link, newest first
    async fn list_visits_for_link(
        &self,
        slug: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VisitWithLink>>;
}
