use crate::models::{NewVisit, TrackingLink, Visit, VisitWithLink};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tracking_links (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                created_by TEXT,
                created_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visits (
                id BIGSERIAL PRIMARY KEY,
                tracking_link_id BIGINT NOT NULL
                    REFERENCES tracking_links(id) ON DELETE CASCADE,
                ip_address TEXT NOT NULL,
                is_private_ip BOOLEAN NOT NULL,
                ip_source TEXT NOT NULL,
                user_agent TEXT NOT NULL,
                referer TEXT,
                language TEXT,
                visit_time BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_visits_link_time ON visits(tracking_link_id, visit_time)",
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_visits_time ON visits(visit_time)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn create_link(
        &self,
        name: &str,
        slug: &str,
        created_by: Option<&str>,
    ) -> StorageResult<TrackingLink> {
        let created_at = chrono::Utc::now().timestamp();

        let link = sqlx::query_as::<_, TrackingLink>(
            r#"
            INSERT INTO tracking_links (name, slug, created_by, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO NOTHING
            RETURNING id, name, slug, created_by, created_at
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(created_by)
        .bind(created_at)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        link.ok_or(StorageError::Conflict)
    }

    async fn get_link(&self, slug: &str) -> Result<Option<TrackingLink>> {
        let link = sqlx::query_as::<_, TrackingLink>(
            r#"
            SELECT id, name, slug, created_by, created_at
            FROM tracking_links
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn delete_link(&self, slug: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tracking_links WHERE slug = $1")
            .bind(slug)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_links(&self, limit: i64, offset: i64) -> Result<Vec<TrackingLink>> {
        let links = sqlx::query_as::<_, TrackingLink>(
            r#"
            SELECT id, name, slug, created_by, created_at
            FROM tracking_links
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(links)
    }

    async fn record_visit(&self, visit: &NewVisit) -> StorageResult<Visit> {
        let row = sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO visits (
                tracking_link_id, ip_address, is_private_ip, ip_source,
                user_agent, referer, language, visit_time
            )
            SELECT id, $1, $2, $3, $4, $5, $6, $7
            FROM tracking_links
            WHERE slug = $8
            RETURNING id, tracking_link_id, ip_address, is_private_ip, ip_source,
                      user_agent, referer, language, visit_time
            "#,
        )
        .bind(&visit.ip_address)
        .bind(visit.is_private_ip)
        .bind(&visit.ip_source)
        .bind(&visit.user_agent)
        .bind(visit.referer.as_deref())
        .bind(visit.language.as_deref())
        .bind(visit.visit_time)
        .bind(&visit.slug)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        row.ok_or_else(|| StorageError::UnknownSlug(visit.slug.clone()))
    }

    async fn list_visits(&self, limit: i64, offset: i64) -> Result<Vec<VisitWithLink>> {
        let visits = sqlx::query_as::<_, VisitWithLink>(
            r#"
            SELECT v.id, v.tracking_link_id, v.ip_address, v.is_private_ip, v.ip_source,
                   v.user_agent, v.referer, v.language, v.visit_time,
                   l.name AS link_name, l.slug AS link_slug
            FROM visits v
            JOIN tracking_links l ON l.id = v.tracking_link_id
            ORDER BY v.visit_time DESC, v.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(visits)
    }

    async fn list_visits_for_link(
        &self,
        slug: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VisitWithLink>> {
        let visits = sqlx::query_as::<_, VisitWithLink>(
            r#"
            SELECT v.id, v.tracking_link_id, v.ip_address, v.is_private_ip, v.ip_source,
                   v.user_agent, v.referer, v.language, v.visit_time,
                   l.name AS link_name, l.slug AS link_slug
            FROM visits v
            JOIN tracking_links l ON l.id = v.tracking_link_id
            WHERE l.slug = $1
            ORDER BY v.visit_time DESC, v.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(slug)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(visits)
    }
}
