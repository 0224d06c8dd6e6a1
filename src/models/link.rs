use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrackingLink {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_by: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub name: String,
    pub slug: Option<String>,
    pub created_by: Option<String>,
}

/// A link as returned by the admin API, with its public tracking URL
#[derive(Debug, Clone, Serialize)]
pub struct LinkResponse {
    #[serde(flatten)]
    pub link: TrackingLink,
    pub tracking_url: String,
}

impl LinkResponse {
    pub fn new(link: TrackingLink, track_base_url: &str) -> Self {
        let tracking_url = format!("{}/{}", track_base_url, link.slug);
        Self { link, tracking_url }
    }
}
