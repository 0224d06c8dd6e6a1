use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Best-guess client address produced by the IP resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpInfo {
    pub ip: String,
    pub is_private: bool,
    /// Header the address was taken from, or `"default"`
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Visit {
    pub id: i64,
    pub tracking_link_id: i64,
    pub ip_address: String,
    pub is_private_ip: bool,
    pub ip_source: String,
    pub user_agent: String,
    pub referer: Option<String>,
    pub language: Option<String>,
    pub visit_time: i64,
}

/// A visit joined with the name and slug of the link it was recorded against
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VisitWithLink {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub visit: Visit,
    pub link_name: String,
    pub link_slug: String,
}

/// Everything the store needs to resolve a slug and append one visit
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub slug: String,
    pub ip_address: String,
    pub is_private_ip: bool,
    pub ip_source: String,
    pub user_agent: String,
    pub referer: Option<String>,
    pub language: Option<String>,
    pub visit_time: i64,
}
